// Integration test utilities and git repository fixtures for Timelapse.

use std::path::Path;
use std::process::Command;

use chrono::{TimeZone, Utc};
use timelapse_core::RepoEntry;
use timelapse_core::types::TimeWindow;

/// A test fixture with a temporary git repository.
#[derive(Debug)]
pub struct TestRepo {
    pub dir: tempfile::TempDir,
}

impl TestRepo {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Config entry pointing at this repository.
    pub fn entry(&self, name: &str) -> RepoEntry {
        RepoEntry::new(name, self.path())
    }

    /// `timelapse.toml` text registering this repository under `name`.
    pub fn config_toml(&self, name: &str) -> String {
        format!(
            "[[repos]]\nname = \"{name}\"\npath = \"{}\"\n",
            self.path().display().to_string().replace('\\', "\\\\")
        )
    }

    /// A small Python service with a January 2026 history:
    ///
    /// | date  | commit                                       |
    /// |-------|----------------------------------------------|
    /// | 01-05 | add `app.py` and `README.md`                 |
    /// | 01-06 | edit `Service.start`, add `util.py`          |
    /// | 01-07 | branch `feature`: edit `helper`              |
    /// | 01-07 | `main`: edit `Service.stop` and `util.py`    |
    /// | 01-08 | merge `feature` (no fast-forward)            |
    /// | 01-09 | edit `Service.start`, add binary `logo.png`  |
    /// | 01-10 | break the `helper` signature (syntax error)  |
    /// | 01-11 | fix the `helper` signature                   |
    pub fn python_service() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = dir.path();

        git(root, &["init", "--initial-branch=main"], "2026-01-05T09:00:00+00:00");
        git(root, &["config", "user.email", "test@timelapse.dev"], "2026-01-05T09:00:00+00:00");
        git(root, &["config", "user.name", "Test"], "2026-01-05T09:00:00+00:00");
        git(root, &["config", "commit.gpgsign", "false"], "2026-01-05T09:00:00+00:00");

        write_file(root, "app.py", &app_source("1", "0", "2", "def helper():"));
        write_file(root, "README.md", "# Service\n");
        commit_all(root, "Add service", "2026-01-05T10:00:00+00:00");

        write_file(root, "app.py", &app_source("10", "0", "2", "def helper():"));
        write_file(root, "util.py", "def util():\n    return 3\n");
        commit_all(root, "Tune start", "2026-01-06T10:00:00+00:00");

        git(root, &["checkout", "-b", "feature"], "2026-01-07T09:00:00+00:00");
        write_file(root, "app.py", &app_source("10", "0", "20", "def helper():"));
        commit_all(root, "Helper returns more", "2026-01-07T10:00:00+00:00");

        git(root, &["checkout", "main"], "2026-01-07T11:00:00+00:00");
        write_file(root, "app.py", &app_source("10", "-1", "2", "def helper():"));
        write_file(root, "util.py", "def util():\n    return 4\n");
        commit_all(root, "Stop signals failure", "2026-01-07T12:00:00+00:00");

        git(
            root,
            &["merge", "--no-ff", "feature", "-m", "Merge branch 'feature'"],
            "2026-01-08T10:00:00+00:00",
        );

        write_file(root, "app.py", &app_source("11", "-1", "20", "def helper():"));
        std::fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G', 0, 0, 0, 13, 0xff])
            .expect("write logo.png");
        commit_all(root, "Add logo", "2026-01-09T10:00:00+00:00");

        write_file(root, "app.py", &app_source("11", "-1", "20", "def helper(:"));
        commit_all(root, "Refactor helper signature", "2026-01-10T10:00:00+00:00");

        write_file(root, "app.py", &app_source("11", "-1", "20", "def helper():"));
        commit_all(root, "Fix helper signature", "2026-01-11T10:00:00+00:00");

        Self { dir }
    }
}

/// The half-open window covering January 2026.
pub fn january_2026() -> TimeWindow {
    TimeWindow::new(
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
    )
}

/// `app.py`: `Service` spans lines 1-6, `Service.start` 2-3,
/// `Service.stop` 5-6 and `helper` 9-10.
fn app_source(start: &str, stop: &str, helper: &str, helper_def: &str) -> String {
    format!(
        "class Service:\n    def start(self):\n        return {start}\n\n    def stop(self):\n        return {stop}\n\n\n{helper_def}\n    return {helper}\n"
    )
}

fn commit_all(dir: &Path, message: &str, date: &str) {
    git(dir, &["add", "."], date);
    git(dir, &["commit", "-m", message], date);
}

fn git(dir: &Path, args: &[&str], date: &str) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@timelapse.dev")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@timelapse.dev")
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .output()
        .unwrap_or_else(|e| panic!("git {}: {e}", args.join(" ")));
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("git {} failed: {stderr}", args.join(" "));
    }
}

fn write_file(root: &Path, rel: &str, content: &str) {
    std::fs::write(root.join(rel), content).expect("write fixture file");
}
