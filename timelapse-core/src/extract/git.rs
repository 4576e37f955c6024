use std::path::Path;
use std::process::Command;
use std::time::Instant;

use chrono::SecondsFormat;
use tracing::{debug, info, instrument, warn};

use crate::config::{HistorySection, RepoEntry};
use crate::error::ExtractError;
use crate::types::{Commit, TimeWindow, parse_ts};

use super::traits::HistorySource;

const LOG_FORMAT: &str = "--format=%H|%aI|%s|%P";

/// History source backed by the `git` command-line tool.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_binary: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(git_binary: impl Into<String>) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    pub fn from_config(history: &HistorySection) -> Self {
        Self::new(history.git_binary.clone())
    }

    fn run(&self, repo: &Path, args: &[&str]) -> Result<String, ExtractError> {
        let output = Command::new(&self.git_binary)
            .args(["-c", "core.quotepath=off"])
            .args(args)
            .current_dir(repo)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Git(format!(
                "git {} exited with {}: {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl HistorySource for GitCli {
    /// `--since` filters on committer date, which is never earlier than the
    /// author date. There is no `--until`: a commit authored in the window
    /// may have been committed after it, so the end is left to the author
    /// date check in [`load_commits`].
    fn log_numstat(&self, repo: &Path, window: &TimeWindow) -> Result<String, ExtractError> {
        let since = format!(
            "--since={}",
            window.start.to_rfc3339_opts(SecondsFormat::Secs, false)
        );
        self.run(repo, &["log", &since, LOG_FORMAT, "--numstat"])
    }

    fn commit_file_diff(
        &self,
        repo: &Path,
        sha: &str,
        path: &str,
    ) -> Result<String, ExtractError> {
        self.run(
            repo,
            &["show", "--format=", "--no-color", "--unified=0", sha, "--", path],
        )
    }

    fn file_at_commit(&self, repo: &Path, sha: &str, path: &str) -> Result<String, ExtractError> {
        let spec = format!("{sha}:{path}");
        self.run(repo, &["show", &spec])
    }
}

// ── Loading ────────────────────────────────────────────────────────

/// Load the commits of `repo` whose author timestamp falls in `window`.
///
/// A failed history query is logged and yields no commits, so one broken
/// repository never aborts a multi-repository run.
#[instrument(skip_all, fields(repo = %repo.name))]
pub fn load_commits<S: HistorySource + ?Sized>(
    source: &S,
    repo: &RepoEntry,
    window: &TimeWindow,
) -> Vec<Commit> {
    let start = Instant::now();

    let text = match source.log_numstat(&repo.path, window) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                path = %repo.path.display(),
                error = %e,
                "History query failed, treating repository as empty"
            );
            return Vec::new();
        }
    };

    let commits: Vec<Commit> = parse_history(&repo.name, &text)
        .into_iter()
        .filter(|c| window.contains(c.ts))
        .collect();

    info!(
        commits = commits.len(),
        duration = ?start.elapsed(),
        "Loaded commit history"
    );
    commits
}

/// Parse `git log --format=%H|%aI|%s|%P --numstat` output.
///
/// Commits come back in log order. Lines before the first header, blank
/// lines and file lines without exactly three tab-separated fields are
/// ignored.
pub fn parse_history(repo: &str, text: &str) -> Vec<Commit> {
    let mut commits = Vec::new();
    let mut current: Option<Commit> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some(header) = parse_header(repo, line) {
            if let Some(done) = current.replace(header) {
                commits.push(done);
            }
            continue;
        }

        let Some(commit) = current.as_mut() else {
            debug!(line, "Skipping history line before first commit header");
            continue;
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if let [insertions, deletions, path] = fields.as_slice() {
            commit.record_file(path, parse_count(insertions), parse_count(deletions));
        }
    }

    commits.extend(current);
    commits
}

fn parse_header(repo: &str, line: &str) -> Option<Commit> {
    let (sha, rest) = line.split_once('|')?;
    if sha.len() != 40 || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let (ts, rest) = rest.split_once('|')?;
    let (subject, parents) = rest.rsplit_once('|')?;
    let ts = parse_ts(ts)?;

    let merge = parents.split_whitespace().count() > 1;
    Some(Commit::new(repo, sha, ts, subject).with_merge(merge))
}

/// Numstat count, or `None` for the binary marker and anything non-numeric.
fn parse_count(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
