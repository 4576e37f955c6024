use timelapse_core::analyze::{co_change_matrix, rework_ratio};
use timelapse_core::types::{AttributionMethod, QualityFlag};
use timelapse_core::{GitCli, RepoEntry, SymbolPipeline, TimelapseConfig};
use timelapse_test::{TestRepo, january_2026};

fn pipeline() -> SymbolPipeline<GitCli> {
    SymbolPipeline::new(GitCli::default(), TimelapseConfig::default())
}

// ── History ──────────────────────────────────────────────────────

#[test]
fn loads_commits_with_merges_and_binary_stats() {
    let repo = TestRepo::python_service();
    let commits = pipeline().load_commits(&repo.entry("svc"), &january_2026());

    assert_eq!(commits.len(), 8, "got {commits:#?}");
    assert!(commits.windows(2).all(|w| w[0].ts <= w[1].ts));
    assert!(commits.iter().all(|c| c.repo == "svc" && c.sha.len() == 40));

    let merges: Vec<_> = commits.iter().filter(|c| c.merge_commit).collect();
    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0].subject, "Merge branch 'feature'");

    let logo = commits.iter().find(|c| c.subject == "Add logo").unwrap();
    assert!(logo.binary_numstat);
    assert_eq!(logo.files, vec!["app.py", "logo.png"]);
    assert_eq!(logo.insertions, 1);
    assert_eq!(logo.deletions, 1);

    let first = &commits[0];
    assert_eq!(first.subject, "Add service");
    assert_eq!(first.file_stat("app.py").insertions, 10);
}

#[test]
fn window_excludes_history_outside_it() {
    let repo = TestRepo::python_service();
    let window = timelapse_core::types::TimeWindow::new(
        chrono_at("2026-01-07T00:00:00Z"),
        chrono_at("2026-01-09T00:00:00Z"),
    );
    let commits = pipeline().load_commits(&repo.entry("svc"), &window);
    let subjects: Vec<_> = commits.iter().map(|c| c.subject.as_str()).collect();
    assert_eq!(
        subjects,
        vec![
            "Helper returns more",
            "Stop signals failure",
            "Merge branch 'feature'"
        ]
    );
}

fn chrono_at(ts: &str) -> chrono::DateTime<chrono::Utc> {
    timelapse_core::types::parse_ts(ts).unwrap()
}

#[test]
fn missing_repository_is_empty_not_fatal() {
    let entry = RepoEntry::new("gone", "/nonexistent/timelapse/repo");
    assert!(pipeline().load_commits(&entry, &january_2026()).is_empty());

    let report = pipeline().analyze_file(&entry, "app.py", &january_2026());
    assert!(report.symbol_touches.is_empty());
}

// ── Symbol attribution ───────────────────────────────────────────

#[test]
fn symbol_pipeline_end_to_end() {
    let repo = TestRepo::python_service();
    let pipeline = pipeline();
    let report = pipeline.analyze_file(&repo.entry("svc"), "app.py", &january_2026());

    assert_eq!(report.symbol_touches.len(), 13, "got {:#?}", report.symbol_touches);
    assert_eq!(
        report.quality_flags,
        vec![
            QualityFlag::BinaryNumstatPresent,
            QualityFlag::SymbolFallbackHeader
        ]
    );

    let first_commit: Vec<_> = report
        .symbol_touches
        .iter()
        .take(4)
        .map(|r| r.symbol_id.as_str())
        .collect();
    assert_eq!(
        first_commit,
        vec!["Service", "Service.start", "Service.stop", "helper"]
    );

    let fallback: Vec<_> = report
        .symbol_touches
        .iter()
        .filter(|r| r.extractor == AttributionMethod::HeaderFallback)
        .collect();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].symbol_id, "Service");
    assert_eq!(fallback[0].flags, vec![QualityFlag::SymbolFallbackHeader]);

    let rollup: Vec<_> = report
        .symbols
        .iter()
        .map(|s| (s.symbol_id.as_str(), s.touches, s.churn))
        .collect();
    assert_eq!(
        rollup,
        vec![
            ("Service", 5, 10 + 2 + 2 + 2 + 2),
            ("Service.start", 3, 14),
            ("helper", 3, 14),
            ("Service.stop", 2, 12),
        ]
    );
    let helper = &report.symbols[2];
    assert_eq!(helper.avg_gap_days, Some(3.0));

    // Each non-merge commit had its source parsed once.
    assert_eq!(pipeline.cached_tables(), 7);
}

#[test]
fn symbol_report_serializes_boundary_shape() {
    let repo = TestRepo::python_service();
    let report = pipeline().analyze_file(&repo.entry("svc"), "app.py", &january_2026());
    let json = serde_json::to_value(&report).unwrap();

    let row = &json["symbol_touches"][0];
    for key in [
        "repo", "sha", "ts", "file", "symbol_id", "touches", "added", "deleted", "churn",
        "extractor", "flags",
    ] {
        assert!(row.get(key).is_some(), "missing {key}");
    }
    assert_eq!(row["extractor"], "ast");
    assert_eq!(row["ts"], "2026-01-05T10:00:00Z");
    assert_eq!(
        json["quality_flags"],
        serde_json::json!(["binary_numstat_present", "symbol_fallback_header"])
    );
}

// ── Metrics ──────────────────────────────────────────────────────

#[test]
fn file_report_from_real_history() {
    let repo = TestRepo::python_service();
    let report = pipeline().file_report(&repo.entry("svc"), "app.py", &january_2026());

    assert_eq!(report.summary.commit_touches, 7);
    assert_eq!(report.couplings.len(), 1);
    let coupling = &report.couplings[0];
    assert_eq!(coupling.other_file, "util.py");
    assert_eq!(coupling.shared_commits, 2);
    assert_eq!(coupling.target_commit_touches, 7);
    assert!((coupling.coupling - 0.2857).abs() < 1e-9);

    let touches: u32 = report.velocity.iter().map(|b| b.commit_touches).sum();
    assert_eq!(touches, 7);
    assert_eq!(report.velocity[0].bucket_start.to_string(), "2026-01-05");
}

#[test]
fn repo_summaries_and_relational_metrics() {
    let repo = TestRepo::python_service();
    let pipeline = pipeline();
    let repos = [repo.entry("svc"), RepoEntry::new("gone", "/nonexistent/timelapse")];
    let summaries = pipeline.analyze_repos(&repos, &january_2026(), &[]);

    assert_eq!(summaries.len(), 2);
    let svc = &summaries[0];
    assert_eq!(svc.throughput.commits, 8);
    assert_eq!(svc.top_churn_files[0].file, "app.py");
    assert_eq!(svc.top_churn_files[0].touches, 7);
    assert_eq!(svc.quality_flags, vec![QualityFlag::BinaryNumstatPresent]);
    assert_eq!(summaries[1].throughput.commits, 0);

    let commits = pipeline.load_commits(&repo.entry("svc"), &january_2026());
    let matrix = co_change_matrix(&commits, 50);
    assert_eq!(matrix.get("app.py", "util.py"), 2);
    assert_eq!(matrix.get("README.md", "app.py"), 1);
    assert!((rework_ratio(&commits, 7) - 0.5).abs() < 1e-12);
}
