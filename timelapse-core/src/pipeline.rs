// Pipeline orchestrator: history → hunks → symbol tables → touch rows.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use timelapse_graphs::{SymbolExtractor, SymbolTable};
use tracing::{debug, info, instrument, warn};

use crate::analyze::{FileReport, RepoSummary, aggregate_rows, attribute_commit_file};
use crate::config::{RepoEntry, TimelapseConfig};
use crate::extract::{HistorySource, load_commits};
use crate::types::{
    Commit, PromptEvent, QualityFlag, SymbolRollup, SymbolTouchRow, TimeWindow,
};

/// Symbol-level churn of one file over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub repo: String,
    pub file: String,
    pub window: TimeWindow,
    pub quality_flags: Vec<QualityFlag>,
    pub symbol_touches: Vec<SymbolTouchRow>,
    pub symbols: Vec<SymbolRollup>,
}

type TableKey = (String, String);

/// Drives the loader, hunk parser, extractor and mapper over a history
/// source. Symbol tables are cached per (commit, file).
#[derive(Debug)]
pub struct SymbolPipeline<S> {
    source: S,
    config: TimelapseConfig,
    extractor: SymbolExtractor,
    tables: Mutex<HashMap<TableKey, Arc<SymbolTable>>>,
}

impl<S: HistorySource> SymbolPipeline<S> {
    pub fn new(source: S, config: TimelapseConfig) -> Self {
        Self {
            source,
            config,
            extractor: SymbolExtractor::new(),
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TimelapseConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Commits of `repo` inside `window`, oldest first.
    pub fn load_commits(&self, repo: &RepoEntry, window: &TimeWindow) -> Vec<Commit> {
        let mut commits = load_commits(&self.source, repo, window);
        commits.sort_by_key(|c| c.ts);
        commits
    }

    /// Symbol table of `file` as of `sha`, extracted once and then cached.
    pub fn symbol_table(&self, repo: &Path, sha: &str, file: &str) -> Arc<SymbolTable> {
        let key = (sha.to_string(), file.to_string());
        if let Some(table) = self.cache().get(&key) {
            return Arc::clone(table);
        }

        let table = match self.source.file_at_commit(repo, sha, file) {
            Ok(text) => self.extractor.extract(Path::new(file), &text),
            Err(e) => {
                debug!(sha, file, error = %e, "File content unavailable at commit");
                SymbolTable::Empty
            }
        };

        Arc::clone(self.cache().entry(key).or_insert_with(|| Arc::new(table)))
    }

    /// Number of cached symbol tables.
    pub fn cached_tables(&self) -> usize {
        self.cache().len()
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<TableKey, Arc<SymbolTable>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attribute every change to `file` in `window` to the symbols it touched.
    #[instrument(skip_all, fields(repo = %repo.name, file = %file))]
    pub fn analyze_file(&self, repo: &RepoEntry, file: &str, window: &TimeWindow) -> SymbolReport {
        let start = Instant::now();
        let commits: Vec<Commit> = self
            .load_commits(repo, window)
            .into_iter()
            .filter(|c| c.touches(file))
            .collect();

        let header_max_len = self.config.attribution.header_max_len;
        let per_commit: Vec<_> = commits
            .par_iter()
            .map(|commit| {
                let diff = if commit.merge_commit {
                    String::new()
                } else {
                    self.commit_diff(repo, commit, file)
                };
                let table = if diff.trim().is_empty() {
                    Arc::new(SymbolTable::Empty)
                } else {
                    self.symbol_table(&repo.path, &commit.sha, file)
                };
                attribute_commit_file(commit, file, &diff, &table, header_max_len)
            })
            .collect();

        let mut rows = Vec::new();
        let mut flags = BTreeSet::new();
        for (commit, attribution) in commits.iter().zip(per_commit) {
            rows.extend(attribution.rows);
            flags.extend(attribution.flags);
            if commit.binary_numstat {
                flags.insert(QualityFlag::BinaryNumstatPresent);
            }
        }

        let symbols = aggregate_rows(&rows);
        info!(
            commits = commits.len(),
            rows = rows.len(),
            symbols = symbols.len(),
            duration = ?start.elapsed(),
            "Symbol attribution complete"
        );

        SymbolReport {
            repo: repo.name.clone(),
            file: file.to_string(),
            window: *window,
            quality_flags: flags.into_iter().collect(),
            symbol_touches: rows,
            symbols,
        }
    }

    fn commit_diff(&self, repo: &RepoEntry, commit: &Commit, file: &str) -> String {
        match self.source.commit_file_diff(&repo.path, &commit.sha, file) {
            Ok(diff) => diff,
            Err(e) => {
                warn!(sha = %commit.sha, file, error = %e, "Diff query failed, skipping commit");
                String::new()
            }
        }
    }

    /// Churn, coupling and velocity report for one file.
    #[instrument(skip_all, fields(repo = %repo.name, file = %file))]
    pub fn file_report(&self, repo: &RepoEntry, file: &str, window: &TimeWindow) -> FileReport {
        let commits = self.load_commits(repo, window);
        FileReport::build(&repo.name, file, *window, &commits, &self.config.metrics)
    }

    /// One summary per repository, each against its own events.
    #[instrument(skip_all, fields(repos = repos.len()))]
    pub fn analyze_repos(
        &self,
        repos: &[RepoEntry],
        window: &TimeWindow,
        events: &[PromptEvent],
    ) -> Vec<RepoSummary> {
        let start = Instant::now();
        let summaries: Vec<RepoSummary> = repos
            .par_iter()
            .map(|repo| {
                let commits = self.load_commits(repo, window);
                let events: Vec<PromptEvent> = events
                    .iter()
                    .filter(|e| e.repo == repo.name)
                    .cloned()
                    .collect();
                RepoSummary::build(commits, &events, *window, &self.config.metrics)
            })
            .collect();

        info!(duration = ?start.elapsed(), "Repository summaries complete");
        summaries
    }

    /// A single summary across all `repos`.
    #[instrument(skip_all, fields(repos = repos.len()))]
    pub fn summarize(
        &self,
        repos: &[RepoEntry],
        window: &TimeWindow,
        events: &[PromptEvent],
    ) -> RepoSummary {
        let commits: Vec<Commit> = repos
            .par_iter()
            .flat_map_iter(|repo| self.load_commits(repo, window))
            .collect();
        RepoSummary::build(commits, events, *window, &self.config.metrics)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::error::ExtractError;
    use crate::types::AttributionMethod;

    const SHA_1: &str = "1111111111111111111111111111111111111111";
    const SHA_2: &str = "2222222222222222222222222222222222222222";
    const SHA_3: &str = "3333333333333333333333333333333333333333";
    const SHA_4: &str = "4444444444444444444444444444444444444444";

    /// Canned history: one `app.py` created, edited, merged and edited again.
    #[derive(Default)]
    struct FakeHistory {
        content_reads: AtomicUsize,
    }

    impl HistorySource for FakeHistory {
        fn log_numstat(&self, repo: &Path, _: &TimeWindow) -> Result<String, ExtractError> {
            if repo != Path::new("/srv/bot") {
                return Err(ExtractError::Git("not a git repository".into()));
            }
            Ok(format!(
                "{SHA_4}|2026-01-04T00:00:00Z|Edit g|{SHA_3}\n\
                 1\t1\tapp.py\n\
                 {SHA_3}|2026-01-03T00:00:00Z|Merge branch 'feature'|{SHA_2} {SHA_1}\n\
                 1\t1\tapp.py\n\
                 {SHA_2}|2026-01-02T00:00:00Z|Edit f|{SHA_1}\n\
                 1\t1\tapp.py\n\
                 -\t-\tlogo.png\n\
                 {SHA_1}|2026-01-01T00:00:00Z|Add app|\n\
                 6\t0\tapp.py\n\
                 1\t0\tREADME.md\n"
            ))
        }

        fn commit_file_diff(&self, _: &Path, sha: &str, _: &str) -> Result<String, ExtractError> {
            Ok(match sha {
                SHA_1 => "@@ -0,0 +1,6 @@\n+class A:\n+    def f(self):\n+        return 1\n+\n+def g():\n+    return 2\n",
                SHA_2 => "@@ -3 +3 @@ class A:\n-        return 1\n+        return 10\n",
                SHA_4 => "@@ -6 +6 @@ def g():\n-    return 2\n+    return 20\n",
                _ => "",
            }
            .to_string())
        }

        fn file_at_commit(&self, _: &Path, sha: &str, _: &str) -> Result<String, ExtractError> {
            self.content_reads.fetch_add(1, Ordering::SeqCst);
            match sha {
                SHA_1 => Ok("class A:\n    def f(self):\n        return 1\n\ndef g():\n    return 2\n".into()),
                SHA_2 => Ok("class A:\n    def f(self):\n        return 10\n\ndef g():\n    return 2\n".into()),
                // Broken syntax forces the header fallback.
                _ => Ok("class A:\n    def f(self:\n".into()),
            }
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        )
    }

    fn bot() -> RepoEntry {
        RepoEntry::new("bot", "/srv/bot")
    }

    #[test]
    fn analyze_file_attributes_each_commit() {
        let pipeline = SymbolPipeline::new(FakeHistory::default(), TimelapseConfig::default());
        let report = pipeline.analyze_file(&bot(), "app.py", &window());

        let rows: Vec<_> = report
            .symbol_touches
            .iter()
            .map(|r| (&r.sha[..1], r.symbol_id.as_str(), r.extractor))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("1", "A", AttributionMethod::Ast),
                ("1", "A.f", AttributionMethod::Ast),
                ("1", "g", AttributionMethod::Ast),
                ("2", "A", AttributionMethod::Ast),
                ("2", "A.f", AttributionMethod::Ast),
                ("4", "g", AttributionMethod::HeaderFallback),
            ]
        );
        assert_eq!(
            report.quality_flags,
            vec![
                QualityFlag::BinaryNumstatPresent,
                QualityFlag::MergeSkipped,
                QualityFlag::SymbolFallbackHeader,
            ]
        );
        assert_eq!(report.symbol_touches[3].flags, vec![QualityFlag::BinaryNumstatPresent]);

        let top: Vec<_> = report.symbols.iter().map(|s| (s.symbol_id.as_str(), s.touches)).collect();
        assert_eq!(top, vec![("A", 2), ("A.f", 2), ("g", 2)]);
        assert_eq!(report.symbols[0].avg_gap_days, Some(1.0));
        assert_eq!(report.symbols[2].avg_gap_days, Some(3.0));
    }

    #[test]
    fn symbol_tables_are_cached_per_commit_and_file() {
        let pipeline = SymbolPipeline::new(FakeHistory::default(), TimelapseConfig::default());
        pipeline.analyze_file(&bot(), "app.py", &window());
        let reads = pipeline.source().content_reads.load(Ordering::SeqCst);
        assert_eq!(reads, 3);
        assert_eq!(pipeline.cached_tables(), 3);

        pipeline.analyze_file(&bot(), "app.py", &window());
        assert_eq!(pipeline.source().content_reads.load(Ordering::SeqCst), reads);
    }

    #[test]
    fn unknown_repository_yields_empty_report() {
        let pipeline = SymbolPipeline::new(FakeHistory::default(), TimelapseConfig::default());
        let gone = RepoEntry::new("gone", "/srv/gone");
        let report = pipeline.analyze_file(&gone, "app.py", &window());
        assert!(report.symbol_touches.is_empty());
        assert!(report.symbols.is_empty());
        assert!(report.quality_flags.is_empty());
    }

    #[test]
    fn analyze_repos_keeps_going_past_broken_repositories() {
        let pipeline = SymbolPipeline::new(FakeHistory::default(), TimelapseConfig::default());
        let events = [PromptEvent {
            repo: "bot".into(),
            ts: Utc.with_ymd_and_hms(2026, 1, 1, 23, 0, 0).unwrap(),
            source: "claude".into(),
            text: "edit f".into(),
            session_id: None,
        }];
        let repos = [bot(), RepoEntry::new("gone", "/srv/gone")];
        let summaries = pipeline.analyze_repos(&repos, &window(), &events);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].throughput.commits, 4);
        assert_eq!(summaries[0].throughput.events, 1);
        assert_eq!(summaries[0].optimization.median_lag_hours, Some(1.0));
        assert_eq!(summaries[1].throughput.commits, 0);
        assert_eq!(summaries[1].throughput.events, 0);

        let combined = pipeline.summarize(&repos, &window(), &events);
        assert_eq!(combined.throughput.commits, 4);
        assert_eq!(combined.mix.commits_by_repo["bot"], 4);
    }

    #[test]
    fn file_report_uses_repository_history() {
        let pipeline = SymbolPipeline::new(FakeHistory::default(), TimelapseConfig::default());
        let report = pipeline.file_report(&bot(), "app.py", &window());
        assert_eq!(report.summary.commit_touches, 4);
        assert_eq!(report.summary.file_insertions, 9);
        assert_eq!(report.quality_flags, vec![QualityFlag::BinaryNumstatPresent]);
    }
}
