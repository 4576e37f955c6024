#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::MetricsSection;
use crate::types::{Commit, PromptEvent, QualityFlag, TimeWindow};

use super::behavioral::{
    CouplingRow, VelocityBucket, churn_velocity, coupling_scores, per_file_retouch_ratio,
    rework_ratio,
};
use super::temporal::{median, nearest_event_lags_hours};
use super::{round4, round6};

// ── Repository summary ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    pub commits: usize,
    pub events: usize,
    pub insertions: u64,
    pub deletions: u64,
    pub commits_per_day: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mix {
    pub commits_by_repo: BTreeMap<String, usize>,
    pub events_by_repo: BTreeMap<String, usize>,
    pub events_by_source: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub retouch_window_days: i64,
    pub rework_ratio: f64,
    pub median_lag_hours: Option<f64>,
    pub lag_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChurn {
    pub file: String,
    pub touches: usize,
    pub insertions: u64,
    pub deletions: u64,
}

/// Throughput, mix and churn over the commits of one or more repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub window: TimeWindow,
    pub throughput: Throughput,
    pub mix: Mix,
    pub optimization: Optimization,
    pub top_churn_files: Vec<FileChurn>,
    pub quality_flags: Vec<QualityFlag>,
    pub commits: Vec<Commit>,
}

impl RepoSummary {
    /// Summarize `commits` against the events that fall in `window`.
    pub fn build(
        mut commits: Vec<Commit>,
        events: &[PromptEvent],
        window: TimeWindow,
        metrics: &MetricsSection,
    ) -> Self {
        commits.sort_by_key(|c| c.ts);
        let events: Vec<PromptEvent> = events
            .iter()
            .filter(|e| window.contains(e.ts))
            .cloned()
            .collect();

        let insertions = commits.iter().map(|c| c.insertions).sum();
        let deletions = commits.iter().map(|c| c.deletions).sum();
        let commits_per_day = round4(commits.len() as f64 / window.span_days() as f64);

        let mut mix = Mix::default();
        for commit in &commits {
            *mix.commits_by_repo.entry(commit.repo.clone()).or_default() += 1;
        }
        for event in &events {
            *mix.events_by_repo.entry(event.repo.clone()).or_default() += 1;
            *mix.events_by_source.entry(event.source.clone()).or_default() += 1;
        }

        let lags = nearest_event_lags_hours(&commits, &events, metrics.max_lag_hours);

        let quality_flags = if commits.iter().any(|c| c.binary_numstat) {
            vec![QualityFlag::BinaryNumstatPresent]
        } else {
            Vec::new()
        };

        Self {
            window,
            throughput: Throughput {
                commits: commits.len(),
                events: events.len(),
                insertions,
                deletions,
                commits_per_day,
            },
            mix,
            optimization: Optimization {
                retouch_window_days: metrics.retouch_window_days,
                rework_ratio: round6(rework_ratio(&commits, metrics.retouch_window_days)),
                median_lag_hours: median(&lags),
                lag_samples: lags.len(),
            },
            top_churn_files: top_files(&commits, metrics.top_files),
            quality_flags,
            commits,
        }
    }
}

/// Most frequently touched files, ties broken by path.
fn top_files(commits: &[Commit], limit: usize) -> Vec<FileChurn> {
    let mut churn: HashMap<&str, FileChurn> = HashMap::new();
    for commit in commits {
        for file in &commit.files {
            let stat = commit.file_stat(file);
            let entry = churn.entry(file.as_str()).or_insert_with(|| FileChurn {
                file: file.clone(),
                touches: 0,
                insertions: 0,
                deletions: 0,
            });
            entry.touches += 1;
            entry.insertions += stat.insertions;
            entry.deletions += stat.deletions;
        }
    }

    let mut files: Vec<FileChurn> = churn.into_values().collect();
    files.sort_by(|a, b| b.touches.cmp(&a.touches).then_with(|| a.file.cmp(&b.file)));
    files.truncate(limit);
    files
}

// ── File report ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub commit_touches: usize,
    pub file_insertions: u64,
    pub file_deletions: u64,
    pub retouch_window_days: i64,
    pub retouch_ratio: f64,
}

/// One commit's change to the reported file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCommit {
    pub sha: String,
    pub ts: chrono::DateTime<chrono::Utc>,
    pub subject: String,
    pub file_insertions: u64,
    pub file_deletions: u64,
    pub commit_insertions: u64,
    pub commit_deletions: u64,
    pub binary_numstat: bool,
    pub merge_commit: bool,
}

/// Churn, coupling and velocity of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub repo: String,
    pub file: String,
    pub window: TimeWindow,
    pub summary: FileSummary,
    pub couplings: Vec<CouplingRow>,
    pub velocity: Vec<VelocityBucket>,
    pub quality_flags: Vec<QualityFlag>,
    pub commits: Vec<FileCommit>,
}

impl FileReport {
    /// Build the report from every commit of the repository in the window;
    /// coupling needs the commits that did not touch `file` too.
    pub fn build(
        repo: &str,
        file: &str,
        window: TimeWindow,
        commits: &[Commit],
        metrics: &MetricsSection,
    ) -> Self {
        let mut touching: Vec<&Commit> = commits.iter().filter(|c| c.touches(file)).collect();
        touching.sort_by_key(|c| c.ts);

        let history: Vec<FileCommit> = touching
            .iter()
            .map(|c| {
                let stat = c.file_stat(file);
                FileCommit {
                    sha: c.sha.clone(),
                    ts: c.ts,
                    subject: c.subject.clone(),
                    file_insertions: stat.insertions,
                    file_deletions: stat.deletions,
                    commit_insertions: c.insertions,
                    commit_deletions: c.deletions,
                    binary_numstat: c.binary_numstat,
                    merge_commit: c.merge_commit,
                }
            })
            .collect();

        let quality_flags = if touching.iter().any(|c| c.binary_numstat) {
            vec![QualityFlag::BinaryNumstatPresent]
        } else {
            Vec::new()
        };

        Self {
            repo: repo.to_string(),
            file: file.to_string(),
            window,
            summary: FileSummary {
                commit_touches: history.len(),
                file_insertions: history.iter().map(|c| c.file_insertions).sum(),
                file_deletions: history.iter().map(|c| c.file_deletions).sum(),
                retouch_window_days: metrics.retouch_window_days,
                retouch_ratio: round6(per_file_retouch_ratio(
                    commits,
                    file,
                    metrics.retouch_window_days,
                )),
            },
            couplings: coupling_scores(
                commits,
                file,
                metrics.min_shared_revs,
                metrics.max_changeset_size,
            ),
            velocity: churn_velocity(commits, file, metrics.velocity_bucket_days),
            quality_flags,
            commits: history,
        }
    }
}
