// Ratios intentionally cast counts to float.
#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Commit;

use super::round4;

// ── Co-change ──────────────────────────────────────────────────────

/// Unordered file pairs and the number of commits that changed both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoChangeMatrix {
    pairs: BTreeMap<(String, String), u32>,
}

impl CoChangeMatrix {
    /// Shared commits of `a` and `b`, in either order.
    pub fn get(&self, a: &str, b: &str) -> u32 {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.pairs
            .get(&(key.0.to_string(), key.1.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Pairs in lexicographic order, smaller path first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, u32)> {
        self.pairs
            .iter()
            .map(|((a, b), &n)| (a.as_str(), b.as_str(), n))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn unique_sorted_files(commit: &Commit) -> Vec<&str> {
    let mut files: Vec<&str> = commit.files.iter().map(String::as_str).collect();
    files.sort_unstable();
    files.dedup();
    files
}

/// Count every file pair of each commit touching between two and
/// `max_changeset_size` files.
pub fn co_change_matrix(commits: &[Commit], max_changeset_size: usize) -> CoChangeMatrix {
    let mut pairs: BTreeMap<(String, String), u32> = BTreeMap::new();

    for commit in commits {
        let files = unique_sorted_files(commit);
        if files.len() < 2 || files.len() > max_changeset_size {
            continue;
        }
        for (i, left) in files.iter().enumerate() {
            for right in &files[i + 1..] {
                *pairs
                    .entry(((*left).to_string(), (*right).to_string()))
                    .or_default() += 1;
            }
        }
    }

    CoChangeMatrix { pairs }
}

/// One file frequently changed alongside the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingRow {
    pub file: String,
    pub other_file: String,
    pub shared_commits: u32,
    pub target_commit_touches: u32,
    pub coupling: f64,
}

/// Files sharing at least `min_shared_revs` commits with `target`, scored
/// as shared commits over the target's own commit count.
pub fn coupling_scores(
    commits: &[Commit],
    target: &str,
    min_shared_revs: u32,
    max_changeset_size: usize,
) -> Vec<CouplingRow> {
    let target_touches = commits
        .iter()
        .filter(|c| unique_sorted_files(c).len() <= max_changeset_size && c.touches(target))
        .count();
    let base = u32::try_from(target_touches).unwrap_or(u32::MAX).max(1);

    let matrix = co_change_matrix(commits, max_changeset_size);
    let mut rows: Vec<CouplingRow> = matrix
        .iter()
        .filter(|&(_, _, shared)| shared >= min_shared_revs)
        .filter_map(|(left, right, shared)| {
            let other = if left == target {
                right
            } else if right == target {
                left
            } else {
                return None;
            };
            Some(CouplingRow {
                file: target.to_string(),
                other_file: other.to_string(),
                shared_commits: shared,
                target_commit_touches: base,
                coupling: round4(f64::from(shared) / f64::from(base)),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.shared_commits
            .cmp(&a.shared_commits)
            .then_with(|| b.coupling.total_cmp(&a.coupling))
            .then_with(|| a.other_file.cmp(&b.other_file))
    });
    rows
}

// ── Rework ─────────────────────────────────────────────────────────

/// Day count as a duration, saturating where it exceeds the time range.
fn window_of(days: i64) -> Duration {
    Duration::try_days(days).unwrap_or(Duration::MAX)
}

/// Share of touched files changed again within `window_days` of a
/// previous change.
pub fn rework_ratio(commits: &[Commit], window_days: i64) -> f64 {
    let mut stamps: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
    for commit in commits {
        for file in &commit.files {
            stamps.entry(file.as_str()).or_default().push(commit.ts);
        }
    }
    if stamps.is_empty() {
        return 0.0;
    }

    let window = window_of(window_days);
    let touched = stamps.len();
    let retouched = stamps
        .into_values()
        .map(|mut ts| {
            ts.sort();
            ts.windows(2).any(|w| w[1] - w[0] <= window)
        })
        .filter(|&retouched| retouched)
        .count();

    retouched as f64 / touched as f64
}

/// Fraction of consecutive changes to `file` that landed within
/// `window_days` of each other. Zero below two changes.
pub fn per_file_retouch_ratio(commits: &[Commit], file: &str, window_days: i64) -> f64 {
    let mut stamps: Vec<DateTime<Utc>> = commits
        .iter()
        .filter(|c| c.touches(file))
        .map(|c| c.ts)
        .collect();
    if stamps.len() < 2 {
        return 0.0;
    }
    stamps.sort();

    let window = window_of(window_days);
    let retouches = stamps.windows(2).filter(|w| w[1] - w[0] <= window).count();
    retouches as f64 / (stamps.len() - 1) as f64
}

// ── Churn velocity ─────────────────────────────────────────────────

/// Changes to one file within one fixed-width time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocityBucket {
    pub bucket_index: i64,
    /// Date of the first commit that landed in the bucket.
    pub bucket_start: NaiveDate,
    pub commit_touches: u32,
    pub insertions: u64,
    pub deletions: u64,
}

/// Bucket the changes to `file` into `bucket_days`-wide windows anchored
/// at its first change.
pub fn churn_velocity(commits: &[Commit], file: &str, bucket_days: i64) -> Vec<VelocityBucket> {
    let mut touching: Vec<&Commit> = commits.iter().filter(|c| c.touches(file)).collect();
    let Some(first) = touching.iter().map(|c| c.ts).min() else {
        return Vec::new();
    };
    touching.sort_by_key(|c| c.ts);

    let bucket_days = bucket_days.max(1);
    let mut buckets: BTreeMap<i64, VelocityBucket> = BTreeMap::new();

    for commit in touching {
        let index = (commit.ts - first).num_days() / bucket_days;
        let stat = commit.file_stat(file);
        let bucket = buckets.entry(index).or_insert_with(|| VelocityBucket {
            bucket_index: index,
            bucket_start: commit.ts.date_naive(),
            commit_touches: 0,
            insertions: 0,
            deletions: 0,
        });
        bucket.commit_touches += 1;
        bucket.insertions += stat.insertions;
        bucket.deletions += stat.deletions;
    }

    buckets.into_values().collect()
}

// ── Tests ──────────────────────────────────────────────────────────
