#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{Commit, PromptEvent};

/// Hours from each commit back to the latest same-repo event at or before
/// it. Commits without such an event, or whose lag exceeds
/// `max_lag_hours`, contribute nothing.
pub fn nearest_event_lags_hours(
    commits: &[Commit],
    events: &[PromptEvent],
    max_lag_hours: f64,
) -> Vec<f64> {
    let mut by_repo: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
    for event in events {
        by_repo.entry(event.repo.as_str()).or_default().push(event.ts);
    }
    for stamps in by_repo.values_mut() {
        stamps.sort();
    }

    commits
        .iter()
        .filter_map(|commit| {
            let stamps = by_repo.get(commit.repo.as_str())?;
            let preceding = stamps.partition_point(|ts| *ts <= commit.ts);
            let nearest = stamps.get(preceding.checked_sub(1)?)?;
            let lag = (commit.ts - *nearest).num_milliseconds() as f64 / 3_600_000.0;
            (0.0..=max_lag_hours).contains(&lag).then_some(lag)
        })
        .collect()
}

/// Median of a sample, `None` when it is empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
