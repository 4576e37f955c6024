pub mod behavioral;
pub mod summary;
pub mod symbols;
pub mod temporal;

pub use behavioral::{
    CoChangeMatrix, CouplingRow, VelocityBucket, churn_velocity, co_change_matrix,
    coupling_scores, per_file_retouch_ratio, rework_ratio,
};
pub use summary::{FileReport, RepoSummary};
pub use symbols::{
    FileAttribution, SymbolHits, aggregate_rows, attribute_commit_file, map_hunks_to_symbols,
    symbols_from_hunk_headers,
};
pub use temporal::{median, nearest_event_lags_hours};

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub(crate) fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
