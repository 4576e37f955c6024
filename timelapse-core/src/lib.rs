//! Timelapse core library: history loading, diff hunk parsing, symbol
//! attribution and change metrics.
//!
//! The main entry point is [`pipeline::SymbolPipeline`], which runs the
//! History → Hunks → Symbols → Rows flow over any [`extract::HistorySource`].
//! The metric functions in [`analyze`] need only the commit model and work
//! without diff text.

pub mod analyze;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod types;

pub use config::{RepoEntry, TimelapseConfig};
pub use error::{ConfigError, ExtractError, RepoError, Result, TimelapseError};
pub use extract::{GitCli, HistorySource};
pub use pipeline::{SymbolPipeline, SymbolReport};
