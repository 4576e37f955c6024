pub mod diff;
pub mod git;
pub mod traits;

pub use diff::parse_hunks;
pub use git::{GitCli, load_commits, parse_history};
pub use traits::HistorySource;
