use std::path::Path;

use crate::error::ExtractError;
use crate::types::TimeWindow;

/// Read-only access to a repository's version-control history.
///
/// Every operation returns raw text; parsing happens in the loader and the
/// hunk parser so that test doubles only need to hand back canned output.
pub trait HistorySource: Send + Sync {
    /// `sha|author-iso-ts|subject|parents` headers, each followed by
    /// numstat lines, for commits in `window`.
    fn log_numstat(&self, repo: &Path, window: &TimeWindow) -> Result<String, ExtractError>;

    /// Zero-context unified diff of `path` introduced by `sha`.
    fn commit_file_diff(&self, repo: &Path, sha: &str, path: &str)
    -> Result<String, ExtractError>;

    /// Full content of `path` as of `sha`.
    fn file_at_commit(&self, repo: &Path, sha: &str, path: &str) -> Result<String, ExtractError>;
}

impl<T: HistorySource + ?Sized> HistorySource for &T {
    fn log_numstat(&self, repo: &Path, window: &TimeWindow) -> Result<String, ExtractError> {
        (**self).log_numstat(repo, window)
    }

    fn commit_file_diff(
        &self,
        repo: &Path,
        sha: &str,
        path: &str,
    ) -> Result<String, ExtractError> {
        (**self).commit_file_diff(repo, sha, path)
    }

    fn file_at_commit(&self, repo: &Path, sha: &str, path: &str) -> Result<String, ExtractError> {
        (**self).file_at_commit(repo, sha, path)
    }
}
