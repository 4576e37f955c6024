use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RepoError};

/// Report schema version stamped into serialized envelopes.
pub const SCHEMA_VERSION: &str = "v0.1";
/// Collector identifier stamped into serialized envelopes.
pub const COLLECTOR_VERSION: &str = "timelapse-analyzers/0.1";

/// Top-level Timelapse configuration, matching `timelapse.toml`.
///
/// The repository table lives here rather than in process-wide state, so
/// several repository sets can be analyzed side by side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelapseConfig {
    #[serde(default)]
    pub repos: Vec<RepoEntry>,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub metrics: MetricsSection,
    #[serde(default)]
    pub attribution: AttributionSection,
}

/// A named repository on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    pub path: PathBuf,
}

impl RepoEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    pub git_binary: String,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    /// Commits touching more files than this are left out of co-change counts.
    pub max_changeset_size: usize,
    pub min_shared_revs: u32,
    pub retouch_window_days: i64,
    pub velocity_bucket_days: i64,
    /// Upper bound of a prompt-to-commit lag still treated as related.
    pub max_lag_hours: f64,
    pub top_files: usize,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            max_changeset_size: 50,
            min_shared_revs: 2,
            retouch_window_days: 7,
            velocity_bucket_days: 7,
            max_lag_hours: 12.0,
            top_files: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionSection {
    /// Longest raw hunk header kept as an opaque pseudo-symbol.
    pub header_max_len: usize,
}

impl Default for AttributionSection {
    fn default() -> Self {
        Self { header_max_len: 80 }
    }
}

impl TimelapseConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.metrics;
        if m.max_changeset_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "metrics.max_changeset_size must be at least 2, got {}",
                m.max_changeset_size
            )));
        }
        if m.retouch_window_days <= 0 || m.velocity_bucket_days <= 0 {
            return Err(ConfigError::Invalid(
                "metrics windows must be positive day counts".to_string(),
            ));
        }
        if m.max_lag_hours.is_nan() || m.max_lag_hours < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "metrics.max_lag_hours must be non-negative, got {}",
                m.max_lag_hours
            )));
        }

        let mut seen = HashSet::new();
        for repo in &self.repos {
            if !seen.insert(repo.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate repo name: {}",
                    repo.name
                )));
            }
        }
        Ok(())
    }

    pub fn repo(&self, name: &str) -> Option<&RepoEntry> {
        self.repos.iter().find(|r| r.name == name)
    }

    /// Look up a configured repository and check that it exists on disk.
    pub fn resolve_repo(&self, name: &str) -> Result<&RepoEntry, RepoError> {
        let repo = self.repo(name).ok_or_else(|| RepoError::Unknown {
            name: name.to_string(),
            known: self
                .repos
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
        if !repo.path.is_dir() {
            return Err(RepoError::NotFound(repo.path.display().to_string()));
        }
        Ok(repo)
    }
}
