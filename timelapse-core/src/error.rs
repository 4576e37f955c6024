/// Top-level Timelapse error type.
///
/// Most of the engine never surfaces errors: absent or malformed input is
/// resolved to empty results and quality flags. The variants below cover
/// configuration loading and strict symbol extraction. Git failures are
/// typed too, although the history loader only logs them.
#[derive(thiserror::Error, Debug)]
pub enum TimelapseError {
    /// Error while querying version-control history.
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A requested repository is not configured or not on disk.
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),

    /// Error from the symbol extraction engine.
    #[error("Symbol extraction error: {0}")]
    Graph(#[from] timelapse_graphs::GraphError),
}

/// Errors from the history query layer.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// The git process exited unsuccessfully.
    #[error("Git error: {0}")]
    Git(String),

    /// The git process could not be spawned or its output read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in Timelapse configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors resolving a repository by name.
#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    /// No `[[repos]]` entry carries this name.
    #[error("Unknown repo '{name}' (known: {known})")]
    Unknown { name: String, known: String },

    /// The configured path is not a directory.
    #[error("Repository not found: {0}")]
    NotFound(String),
}

/// Convenience alias for `Result<T, TimelapseError>`.
pub type Result<T> = std::result::Result<T, TimelapseError>;
