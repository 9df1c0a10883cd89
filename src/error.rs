use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallWatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Failures of an inventory data source.
///
/// These never reach the host application directly: the scanner logs them and
/// degrades to an empty inventory, the orchestrator reports them as
/// `success = false`.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("command `{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("could not parse source output: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, InstallWatchError>;
