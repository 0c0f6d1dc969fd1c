use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the virology dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The uploaded input cannot be interpreted as delimited tabular data.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The uploaded file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A year/month selection is out of range.
    #[error("Invalid filter criteria: {0}")]
    InvalidCriteria(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashboardError {
    /// `true` for errors that mean the upload itself is unusable.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            DashboardError::MalformedInput(_) | DashboardError::FileRead { .. }
        )
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
