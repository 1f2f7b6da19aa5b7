use std::path::PathBuf;
use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors writing or re-reading the persisted catalog.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid parameter JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A recompute needs a table a previous extract run should have written
    #[error("Missing catalog table: {0}")]
    MissingTable(PathBuf),
}
