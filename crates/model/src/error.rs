use thiserror::Error;

/// Result type for definition lookups
pub type Result<T> = std::result::Result<T, SourceError>;

/// Failure of the definition-fetch capability. Transient by contract: the
/// pipeline degrades it to a not-found outcome after logging.
#[derive(Error, Debug)]
#[error("Failed to fetch definition '{id}': {reason}")]
pub struct SourceError {
    /// Definition id the lookup was for
    pub id: String,

    /// Human-readable failure description
    pub reason: String,
}

impl SourceError {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
