use thiserror::Error;

/// Result type for pipeline runs
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A single assignment could not be typed. Skipped and counted, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Assignment '{assignment}' at scope '{scope}' has no target definition id")]
    MissingTarget { scope: String, assignment: String },
}

/// Errors that end a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The one fatal case: nothing to catalog at all
    #[error("No archetypes discovered; nothing to catalog")]
    NoArchetypes,
}
