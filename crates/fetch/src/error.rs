use thiserror::Error;

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors raised while talking to remote document sources. Definition
/// lookups degrade these to not-found at the `DefinitionSource` boundary;
/// only archetype enumeration surfaces them to the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}
