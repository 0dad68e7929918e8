//! Error types for graph storage, retrieval and model providers

use thiserror::Error;

/// Errors raised by graph backends and the retrieval engine
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    /// Concurrent write collision; the same operation may succeed when retried
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Model provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Whether a retry of the same operation could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            GraphError::Connection(_) | GraphError::Conflict(_) | GraphError::Timeout { .. } => true,
            GraphError::Provider(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}

/// Errors raised by embedding and chat providers
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type for provider calls
pub type LlmResult<T> = Result<T, LlmError>;

impl LlmError {
    /// Whether a retry of the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::HttpError(_) | LlmError::Timeout(_) | LlmError::Unavailable(_)
        )
    }
}
