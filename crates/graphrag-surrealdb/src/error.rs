//! SurrealDB failures and their mapping onto [`GraphError`]

use graphrag_core::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: surrealdb::Error,
    },

    #[error("failed to create database directory {target}: {source}")]
    OpenDir {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context} failed: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: surrealdb::Error,
    },

    /// Optimistic transaction lost a race with a concurrent writer
    #[error("{context} hit a write conflict: {source}")]
    Conflict {
        context: &'static str,
        #[source]
        source: surrealdb::Error,
    },

    #[error("unexpected result shape in {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: surrealdb::Error,
    },

    #[error("backend is closed")]
    Closed,
}

impl StoreError {
    /// Statement failure; retryable commit conflicts become [`StoreError::Conflict`]
    pub fn query(context: &'static str) -> impl FnOnce(surrealdb::Error) -> Self {
        move |source| {
            if is_conflict_message(&source.to_string()) {
                Self::Conflict { context, source }
            } else {
                Self::Query { context, source }
            }
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn decode(context: &'static str) -> impl FnOnce(surrealdb::Error) -> Self {
        move |source| Self::Decode { context, source }
    }
}

/// SurrealDB reports optimistic commit failures as plain errors whose text
/// says the transaction can be retried
fn is_conflict_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("read or write conflict") || message.contains("transaction can be retried")
}

impl From<StoreError> for GraphError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Open { .. } | StoreError::OpenDir { .. } | StoreError::Closed => {
                GraphError::Connection(err.to_string())
            }
            StoreError::Query { .. } => GraphError::Query(err.to_string()),
            StoreError::Conflict { .. } => GraphError::Conflict(err.to_string()),
            StoreError::Decode { .. } => GraphError::Serialization(err.to_string()),
        }
    }
}
