//! Error types for vecbase.
//!
//! This module defines a unified error enum covering configuration, store
//! connectivity, schema provisioning, ingestion, query and deletion failures.
//! Which of these are fatal to a caller is decided by the component that
//! raises them, not here.

use thiserror::Error;

/// Unified error type for vecbase.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding model id not present in the model table
    #[error("Configuration error: unsupported embedding model '{0}'")]
    UnsupportedModel(String),

    /// Vector store or embedding provider unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema listing or class creation failed
    #[error("Schema error: {0}")]
    Schema(String),

    /// A single record could not be embedded or written
    #[error("Write error: {0}")]
    Write(String),

    /// Embedding provider returned an error or an unusable vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Store-side nearest-neighbour query failed
    #[error("Query error: {0}")]
    Query(String),

    /// Store-side deletion failed
    #[error("Deletion error: {0}")]
    Deletion(String),

    /// Caller supplied arguments that violate an operation's contract
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Configuration errors are always surfaced to the caller.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::UnsupportedModel(_))
    }

    /// Whether the error originated from talking to the vector store.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            AppError::Connection(_)
                | AppError::Schema(_)
                | AppError::Query(_)
                | AppError::Deletion(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
