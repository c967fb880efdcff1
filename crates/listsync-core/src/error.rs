//! Error types for listsync-core

use thiserror::Error;

/// Result type alias using listsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in listsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// HTTP transport error while talking to the managed backend
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Managed backend answered with a non-success status
    #[error("Backend API error: {0}")]
    Api(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// List or value not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A list definition failed validation
    #[error("Invalid list definition: {0}")]
    InvalidDefinition(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
