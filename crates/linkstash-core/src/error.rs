//! Error types for linkstash-core

use thiserror::Error;

/// Result type alias using linkstash-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in linkstash-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Persistence collaborator failed (create, list, or delete)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Push channel failed to subscribe or deliver
    #[error("Channel error: {0}")]
    Channel(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bookmark not found
    #[error("Bookmark not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
