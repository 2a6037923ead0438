//! Common error types for VEHOF

use thiserror::Error;

/// Common result type for VEHOF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the explorer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source table could not be fetched (missing file, non-success status)
    #[error("Failed to load archive: {0}")]
    Fetch(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
