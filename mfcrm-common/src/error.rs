//! Common error types for the CRM

use thiserror::Error;

/// Common result type for CRM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the CRM crates
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

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation refused because other records still reference the target
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    /// True when the error carries a message meant for the end user
    /// rather than a persistence failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::InvalidInput(_) | Error::Conflict(_)
        )
    }

    /// Message suitable for showing to the user: validation errors without
    /// their category prefix, everything else in full.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound(msg) | Error::InvalidInput(msg) | Error::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
