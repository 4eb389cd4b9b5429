//! Error types for the account policy.

use thiserror::Error;

use crate::account::{FieldError, PasswordError, StoreError};

/// Common error type for account policy operations.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A field was rejected by its validators.
    ///
    /// The message is meant for the end user.
    #[error("{0}")]
    Field(#[from] FieldError),

    /// Password hashing failed.
    ///
    /// The write that triggered the hash must be aborted.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// The storage layer rejected the operation.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Login failed. Never says whether the identifier or the password was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account not found.
    #[error("account not found")]
    NotFound,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PolicyError {
    /// Whether the error message may be returned to the end user as-is.
    ///
    /// Hashing, storage backend, I/O and configuration failures are internal
    /// and should be reported as a generic failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            PolicyError::Field(_) | PolicyError::InvalidCredentials | PolicyError::NotFound => true,
            PolicyError::Store(e) => e.is_conflict(),
            PolicyError::Password(_) | PolicyError::Io(_) | PolicyError::Config(_) => false,
        }
    }
}

/// Result type alias for account policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
