//! Error types for notekeep.

use thiserror::Error;

/// Result type alias using notekeep's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notekeep operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No resolvable caller identity.
    #[error("User not authenticated")]
    Unauthenticated,

    /// Note does not exist or is owned by someone else.
    ///
    /// The two cases share one variant so callers cannot discover other
    /// users' note ids.
    #[error("Note not found or access denied: {0}")]
    NotFoundOrForbidden(uuid::Uuid),

    /// Input rejected before touching the store.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Identity provider rejected the code or returned an unusable profile.
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
