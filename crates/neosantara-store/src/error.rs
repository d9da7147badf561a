//! Error types for neosantara-store

use thiserror::Error;

/// Result type alias using neosantara-store Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when persisting or reading chat data
#[derive(Error, Debug)]
pub enum Error {
    /// An error decoding parts or turns
    #[error(transparent)]
    Parts(#[from] neosantara_parts::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The storage service rejected the request
    #[error("Storage error: {message}")]
    Storage {
        status: Option<u16>,
        message: String,
    },

    /// Writing the finalized assistant message failed
    #[error("Failed to save assistant message: {source}")]
    SaveFailed {
        #[source]
        source: Box<Error>,
    },

    /// Row does not exist (or is hidden from the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row exists but its chat is not public
    #[error("This content is not public")]
    NotPublic,

    /// No authenticated user
    #[error("Unauthorized")]
    Unauthorized,

    /// Request is missing required data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a storage error from a message
    pub fn storage(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Storage {
            status,
            message: message.into(),
        }
    }

    /// Wrap a failed write of the assistant message
    pub fn save_failed(source: Error) -> Self {
        Self::SaveFailed {
            source: Box::new(source),
        }
    }

    /// Check if this error means the row is missing
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Storage { status, .. } => *status == Some(404),
            Error::SaveFailed { source } => source.is_not_found(),
            _ => false,
        }
    }
}
