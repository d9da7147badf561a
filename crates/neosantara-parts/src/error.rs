//! Error types for neosantara-parts

use thiserror::Error;

/// Result type alias using neosantara-parts Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when reading exchange input.
///
/// Reconciliation itself never fails; these only cover decoding.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input decoded, but is not a list of turns
    #[error("Invalid turns: {0}")]
    InvalidTurns(String),
}
