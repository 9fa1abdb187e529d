//! Error types for provider construction.

use thiserror::Error;

/// Errors raised while building a completion provider.
///
/// Failures of individual completion calls are reported as
/// [`relay_core::CompletionError`] instead.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Result type for provider construction.
pub type Result<T> = std::result::Result<T, LlmError>;

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Client(e.to_string())
    }
}
