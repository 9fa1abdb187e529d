//! Error types for the Telegram side of the relay.

use thiserror::Error;

/// Errors that can occur talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// A Bot API request failed.
    #[error("Telegram request failed: {0}")]
    Request(String),

    /// The webhook URL could not be parsed.
    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    /// Webhook registration failed.
    #[error("Failed to register webhook: {0}")]
    WebhookFailed(String),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<teloxide::RequestError> for TelegramError {
    fn from(e: teloxide::RequestError) -> Self {
        TelegramError::Request(e.to_string())
    }
}

impl From<url::ParseError> for TelegramError {
    fn from(e: url::ParseError) -> Self {
        TelegramError::InvalidUrl(e.to_string())
    }
}
