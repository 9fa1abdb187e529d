//! Error types shared across the relay.

use std::time::Duration;

use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is missing or empty.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// A value is present but could not be interpreted.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Configuration key (environment variable name).
        key: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The YAML config file could not be read or parsed.
    #[error("config file error: {0}")]
    File(String),
}

/// Errors returned by a completion provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The call did not finish within the configured timeout.
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure (connect, TLS, body read).
    #[error("completion request failed: {0}")]
    Http(String),

    /// The provider answered with a non-success status.
    #[error("completion API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the provider.
        body: String,
    },

    /// The provider's response did not have the expected shape.
    #[error("failed to parse completion response: {0}")]
    ResponseParse(String),

    /// The provider returned no reply text.
    #[error("completion response contained no text")]
    EmptyReply,
}

/// Errors returned when sending a reply to a chat.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The chat platform rejected or failed the request.
    #[error("chat API error: {0}")]
    Api(String),

    /// The reply had nothing to send.
    #[error("refusing to send an empty message to chat {0}")]
    EmptyMessage(i64),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Missing("TELEGRAM_TOKEN");
        assert_eq!(
            err.to_string(),
            "missing required configuration: TELEGRAM_TOKEN"
        );

        let err = ConfigError::Invalid {
            key: "PORT",
            message: "not a number".into(),
        };
        assert_eq!(err.to_string(), "invalid value for PORT: not a number");
    }

    #[test]
    fn test_completion_error_display() {
        let err = CompletionError::Api {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "completion API error 429: rate limited");

        let err = CompletionError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "completion timed out after 10s");
    }
}
