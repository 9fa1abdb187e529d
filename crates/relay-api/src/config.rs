//! API configuration.

use std::fmt;
use std::time::Instant;

use relay_core::RelayConfig;

/// HTTP server configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Token the webhook path must carry. `None` serves a bare `/webhook`.
    pub webhook_token: Option<String>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl ApiConfig {
    /// Creates a configuration with the given host and port and a bare webhook path.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            webhook_token: None,
            start_time: Instant::now(),
        }
    }

    /// Require `token` as the final webhook path segment.
    pub fn with_webhook_token(mut self, token: impl Into<String>) -> Self {
        self.webhook_token = Some(token.into());
        self
    }

    /// Derive the HTTP settings from the relay configuration.
    pub fn from_relay_config(config: &RelayConfig) -> Self {
        let api = Self::new(config.host.clone(), config.port);
        if config.webhook_path_token {
            api.with_webhook_token(config.telegram_token.clone())
        } else {
            api
        }
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", 5000)
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_token", &self.webhook_token.as_ref().map(|_| "***"))
            .finish()
    }
}
