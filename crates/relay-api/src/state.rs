//! Application state shared across handlers.

use std::sync::Arc;

use relay_core::UpdateDispatcher;
use relay_telegram::WebhookRegistrar;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Entry point for parsed updates.
    pub dispatcher: Arc<UpdateDispatcher>,
    /// Webhook registration, also used to query webhook status.
    pub registrar: Arc<WebhookRegistrar>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(
        config: ApiConfig,
        dispatcher: Arc<UpdateDispatcher>,
        registrar: Arc<WebhookRegistrar>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
            registrar,
        }
    }

    /// Mask the webhook token in `text`.
    pub fn redact(&self, text: &str) -> String {
        match &self.config.webhook_token {
            Some(token) => relay_core::config::redact_token(text, token),
            None => text.to_string(),
        }
    }
}
