//! Webhook registration.
//!
//! On startup (and on demand via the admin endpoint) the relay deletes any
//! existing webhook, dropping pending updates, and then registers its own
//! public endpoint. Registration is best-effort: failures are logged and the
//! service keeps serving.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::config::redact_token;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{Result, TelegramError};

/// Current webhook state as reported by Telegram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookStatus {
    /// Registered URL, if any.
    pub url: Option<String>,
    /// Updates waiting to be delivered.
    pub pending_update_count: u32,
    /// Last delivery error reported by Telegram.
    pub last_error_message: Option<String>,
}

/// Webhook management calls on the chat platform.
#[async_trait]
pub trait WebhookApi: Send + Sync {
    /// Remove the current webhook.
    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()>;

    /// Register `url` as the webhook.
    async fn set_webhook(&self, url: &str) -> Result<()>;

    /// Fetch the current webhook state.
    async fn webhook_info(&self) -> Result<WebhookStatus>;
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    /// Registered URL with the bot token masked.
    pub webhook_url: String,
    /// Whether the previous webhook was deleted.
    pub previous_deleted: bool,
    /// Why deleting the previous webhook failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_error: Option<String>,
}

/// Idempotent delete-then-set webhook registration.
pub struct WebhookRegistrar {
    api: Arc<dyn WebhookApi>,
    webhook_url: String,
    secret: String,
}

impl WebhookRegistrar {
    /// Register `webhook_url` through `api`.
    pub fn new(api: Arc<dyn WebhookApi>, webhook_url: impl Into<String>) -> Self {
        Self {
            api,
            webhook_url: webhook_url.into(),
            secret: String::new(),
        }
    }

    /// Mask `secret` wherever the URL is logged or reported.
    pub fn with_redacted_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// The URL this registrar registers.
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// The platform API this registrar talks to.
    pub fn api(&self) -> &Arc<dyn WebhookApi> {
        &self.api
    }

    fn display_url(&self) -> String {
        redact_token(&self.webhook_url, &self.secret)
    }

    /// Delete the existing webhook (dropping pending updates), then set ours.
    ///
    /// A failed delete is logged and does not stop the set; a failed set is an error.
    pub async fn register(&self) -> Result<RegistrationReport> {
        let display_url = self.display_url();

        let delete_error = match self.api.delete_webhook(true).await {
            Ok(()) => {
                info!("Previous webhook removed, pending updates dropped");
                None
            }
            Err(e) => {
                let message = redact_token(&e.to_string(), &self.secret);
                warn!(error = %message, "Failed to remove previous webhook");
                Some(message)
            }
        };

        info!(url = %display_url, "Setting webhook");
        self.api
            .set_webhook(&self.webhook_url)
            .await
            .map_err(|e| TelegramError::WebhookFailed(redact_token(&e.to_string(), &self.secret)))?;
        info!(url = %display_url, "Webhook set successfully");

        Ok(RegistrationReport {
            webhook_url: display_url,
            previous_deleted: delete_error.is_none(),
            delete_error,
        })
    }
}

/// Run registration once in the background. Failures are logged only.
pub fn spawn_startup_registration(registrar: Arc<WebhookRegistrar>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = registrar.register().await {
            error!(
                error = %e,
                "Webhook registration failed; retry with GET /set_webhook"
            );
        }
    })
}
