//! Response DTOs for the API.

use chrono::{DateTime, Utc};
use relay_telegram::{RegistrationReport, WebhookStatus};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Current webhook state, when Telegram could be reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookStatus>,
    /// Why the webhook state could not be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_error: Option<String>,
}

/// Acknowledgment returned for every accepted update.
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    /// Always true.
    pub ok: bool,
}

impl AckResponse {
    /// The acknowledgment body.
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Result of an on-demand webhook registration.
#[derive(Debug, Clone, Serialize)]
pub struct SetWebhookResponse {
    /// Always true on success.
    pub ok: bool,
    /// Registration details.
    #[serde(flatten)]
    pub report: RegistrationReport,
    /// When the registration completed.
    pub registered_at: DateTime<Utc>,
}
