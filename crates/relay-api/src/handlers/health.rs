//! Health check handler.

use axum::{extract::State, Json};
use relay_telegram::WebhookStatus;
use tracing::warn;

use crate::state::AppState;
use crate::types::HealthResponse;

/// GET / and GET /health - liveness plus the webhook state Telegram reports.
///
/// A failed `getWebhookInfo` is reported in the body; the probe itself still succeeds.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (webhook, webhook_error) = match state.registrar.api().webhook_info().await {
        Ok(info) => {
            // The registered URL embeds the bot token in path-token mode.
            let info = WebhookStatus {
                url: info.url.map(|url| state.redact(&url)),
                last_error_message: info.last_error_message.map(|msg| state.redact(&msg)),
                ..info
            };
            (Some(info), None)
        }
        Err(e) => {
            let message = state.redact(&e.to_string());
            warn!(error = %message, "Failed to fetch webhook info");
            (None, Some(message))
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.config.uptime_seconds(),
        webhook,
        webhook_error,
    })
}
