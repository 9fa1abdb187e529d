//! Administrative handlers.

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{error, info};

use crate::error::Result;
use crate::state::AppState;
use crate::types::SetWebhookResponse;

/// GET /set_webhook - Re-run webhook registration.
pub async fn set_webhook(State(state): State<AppState>) -> Result<Json<SetWebhookResponse>> {
    info!("Webhook re-registration requested");
    let report = state.registrar.register().await.map_err(|e| {
        error!(error = %e, "Webhook re-registration failed");
        e
    })?;

    Ok(Json(SetWebhookResponse {
        ok: true,
        report,
        registered_at: Utc::now(),
    }))
}
