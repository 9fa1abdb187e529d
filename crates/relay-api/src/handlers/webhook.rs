//! Telegram update delivery.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use relay_core::{DispatchOutcome, Update};
use tracing::{debug, error, warn};

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::AckResponse;

/// POST /webhook/:token - Token-checked update delivery.
///
/// The token is checked before the body is looked at.
pub async fn webhook_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Json<AckResponse>> {
    if state.config.webhook_token.as_deref() != Some(token.as_str()) {
        warn!("Rejected webhook request with wrong path token");
        return Err(ApiError::Unauthorized);
    }
    handle_update(&state, &body).await
}

/// POST /webhook - Update delivery without a path token.
pub async fn webhook(State(state): State<AppState>, body: Bytes) -> Result<Json<AckResponse>> {
    handle_update(&state, &body).await
}

/// Parse and dispatch one update.
///
/// Every well-formed update is acknowledged with 200, whatever happens
/// downstream; anything else makes Telegram redeliver it.
///
/// Dispatch runs on its own task: the update id is recorded as seen before
/// the relay starts, so the relay must finish even if the request is dropped.
async fn handle_update(state: &AppState, body: &[u8]) -> Result<Json<AckResponse>> {
    let update: Update = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Received malformed update");
        ApiError::BadRequest(format!("invalid update payload: {}", e))
    })?;

    let update_id = update.update_id;
    let dispatcher = Arc::clone(&state.dispatcher);
    let task = tokio::spawn(async move { dispatcher.dispatch(&update).await });

    match task.await {
        Ok(DispatchOutcome::Relayed(report)) if !report.delivered => {
            warn!(chat_id = report.chat_id, "Reply was not delivered");
        }
        Ok(outcome) => debug!(?update_id, ?outcome, "Update handled"),
        Err(e) => error!(?update_id, error = %e, "Update dispatch task failed"),
    }

    Ok(Json(AckResponse::ok()))
}
