//! Router configuration and server setup.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::{debug_span, info, Span};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        // Administration
        .route("/set_webhook", get(handlers::set_webhook));

    // Telegram delivery
    let router = if state.config.webhook_token.is_some() {
        router.route("/webhook/:token", post(handlers::webhook_with_token))
    } else {
        router.route("/webhook", post(handlers::webhook))
    };

    router.layer(trace_layer()).with_state(state)
}

/// HTTP tracing that records the route template instead of the URI.
///
/// The webhook path carries the bot token, so `uri` must never reach a span.
fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, fn(&Request<Body>) -> Span>
{
    TraceLayer::new_for_http().make_span_with(request_span as fn(&Request<Body>) -> Span)
}

fn request_span(request: &Request<Body>) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("<unmatched>");
    debug_span!("request", method = %request.method(), route)
}

/// Starts the API server and runs until Ctrl+C.
pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
