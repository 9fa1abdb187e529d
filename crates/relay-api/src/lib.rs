//! HTTP surface for GPT Relay.
//!
//! Routes:
//! - `GET /`, `GET /health`: liveness plus the current webhook state
//! - `GET /set_webhook`: re-run webhook registration
//! - `POST /webhook/:token` (or `POST /webhook`): Telegram update delivery
//!
//! # Example
//!
//! ```ignore
//! use relay_api::{serve, ApiConfig, AppState};
//!
//! let state = AppState::new(ApiConfig::new("0.0.0.0", 5000), dispatcher, registrar);
//! serve(state).await?;
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve};
pub use state::AppState;
