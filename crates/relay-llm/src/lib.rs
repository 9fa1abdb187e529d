//! Completion provider clients for GPT Relay.
//!
//! Two API shapes are supported, selected by `COMPLETION_API`:
//!
//! - [`ResponsesClient`]: continuation-aware; each reply carries a response id
//!   that the next message in the chat passes back as `previous_response_id`
//! - [`ChatCompletionsClient`]: stateless single-turn chat completions
//!
//! Both speak the OpenAI wire format, so any compatible base URL works.

pub mod chat;
pub mod error;
mod http;
pub mod responses;

use std::sync::Arc;

use relay_core::{CompletionApi, CompletionProvider, ModelConfig};
use tracing::info;

pub use chat::ChatCompletionsClient;
pub use error::{LlmError, Result};
pub use responses::ResponsesClient;

/// Build the provider selected by `config.api`.
pub fn build_provider(config: &ModelConfig, api_key: &str) -> Result<Arc<dyn CompletionProvider>> {
    info!(
        api = %config.api,
        model = %config.model,
        base_url = %config.base_url,
        "Using completion provider"
    );

    let provider: Arc<dyn CompletionProvider> = match config.api {
        CompletionApi::Responses => Arc::new(ResponsesClient::new(config.clone(), api_key)?),
        CompletionApi::Chat => Arc::new(ChatCompletionsClient::new(config.clone(), api_key)?),
    };
    Ok(provider)
}
