//! Stateless chat completions client.

use async_trait::async_trait;
use relay_core::{
    CompletionError, CompletionProvider, CompletionRequest, CompletionResult, ModelConfig,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::http::ProviderHttp;

/// Client for `POST {base}/chat/completions`.
///
/// Every call sends `[system?, user]` and nothing else, so conversations do
/// not carry context between messages.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: ProviderHttp,
    config: ModelConfig,
}

impl ChatCompletionsClient {
    /// Create a client for `config` authenticated with `api_key`.
    pub fn new(config: ModelConfig, api_key: &str) -> Result<Self> {
        let http = ProviderHttp::new(&config.base_url, api_key, config.timeout)?;
        Ok(Self { http, config })
    }

    fn build_request<'a>(&'a self, input: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = self.config.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: input,
        });

        ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionsClient {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn supports_continuation(&self) -> bool {
        false
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResult, CompletionError> {
        let body = self.build_request(&request.input);
        let response: ChatResponse = self.http.post_json("/chat/completions", &body).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::EmptyReply)?;

        debug!(
            model = %self.config.model,
            total_tokens = response.usage.map_or(0, |u| u.total_tokens),
            "Chat completion received"
        );

        Ok(CompletionResult {
            text,
            response_id: None,
        })
    }
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// A role-tagged message.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}
