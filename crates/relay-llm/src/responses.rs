//! Continuation-aware responses client.

use async_trait::async_trait;
use relay_core::{
    CompletionError, CompletionProvider, CompletionRequest, CompletionResult, ModelConfig,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::http::ProviderHttp;

/// Client for `POST {base}/responses`.
///
/// The provider keeps the conversation server-side; passing the previous
/// response id as `previous_response_id` continues it.
#[derive(Clone)]
pub struct ResponsesClient {
    http: ProviderHttp,
    config: ModelConfig,
}

impl ResponsesClient {
    /// Create a client for `config` authenticated with `api_key`.
    pub fn new(config: ModelConfig, api_key: &str) -> Result<Self> {
        let http = ProviderHttp::new(&config.base_url, api_key, config.timeout)?;
        Ok(Self { http, config })
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ResponsesRequest<'a> {
        ResponsesRequest {
            model: &self.config.model,
            input: &request.input,
            instructions: self.config.system_prompt.as_deref(),
            previous_response_id: request.previous_response_id.as_deref(),
            max_output_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl CompletionProvider for ResponsesClient {
    fn name(&self) -> &str {
        "responses"
    }

    fn supports_continuation(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResult, CompletionError> {
        let body = self.build_request(&request);
        let response: ResponsesResponse = self.http.post_json("/responses", &body).await?;

        if let Some(error) = response.error.as_ref() {
            return Err(CompletionError::Api {
                status: 200,
                body: error.to_string(),
            });
        }

        let text = response.reply_text();
        if text.is_empty() {
            return Err(CompletionError::EmptyReply);
        }

        debug!(
            model = %self.config.model,
            response_id = %response.id,
            continued = request.previous_response_id.is_some(),
            "Response received"
        );

        Ok(CompletionResult {
            text,
            response_id: Some(response.id),
        })
    }
}

/// Responses request body.
#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    id: String,
    #[serde(default)]
    output: Vec<OutputItem>,
    /// Convenience aggregate some providers include.
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    fn reply_text(&self) -> String {
        if let Some(text) = self.output_text.as_deref() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }

        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string()
    }
}
