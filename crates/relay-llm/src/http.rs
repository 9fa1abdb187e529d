//! Shared HTTP plumbing for provider clients.

use std::time::Duration;

use relay_core::CompletionError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::error::Result;

/// Authenticated JSON client for one provider base URL.
#[derive(Clone)]
pub(crate) struct ProviderHttp {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ProviderHttp {
    pub(crate) fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    /// POST `body` to `{base_url}{path}` and decode the JSON answer.
    pub(crate) async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<T, CompletionError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        trace!(url = %url, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| CompletionError::ResponseParse(e.to_string()))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout(self.timeout)
        } else {
            CompletionError::Http(e.to_string())
        }
    }
}
