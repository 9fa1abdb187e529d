//! Test doubles for the capability traits.
//!
//! Compiled for this crate's tests and, through the `testing` feature, for
//! the HTTP tests in `relay-api`.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{CompletionError, DeliveryError};
use crate::ports::{ChatSender, CompletionProvider, CompletionRequest, CompletionResult};

/// Scripted completion provider that records every request.
///
/// Replies are served from a queue; once the queue is empty the provider
/// answers `echo: <input>` with a generated response id.
pub struct MockCompletionProvider {
    continuation: bool,
    delay: Option<Duration>,
    script: Mutex<VecDeque<Result<CompletionResult, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionProvider {
    /// A provider that issues and accepts continuation tokens.
    pub fn continuation() -> Self {
        Self {
            continuation: true,
            delay: None,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A single-turn provider.
    pub fn stateless() -> Self {
        Self {
            continuation: false,
            ..Self::continuation()
        }
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful reply.
    pub async fn push_reply(&self, text: &str, response_id: Option<&str>) {
        self.script.lock().await.push_back(Ok(CompletionResult {
            text: text.to_string(),
            response_id: response_id.map(str::to_string),
        }));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: CompletionError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of calls received so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn supports_continuation(&self) -> bool {
        self.continuation
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResult, CompletionError> {
        let call_number = {
            let mut requests = self.requests.lock().await;
            requests.push(request.clone());
            requests.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.script.lock().await.pop_front() {
            Some(scripted) => scripted,
            None => Ok(CompletionResult {
                text: format!("echo: {}", request.input),
                response_id: Some(format!("resp-{}", call_number)),
            }),
        }
    }
}

/// Chat sender that records messages instead of sending them.
pub struct MockChatSender {
    fail: bool,
    sent: Mutex<Vec<(i64, String)>>,
}

impl MockChatSender {
    /// A sender that always succeeds.
    pub fn new() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A sender that records the attempt and then fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent (or attempted) so far, in order.
    pub async fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().await.clone()
    }
}

impl Default for MockChatSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSender for MockChatSender {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().await.push((chat_id, text.to_string()));
        if self.fail {
            return Err(DeliveryError::Api("chat not found".to_string()));
        }
        Ok(())
    }
}
