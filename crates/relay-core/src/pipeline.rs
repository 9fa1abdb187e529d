//! The relay pipeline: state lookup, completion, state update, reply.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{RelayConfig, DEFAULT_APOLOGY_MESSAGE};
use crate::error::CompletionError;
use crate::ports::{ChatSender, CompletionProvider, CompletionRequest, ConversationStore};

/// Default upper bound on a single completion call.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened while relaying one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Chat the message came from.
    pub chat_id: i64,
    /// Text that was (or was attempted to be) sent back.
    pub reply: String,
    /// Whether a stored continuation token was passed to the provider.
    pub continued: bool,
    /// Whether the completion failed and the apology was substituted.
    pub completion_failed: bool,
    /// Whether the reply reached the chat API successfully.
    pub delivered: bool,
}

/// Orchestrates one relay per inbound text message.
///
/// Failures never escape: a completion failure becomes the apology reply and a
/// send failure is only logged. Neither is retried.
pub struct RelayPipeline {
    provider: Arc<dyn CompletionProvider>,
    sender: Arc<dyn ChatSender>,
    store: Arc<dyn ConversationStore>,
    apology_message: String,
    completion_timeout: Duration,
}

impl RelayPipeline {
    /// Create a pipeline with the default apology message and timeout.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        sender: Arc<dyn ChatSender>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            provider,
            sender,
            store,
            apology_message: DEFAULT_APOLOGY_MESSAGE.to_string(),
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    /// Create a pipeline using the apology message and timeout from `config`.
    pub fn from_config(
        config: &RelayConfig,
        provider: Arc<dyn CompletionProvider>,
        sender: Arc<dyn ChatSender>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self::new(provider, sender, store)
            .with_apology_message(config.apology_message.clone())
            .with_completion_timeout(config.model.timeout)
    }

    /// Set the reply sent when the completion call fails.
    pub fn with_apology_message(mut self, message: impl Into<String>) -> Self {
        self.apology_message = message.into();
        self
    }

    /// Set the upper bound on a single completion call.
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// The reply used when the completion call fails.
    pub fn apology_message(&self) -> &str {
        &self.apology_message
    }

    /// The conversation store backing this pipeline.
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Relay `text` from `chat_id` to the provider and send the reply back.
    pub async fn relay(&self, chat_id: i64, text: &str) -> RelayReport {
        let continuation = self.provider.supports_continuation();
        let previous = if continuation {
            self.store.get(chat_id).await
        } else {
            None
        };
        let continued = previous.is_some();

        debug!(
            chat_id,
            provider = self.provider.name(),
            continued,
            "Requesting completion"
        );

        let request = CompletionRequest::new(text).with_previous_response(previous);
        let (reply, completion_failed) = match self.complete(request).await {
            Ok(result) => {
                if continuation {
                    if let Some(id) = result.response_id {
                        self.store.put(chat_id, id).await;
                    }
                }
                (result.text, false)
            }
            Err(e) => {
                error!(
                    chat_id,
                    provider = self.provider.name(),
                    error = %e,
                    "Completion failed, sending apology"
                );
                (self.apology_message.clone(), true)
            }
        };

        let delivered = match self.sender.send_text(chat_id, &reply).await {
            Ok(()) => {
                info!(chat_id, chars = reply.chars().count(), "Reply sent");
                true
            }
            Err(e) => {
                warn!(chat_id, error = %e, "Failed to send reply");
                false
            }
        };

        RelayReport {
            chat_id,
            reply,
            continued,
            completion_failed,
            delivered,
        }
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<crate::ports::CompletionResult, CompletionError> {
        match tokio::time::timeout(self.completion_timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.completion_timeout)),
        }
    }
}
