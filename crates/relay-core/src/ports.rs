//! Capability traits the relay pipeline is built on.
//!
//! Concrete implementations live in other crates (`relay-llm`, `relay-telegram`)
//! or in [`crate::store`] and [`crate::dedup`]; tests substitute mocks.

use async_trait::async_trait;

use crate::error::{CompletionError, DeliveryError};

/// Input to a single completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// The user's message text.
    pub input: String,
    /// Identifier of the previous response in this conversation, if any.
    pub previous_response_id: Option<String>,
}

impl CompletionRequest {
    /// A request with no conversation context.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            previous_response_id: None,
        }
    }

    /// Attach a continuation token.
    pub fn with_previous_response(mut self, id: Option<String>) -> Self {
        self.previous_response_id = id;
        self
    }
}

/// Output of a successful completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    /// Generated reply text.
    pub text: String,
    /// Token to pass as `previous_response_id` on the next call, when the provider issues one.
    pub response_id: Option<String>,
}

/// A large-language-model completion provider.
///
/// Model name and system prompt are fixed when the provider is constructed.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Whether this provider accepts and issues continuation tokens.
    fn supports_continuation(&self) -> bool;

    /// Run one completion.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResult, CompletionError>;
}

/// Sends text replies to a chat.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send `text` to `chat_id`.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Maps a chat to the continuation token of its last completion.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Token for `chat_id`, if one is stored and still live.
    async fn get(&self, chat_id: i64) -> Option<String>;

    /// Store (or overwrite) the token for `chat_id`.
    async fn put(&self, chat_id: i64, token: String);

    /// Number of chats currently tracked.
    async fn len(&self) -> usize;

    /// Whether no chats are tracked.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// At-most-once processing of platform update identifiers.
#[async_trait]
pub trait UpdateDeduplicator: Send + Sync {
    /// Returns `true` when `update_id` has already been seen inside the window.
    /// The first call for an id records it and returns `false`.
    async fn is_duplicate(&self, update_id: i64) -> bool;
}
