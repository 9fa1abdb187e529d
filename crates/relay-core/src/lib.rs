//! GPT Relay Core - the relay pipeline shared by every transport.
//!
//! - **config**: Environment and YAML configuration
//! - **dedup**: Update de-duplication for redelivered webhooks
//! - **dispatcher**: Filters inbound updates and drives the pipeline
//! - **pipeline**: Completion call, conversation state, reply delivery
//! - **ports**: Capability traits for providers, senders and stores
//! - **store**: In-memory conversation state
//! - **update**: Inbound update payloads
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use relay_core::{InMemoryConversationStore, RelayPipeline, Update, UpdateDispatcher};
//!
//! let pipeline = Arc::new(RelayPipeline::new(provider, sender, Arc::new(store)));
//! let dispatcher = UpdateDispatcher::new(pipeline);
//! dispatcher.dispatch(&Update::with_text(1, 42, "hello")).await;
//! ```

pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod update;

pub use config::{CompletionApi, FileConfig, ModelConfig, RelayConfig, Transport};
pub use dedup::MemoryUpdateDeduplicator;
pub use dispatcher::{DispatchOutcome, UpdateDispatcher};
pub use error::{CompletionError, ConfigError, DeliveryError};
pub use pipeline::{RelayPipeline, RelayReport};
pub use ports::{
    ChatSender, CompletionProvider, CompletionRequest, CompletionResult, ConversationStore,
    UpdateDeduplicator,
};
pub use store::InMemoryConversationStore;
pub use update::{IgnoreReason, IncomingMessage, Update};
