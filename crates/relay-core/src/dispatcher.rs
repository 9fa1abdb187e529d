//! Update dispatch: filter inbound updates and drive the relay pipeline.

use std::sync::Arc;

use tracing::{debug, info};

use crate::pipeline::{RelayPipeline, RelayReport};
use crate::ports::UpdateDeduplicator;
use crate::update::{IgnoreReason, Update};

/// Result of dispatching one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Acknowledged without any downstream call.
    Ignored(IgnoreReason),
    /// The update id was already processed inside the de-duplication window.
    Duplicate,
    /// The message was relayed.
    Relayed(RelayReport),
}

/// Entry point for updates from any transport.
///
/// Dispatch never fails; the caller acknowledges every update it hands over.
pub struct UpdateDispatcher {
    pipeline: Arc<RelayPipeline>,
    dedup: Option<Arc<dyn UpdateDeduplicator>>,
}

impl UpdateDispatcher {
    /// Create a dispatcher without de-duplication.
    pub fn new(pipeline: Arc<RelayPipeline>) -> Self {
        Self {
            pipeline,
            dedup: None,
        }
    }

    /// Skip updates whose id was already seen by `dedup`.
    pub fn with_deduplicator(mut self, dedup: Arc<dyn UpdateDeduplicator>) -> Self {
        self.dedup = Some(dedup);
        self
    }

    /// The pipeline updates are handed to.
    pub fn pipeline(&self) -> &Arc<RelayPipeline> {
        &self.pipeline
    }

    /// Dispatch one update.
    ///
    /// The update id is claimed before the relay starts, so concurrent
    /// redeliveries are skipped. Callers that can be cancelled must run this
    /// to completion on a task of its own, or a dropped relay loses the message.
    pub async fn dispatch(&self, update: &Update) -> DispatchOutcome {
        let (chat_id, text) = match update.text_message() {
            Ok(pair) => pair,
            Err(reason) => {
                debug!(update_id = ?update.update_id, ?reason, "Ignoring update");
                return DispatchOutcome::Ignored(reason);
            }
        };

        if let (Some(dedup), Some(update_id)) = (&self.dedup, update.update_id) {
            if dedup.is_duplicate(update_id).await {
                info!(update_id, chat_id, "Skipping redelivered update");
                return DispatchOutcome::Duplicate;
            }
        }

        debug!(update_id = ?update.update_id, chat_id, "Dispatching text message");
        self.dispatch_text(chat_id, text).await
    }

    /// Relay a text message that has already been extracted from an update.
    pub async fn dispatch_text(&self, chat_id: i64, text: &str) -> DispatchOutcome {
        DispatchOutcome::Relayed(self.pipeline.relay(chat_id, text).await)
    }
}
