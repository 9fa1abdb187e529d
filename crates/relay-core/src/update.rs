//! Inbound update payloads.
//!
//! Only the parts of a Telegram update the relay consumes are modelled. Unknown
//! fields are ignored so new update kinds deserialize cleanly and are skipped
//! by the dispatcher.

use serde::{Deserialize, Serialize};

/// One update delivered by the messaging platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Platform-assigned update identifier, used for de-duplication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_id: Option<i64>,

    /// A new incoming message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<IncomingMessage>,

    /// A new version of a message that was edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<IncomingMessage>,
}

/// A message inside an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Chat the message belongs to.
    pub chat: Chat,

    /// Text of the message. Absent for photos, stickers and other media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Chat reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique chat identifier.
    pub id: i64,
}

/// Why an update was acknowledged without relaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Neither `message` nor `edited_message` was present.
    NoMessage,
    /// The message carried no text.
    NoText,
}

impl IncomingMessage {
    /// Build a text message for `chat_id`.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat: Chat { id: chat_id },
            text: Some(text.into()),
        }
    }
}

impl Update {
    /// An update wrapping a new text message.
    pub fn with_text(update_id: i64, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            update_id: Some(update_id),
            message: Some(IncomingMessage::text(chat_id, text)),
            edited_message: None,
        }
    }

    /// The message carried by this update, new messages taking precedence over edits.
    pub fn message(&self) -> Option<&IncomingMessage> {
        self.message.as_ref().or(self.edited_message.as_ref())
    }

    /// Extract `(chat_id, text)` or the reason the update should be skipped.
    pub fn text_message(&self) -> Result<(i64, &str), IgnoreReason> {
        let message = self.message().ok_or(IgnoreReason::NoMessage)?;
        let text = message.text.as_deref().ok_or(IgnoreReason::NoText)?;
        Ok((message.chat.id, text))
    }
}
