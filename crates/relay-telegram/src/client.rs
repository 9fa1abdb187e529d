//! Telegram Bot API client.

use async_trait::async_trait;
use relay_core::{ChatSender, DeliveryError};
use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::chunking::split_message;
use crate::error::Result;
use crate::registrar::{WebhookApi, WebhookStatus};

/// Thin wrapper over [`teloxide::Bot`] exposing the calls the relay makes.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    /// Create a client for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Wrap an existing bot.
    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }

    /// The underlying bot (used by the polling transport).
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self.bot.get_me().await?;
        Ok(me.username().to_string())
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> std::result::Result<(), DeliveryError> {
        if text.trim().is_empty() {
            return Err(DeliveryError::EmptyMessage(chat_id));
        }

        let chunks = split_message(text);
        let total = chunks.len();
        for (index, chunk) in chunks.into_iter().enumerate() {
            if let Err(e) = self.bot.send_message(ChatId(chat_id), chunk).await {
                if index > 0 {
                    warn!(chat_id, sent = index, total, "Reply delivery stopped part-way");
                }
                return Err(DeliveryError::Api(e.to_string()));
            }
        }

        debug!(chat_id, parts = total, "Message delivered");
        Ok(())
    }
}

#[async_trait]
impl WebhookApi for TelegramClient {
    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        self.bot
            .delete_webhook()
            .drop_pending_updates(drop_pending_updates)
            .await?;
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> Result<()> {
        let url = url::Url::parse(url)?;
        self.bot.set_webhook(url).await?;
        Ok(())
    }

    async fn webhook_info(&self) -> Result<WebhookStatus> {
        let info = self.bot.get_webhook_info().await?;
        Ok(WebhookStatus {
            url: info.url.map(|u| u.to_string()),
            pending_update_count: info.pending_update_count,
            last_error_message: info.last_error_message,
        })
    }
}
