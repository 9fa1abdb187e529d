//! Long-polling transport, used when no public webhook URL is available.

use std::sync::Arc;

use relay_core::UpdateDispatcher;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

use crate::client::TelegramClient;
use crate::error::Result;
use crate::registrar::WebhookApi;

/// Receive updates by long polling until Ctrl+C.
///
/// Any registered webhook is removed first; Telegram refuses `getUpdates`
/// while one is set.
pub async fn run_polling(client: TelegramClient, dispatcher: Arc<UpdateDispatcher>) -> Result<()> {
    client.delete_webhook(false).await?;

    match client.get_me().await {
        Ok(username) => info!(username = %username, "Starting long polling"),
        Err(e) => warn!(error = %e, "Could not fetch bot identity"),
    }

    let for_messages = Arc::clone(&dispatcher);
    let for_edits = Arc::clone(&dispatcher);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(move |msg: Message| {
            let dispatcher = Arc::clone(&for_messages);
            async move { relay_message(&dispatcher, &msg).await }
        }))
        .branch(
            Update::filter_edited_message().endpoint(move |msg: Message| {
                let dispatcher = Arc::clone(&for_edits);
                async move { relay_message(&dispatcher, &msg).await }
            }),
        );

    Dispatcher::builder(client.bot().clone(), handler)
        .default_handler(|upd| async move {
            debug!(update_id = ?upd.id, "Ignoring update without a message");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Polling stopped");
    Ok(())
}

async fn relay_message(dispatcher: &UpdateDispatcher, msg: &Message) -> ResponseResult<()> {
    match msg.text() {
        Some(text) => {
            dispatcher.dispatch_text(msg.chat.id.0, text).await;
        }
        None => debug!(chat_id = msg.chat.id.0, "Ignoring message without text"),
    }
    Ok(())
}
