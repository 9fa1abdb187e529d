//! Telegram side of GPT Relay.
//!
//! Provides the Bot API client used to deliver replies, webhook registration,
//! and a long-polling transport for deployments without a public URL.

pub mod chunking;
pub mod client;
pub mod error;
pub mod polling;
pub mod registrar;

pub use chunking::{split_message, TELEGRAM_MAX_MESSAGE_LENGTH};
pub use client::TelegramClient;
pub use error::{Result, TelegramError};
pub use polling::run_polling;
pub use registrar::{
    spawn_startup_registration, RegistrationReport, WebhookApi, WebhookRegistrar, WebhookStatus,
};
