//! Relay configuration.
//!
//! Values are resolved from three layers, highest precedence first:
//!
//! 1. Environment variables (after `.env` files have been loaded by the binary)
//! 2. An optional YAML file (`config.yaml` or the path given by `RELAY_CONFIG`)
//! 3. Built-in defaults
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_TOKEN` (or `TELEGRAM_BOT_TOKEN`): Bot token from @BotFather
//! - `OPENAI_API_KEY`: Completion provider API key
//! - `WEBHOOK_URL` (or `APP_URL`): Public base URL, webhook transport only
//!
//! Optional:
//! - `HOST` / `PORT`: Listen address (default: 0.0.0.0:5000)
//! - `OPENAI_MODEL`: Model name (default: gpt-4o-mini)
//! - `SYSTEM_PROMPT`: Fixed system prompt
//! - `OPENAI_BASE_URL`: Provider base URL (default: https://api.openai.com/v1)
//! - `COMPLETION_API`: `responses` or `chat` (default: responses)
//! - `COMPLETION_TIMEOUT_SECS`: Per-call timeout (default: 10)
//! - `OPENAI_MAX_TOKENS` / `OPENAI_TEMPERATURE`: Sampling limits
//! - `APOLOGY_MESSAGE`: Reply sent when the completion call fails
//! - `WEBHOOK_PATH_TOKEN`: Embed the bot token in the webhook path (default: true)
//! - `RELAY_TRANSPORT`: `webhook` or `polling` (default: webhook)
//! - `CONVERSATION_CAPACITY` / `CONVERSATION_TTL_SECS`: State store bounds
//! - `DEDUP_TTL_SECS`: Update de-duplication window, 0 disables (default: 600)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Default YAML config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default provider base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Reply sent to the chat when the completion call fails.
pub const DEFAULT_APOLOGY_MESSAGE: &str = "Sorry, something went wrong.";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONVERSATION_CAPACITY: usize = 10_000;
const DEFAULT_CONVERSATION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_DEDUP_TTL_SECS: u64 = 600;

/// Which completion API shape to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionApi {
    /// Stateless chat completions (`/chat/completions`).
    Chat,
    /// Continuation-aware responses (`/responses` with `previous_response_id`).
    #[default]
    Responses,
}

impl FromStr for CompletionApi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" | "chat_completions" | "chat-completions" => Ok(Self::Chat),
            "responses" | "response" => Ok(Self::Responses),
            other => Err(format!("expected 'chat' or 'responses', got '{}'", other)),
        }
    }
}

impl fmt::Display for CompletionApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Responses => write!(f, "responses"),
        }
    }
}

/// How updates reach the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Telegram pushes updates to our HTTP endpoint.
    #[default]
    Webhook,
    /// We long-poll `getUpdates`.
    Polling,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(Self::Webhook),
            "polling" | "poll" => Ok(Self::Polling),
            other => Err(format!("expected 'webhook' or 'polling', got '{}'", other)),
        }
    }
}

/// Optional YAML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Telegram section.
    pub telegram: TelegramSection,
    /// Provider section.
    pub openai: OpenAiSection,
    /// Fixed system prompt.
    pub system_prompt: Option<String>,
}

/// `telegram:` section of the YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Public base URL for webhook registration.
    pub webhook_url: Option<String>,
}

/// `openai:` section of the YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenAiSection {
    /// Model name.
    pub model: Option<String>,
    /// Provider base URL.
    pub base_url: Option<String>,
}

impl FileConfig {
    /// Load a YAML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))
    }

    /// Load the given file, or `config.yaml` in the working directory if it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default file is not.
    pub fn discover(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            debug!(path = %default_path.display(), "Loading config file");
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Completion provider settings. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// API shape to use.
    pub api: CompletionApi,
    /// Provider base URL without trailing slash.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api: CompletionApi::default(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
        }
    }
}

/// Complete relay configuration.
#[derive(Clone)]
pub struct RelayConfig {
    /// Telegram bot token.
    pub telegram_token: String,
    /// Completion provider API key.
    pub openai_api_key: String,
    /// Public base URL (no trailing slash). Required for webhook transport.
    pub public_url: Option<String>,
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Completion provider settings.
    pub model: ModelConfig,
    /// Reply sent when the completion call fails.
    pub apology_message: String,
    /// Whether the webhook path embeds the bot token.
    pub webhook_path_token: bool,
    /// Update transport.
    pub transport: Transport,
    /// Maximum number of chats with stored conversation state.
    pub conversation_capacity: usize,
    /// Idle expiry for stored conversation state.
    pub conversation_ttl: Duration,
    /// Update de-duplication window. Zero disables de-duplication.
    pub dedup_ttl: Duration,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("telegram_token", &"***")
            .field("openai_api_key", &"***")
            .field("public_url", &self.public_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("model", &self.model)
            .field("apology_message", &self.apology_message)
            .field("webhook_path_token", &self.webhook_path_token)
            .field("transport", &self.transport)
            .field("conversation_capacity", &self.conversation_capacity)
            .field("conversation_ttl", &self.conversation_ttl)
            .field("dedup_ttl", &self.dedup_ttl)
            .finish()
    }
}

impl RelayConfig {
    /// Build the configuration from process environment variables layered over `file`.
    pub fn from_env(file: FileConfig) -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), file)
    }

    /// Build the configuration from an arbitrary key lookup layered over `file`.
    pub fn from_lookup<F>(lookup: F, file: FileConfig) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_token = first_non_empty(&lookup, &["TELEGRAM_TOKEN", "TELEGRAM_BOT_TOKEN"])
            .ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;
        let openai_api_key = first_non_empty(&lookup, &["OPENAI_API_KEY"])
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let transport: Transport = parse_or(&lookup, "RELAY_TRANSPORT", Transport::default())?;

        let public_url = first_non_empty(&lookup, &["WEBHOOK_URL", "APP_URL"])
            .or_else(|| non_empty(file.telegram.webhook_url.clone()))
            .map(|raw| normalize_public_url(&raw))
            .transpose()?;
        if transport == Transport::Webhook && public_url.is_none() {
            return Err(ConfigError::Missing("WEBHOOK_URL"));
        }

        let base_url = first_non_empty(&lookup, &["OPENAI_BASE_URL"])
            .or_else(|| non_empty(file.openai.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = ModelConfig {
            api: parse_or(&lookup, "COMPLETION_API", CompletionApi::default())?,
            base_url,
            model: first_non_empty(&lookup, &["OPENAI_MODEL"])
                .or_else(|| non_empty(file.openai.model.clone()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: first_non_empty(&lookup, &["SYSTEM_PROMPT"])
                .or_else(|| non_empty(file.system_prompt.clone())),
            max_tokens: parse_optional(&lookup, "OPENAI_MAX_TOKENS")?,
            temperature: parse_optional(&lookup, "OPENAI_TEMPERATURE")?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "COMPLETION_TIMEOUT_SECS",
                DEFAULT_COMPLETION_TIMEOUT_SECS,
            )?),
        };
        if model.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "COMPLETION_TIMEOUT_SECS",
                message: "must be greater than zero".to_string(),
            });
        }

        let conversation_capacity: usize =
            parse_or(&lookup, "CONVERSATION_CAPACITY", DEFAULT_CONVERSATION_CAPACITY)?;
        if conversation_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "CONVERSATION_CAPACITY",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            telegram_token,
            openai_api_key,
            public_url,
            host: first_non_empty(&lookup, &["HOST"]).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            model,
            apology_message: first_non_empty(&lookup, &["APOLOGY_MESSAGE"])
                .unwrap_or_else(|| DEFAULT_APOLOGY_MESSAGE.to_string()),
            webhook_path_token: parse_bool_or(&lookup, "WEBHOOK_PATH_TOKEN", true)?,
            transport,
            conversation_capacity,
            conversation_ttl: Duration::from_secs(parse_or(
                &lookup,
                "CONVERSATION_TTL_SECS",
                DEFAULT_CONVERSATION_TTL_SECS,
            )?),
            dedup_ttl: Duration::from_secs(parse_or(
                &lookup,
                "DEDUP_TTL_SECS",
                DEFAULT_DEDUP_TTL_SECS,
            )?),
        })
    }

    /// Path the webhook endpoint listens on.
    pub fn webhook_path(&self) -> String {
        if self.webhook_path_token {
            format!("/webhook/{}", self.telegram_token)
        } else {
            "/webhook".to_string()
        }
    }

    /// Full URL to register with Telegram, if a public base URL is configured.
    pub fn webhook_url(&self) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{}{}", base, self.webhook_path()))
    }

    /// Replace every occurrence of the bot token in `text` for logging.
    pub fn redact(&self, text: &str) -> String {
        redact_token(text, &self.telegram_token)
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Replace every occurrence of `token` in `text` with `***`.
pub fn redact_token(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, "***")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn first_non_empty<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|key| non_empty(lookup(key)))
}

fn parse_optional<F, T>(lookup: &F, key: &'static str) -> ConfigResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                key,
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

fn parse_bool_or<F>(lookup: &F, key: &'static str, default: bool) -> ConfigResult<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Invalid {
                key,
                message: format!("expected a boolean, got '{}'", other),
            }),
        },
    }
}

fn normalize_public_url(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::Invalid {
        key: "WEBHOOK_URL",
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::Invalid {
            key: "WEBHOOK_URL",
            message: format!("expected an absolute http(s) URL, got '{}'", raw),
        });
    }

    Ok(trimmed.to_string())
}
