//! GPT Relay binary.
//!
//! Start the relay with:
//! ```bash
//! TELEGRAM_TOKEN=xxx OPENAI_API_KEY=sk-xxx WEBHOOK_URL=https://relay.example.com cargo run -p gpt-relay
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use relay_api::{ApiConfig, AppState};
use relay_core::{
    FileConfig, InMemoryConversationStore, MemoryUpdateDeduplicator, RelayConfig, RelayPipeline,
    Transport, UpdateDispatcher,
};
use relay_telegram::{spawn_startup_registration, TelegramClient, WebhookRegistrar};
use tracing_subscriber::EnvFilter;

/// GPT Relay - answer Telegram messages with an LLM
#[derive(Parser, Debug)]
#[command(name = "gpt-relay")]
#[command(about = "Relay Telegram messages to an LLM completion API and send back the reply")]
struct Args {
    /// Receive updates by long polling instead of a webhook
    #[arg(long)]
    polling: bool,

    /// Port for the webhook server (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// YAML config file
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Local .env.local or .env
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let args = Args::parse();
    init_logging(args.verbose);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };
    tracing::debug!(?config, "Configuration loaded");

    let provider = relay_llm::build_provider(&config.model, &config.openai_api_key)?;
    let client = TelegramClient::new(config.telegram_token.clone());
    let store = Arc::new(InMemoryConversationStore::new(
        config.conversation_capacity,
        config.conversation_ttl,
    ));
    let pipeline = Arc::new(RelayPipeline::from_config(
        &config,
        provider.clone(),
        Arc::new(client.clone()),
        store,
    ));

    let mut dispatcher = UpdateDispatcher::new(pipeline);
    if !config.dedup_ttl.is_zero() {
        dispatcher =
            dispatcher.with_deduplicator(Arc::new(MemoryUpdateDeduplicator::new(config.dedup_ttl)));
    }
    let dispatcher = Arc::new(dispatcher);

    tracing::info!(
        provider = provider.name(),
        model = %config.model.model,
        transport = ?config.transport,
        "GPT Relay starting"
    );

    match config.transport {
        Transport::Polling => {
            relay_telegram::run_polling(client, dispatcher).await?;
        }
        Transport::Webhook => {
            let webhook_url = config
                .webhook_url()
                .ok_or("WEBHOOK_URL is required in webhook mode")?;
            let registrar = Arc::new(
                WebhookRegistrar::new(Arc::new(client), webhook_url)
                    .with_redacted_secret(config.telegram_token.clone()),
            );
            spawn_startup_registration(Arc::clone(&registrar));

            let state = AppState::new(ApiConfig::from_relay_config(&config), dispatcher, registrar);
            relay_api::serve(state).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "gpt_relay=info,relay_core=info,relay_llm=info,relay_telegram=info,relay_api=info,tower_http=warn,teloxide=warn",
        1 => "gpt_relay=debug,relay_core=debug,relay_llm=debug,relay_telegram=debug,relay_api=debug,tower_http=info,teloxide=info",
        2 => "gpt_relay=trace,relay_core=trace,relay_llm=trace,relay_telegram=trace,relay_api=trace,tower_http=debug,teloxide=debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> Result<RelayConfig, Box<dyn std::error::Error>> {
    let file = FileConfig::discover(args.config.as_deref())?;
    let polling = args.polling;
    let port = args.port;

    let config = RelayConfig::from_lookup(
        |key| match key {
            "RELAY_TRANSPORT" if polling => Some("polling".to_string()),
            "PORT" => port
                .map(|p| p.to_string())
                .or_else(|| std::env::var(key).ok()),
            _ => std::env::var(key).ok(),
        },
        file,
    )?;
    Ok(config)
}
