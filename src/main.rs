mod bot;
mod command;
mod config;
mod llm;
mod messenger;
mod news;
mod sentiment;
mod storage;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::messenger::Messenger;
use crate::webhook::WebhookState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cryptonews_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenvy::dotenv() {
        info!("No .env file loaded: {}", e);
    }

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.llm.model);
    info!("  Database: {}", config.storage.database_path.display());
    info!("  Webhook: {}", config.webhook.listen_addr);
    info!("  Alert chat: {}", config.alert_chat_id);

    // One bot handle, shared by the update loop and the webhook sender
    let bot = Bot::new(&config.bot_token);
    let messenger = Messenger::new(Arc::new(bot.clone()));

    let webhook_state = WebhookState::new(messenger.clone(), config.alert_chat_id);
    let listen_addr = config.webhook.listen_addr.clone();
    let state = Arc::new(AppState::new(config, messenger));

    let mut updates = tokio::spawn(bot::run(bot, state));
    let mut listener =
        tokio::spawn(async move { webhook::serve(&listen_addr, webhook_state).await });

    info!("Bot is starting...");

    tokio::select! {
        res = &mut updates => {
            listener.abort();
            res.context("Update loop task panicked")?
                .context("Update loop failed")?;
            info!("Update loop finished, shutting down");
        }
        res = &mut listener => {
            updates.abort();
            res.context("Webhook task panicked")?
                .context("Webhook listener failed")?;
            warn!("Webhook listener exited, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            updates.abort();
            listener.abort();
        }
    }

    Ok(())
}
