use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lieksika::bot::{
    callback_handler, edited_message_handler, message_handler, BotContext, ConversationEngine,
    TelegramTransport,
};
use lieksika::cards::CardPool;
use lieksika::config::{BotConfig, RunMode};
use lieksika::joke::DadJokeClient;
use lieksika::localization::init_localization;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing();

    info!("Starting Lieksika Telegram Bot");

    let config = BotConfig::from_env()?;
    init_localization(&config.language);

    let cards = CardPool::load(&config.cards_path)?;
    info!(cards = cards.len(), path = %config.cards_path, "Card pool loaded");

    let bot = Bot::new(config.token.clone());
    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    let engine = ConversationEngine::new(
        transport.clone(),
        Arc::new(cards),
        ChatId(config.contact_chat_id),
        config.conversation.timeout,
    );
    let jokes = Arc::new(DadJokeClient::new(config.joke_url.clone())?);
    let ctx = Arc::new(BotContext::new(engine, transport.clone(), jokes));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_edited_message().endpoint(edited_message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build();

    match config.mode {
        RunMode::Polling => {
            info!("Running in polling mode");
            transport.inner().delete_webhook().await?;
            dispatcher.dispatch().await;
        }
        RunMode::Webhook { port, url } => {
            info!(port, "Running in webhook mode");
            let address = SocketAddr::from(([0, 0, 0, 0], port));
            let url: reqwest::Url = url.parse().context("Invalid webhook URL")?;
            let listener = webhooks::axum(bot, webhooks::Options::new(address, url))
                .await
                .context("Failed to set up webhook")?;

            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
    }

    Ok(())
}
