#![warn(missing_docs)]
//! A Telegram bot that relays bus arrival alerts.
//!
//! Users subscribe to a stop on a bus route and receive a message every poll
//! interval with the estimated arrival time, or with the number of stops the
//! nearest bus still has to travel. Arrival data comes from the TDX transit
//! API.

/// The main handler for the bot's logic.
pub mod bot_handler;
/// The configuration for the application.
pub mod config;
/// The dispatcher for routing updates to the correct handlers.
pub mod dispatcher;
/// The service for sending messages to the user.
pub mod messaging;
/// Recurring checks that turn transit data into alerts.
pub mod poller;
/// The service for managing subscriptions and their scheduled tasks.
pub mod subscription;
/// The client for interacting with the TDX transit API.
pub mod transit;

use std::{sync::Arc, time::Duration};

use reqwest::Client;
use teloxide::prelude::*;

use crate::{
    bot_handler::BotHandler,
    config::Config,
    messaging::TelegramMessagingService,
    subscription::{DefaultSubscriptionService, SubscriptionRegistry},
    transit::{BearerSession, ClientCredentials, TdxGateway},
};

/// How long in-flight ticks may keep running once the bot stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Runs the bot until it receives ctrl-c.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let http = Client::new();

    let credentials = Arc::new(ClientCredentials::new(
        http.clone(),
        &config.tdx_auth_url,
        &config.tdx_client_id,
        &config.tdx_client_secret,
    ));
    let session = Arc::new(BearerSession::new(http, credentials));
    session.authenticate().await?;

    let gateway = Arc::new(TdxGateway::new(session, &config.tdx_api_url)?);
    let bot = Bot::new(config.telegram_bot_token.clone());
    let messaging_service = Arc::new(TelegramMessagingService::new(bot.clone()));

    let registry = Arc::new(SubscriptionRegistry::new(config.unsubscribe_scope));
    let subscription_service = Arc::new(DefaultSubscriptionService::new(
        gateway,
        messaging_service.clone(),
        registry.clone(),
        Duration::from_secs(config.poll_interval),
        config.approach_threshold,
    ));
    let handler = Arc::new(BotHandler::new(messaging_service, subscription_service));
    let mut dispatcher = dispatcher::BotDispatcher::new(handler).build(bot);
    tracing::debug!("Dispatcher built successfully.");

    dispatcher.dispatch().await;

    let stopped = registry.shutdown(SHUTDOWN_GRACE).await;
    tracing::info!("Stopped {stopped} subscription task(s).");

    Ok(())
}
