mod utils;

use async_trait::async_trait;
use mockall::automock;
use teloxide::{prelude::*, types::ChatId, utils::command::BotCommands};
use thiserror::Error;

use crate::{
    bot_handler::{BotHandlerError, Command},
    poller::Alert,
    subscription::{Subscription, SubscriptionKey},
};

/// Failures delivering a chat message.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The Telegram API request failed.
    #[error("Teloxide API request failed: {0}")]
    TeloxideRequest(#[from] teloxide::RequestError),
}

type Result<T> = std::result::Result<T, MessagingError>;

/// Trait for sending messages to the user.
#[automock]
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Sends a plain text message to the provided chat.
    async fn send_text_message(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Sends an error message to the provided chat.
    async fn send_error_msg(&self, chat_id: ChatId, error: BotHandlerError) -> Result<()>;

    /// Sends a help message to the user.
    async fn send_help_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Sends a start message to the user.
    async fn send_start_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Confirms a new subscription.
    async fn send_subscribed_msg(&self, chat_id: ChatId, subscription: &Subscription)
    -> Result<()>;

    /// Reports how many subscriptions an unsubscribe request removed.
    async fn send_unsubscribed_msg(&self, chat_id: ChatId, removed: usize) -> Result<()>;

    /// Sends the user's active subscriptions.
    async fn send_list_msg(&self, chat_id: ChatId, keys: Vec<SubscriptionKey>) -> Result<()>;

    /// Tells the user a bus is approaching their stop.
    async fn send_alert_msg(
        &self,
        chat_id: ChatId,
        subscription: &Subscription,
        alert: Alert,
    ) -> Result<()>;
}

/// Telegram messaging service.
pub struct TelegramMessagingService {
    bot: Bot,
}

impl TelegramMessagingService {
    /// Creates a new `TelegramMessagingService` instance.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessagingService for TelegramMessagingService {
    async fn send_text_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_error_msg(&self, chat_id: ChatId, error: BotHandlerError) -> Result<()> {
        self.send_text_message(chat_id, &error.to_string()).await
    }

    async fn send_help_msg(&self, chat_id: ChatId) -> Result<()> {
        let help_text = format!("{}\n\n{}", Command::descriptions(), utils::HELP_EXAMPLE);
        self.send_text_message(chat_id, &help_text).await
    }

    async fn send_start_msg(&self, chat_id: ChatId) -> Result<()> {
        self.send_text_message(chat_id, utils::START_TEXT).await
    }

    async fn send_subscribed_msg(
        &self,
        chat_id: ChatId,
        subscription: &Subscription,
    ) -> Result<()> {
        self.send_text_message(chat_id, &utils::format_subscribed(subscription)).await
    }

    async fn send_unsubscribed_msg(&self, chat_id: ChatId, removed: usize) -> Result<()> {
        let text = if removed == 0 {
            utils::NO_SUBSCRIPTION_TEXT
        } else {
            "Removed all Subscription!"
        };
        self.send_text_message(chat_id, text).await
    }

    async fn send_list_msg(&self, chat_id: ChatId, keys: Vec<SubscriptionKey>) -> Result<()> {
        self.send_text_message(chat_id, &utils::format_subscription_list(&keys)).await
    }

    async fn send_alert_msg(
        &self,
        chat_id: ChatId,
        subscription: &Subscription,
        alert: Alert,
    ) -> Result<()> {
        self.send_text_message(chat_id, &utils::format_alert(subscription, alert)).await
    }
}
