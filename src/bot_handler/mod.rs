mod commands;

use std::sync::Arc;

use teloxide::{prelude::*, types::Message, utils::command::BotCommands};
use thiserror::Error;

use crate::{
    bot_handler::commands::Context,
    messaging::{MessagingError, MessagingService},
    subscription::{PollKind, SubscriptionError, SubscriptionService},
};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and show welcome message.")]
    Start,
    #[command(description = "Show this help text.")]
    Help,
    #[command(
        description = "Alert with arrival times: /subscribe <city> <route> <direction> <station>",
        aliases = ["sub"]
    )]
    Subscribe(String),
    #[command(
        description = "Alert when a bus is a few stops away: /subc <city> <route> <direction> \
                       <station>"
    )]
    Subc(String),
    #[command(description = "Remove all your subscriptions.", aliases = ["unsub"])]
    Unsubscribe,
    #[command(description = "List your active subscriptions.")]
    List,
}

/// Errors raised while handling a command.
#[derive(Debug, Error)]
pub enum BotHandlerError {
    /// Malformed arguments; the reply carries the usage string.
    #[error("{reason}\nUsage: {usage}")]
    InvalidInput {
        /// Usage line of the command.
        usage: &'static str,
        /// What was wrong with the arguments.
        reason: String,
    },
    /// The subscription could not be created.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    /// The reply could not be delivered.
    #[error("Failed to send message: {0}")]
    Messaging(#[from] MessagingError),
}

/// Result type of command handlers.
pub type BotHandlerResult<T> = Result<T, BotHandlerError>;

/// Routes chat commands to the subscription service and replies.
pub struct BotHandler {
    messaging_service: Arc<dyn MessagingService>,
    subscription_service: Arc<dyn SubscriptionService>,
}

impl BotHandler {
    /// Creates a new `BotHandler` instance.
    pub fn new(
        messaging_service: Arc<dyn MessagingService>,
        subscription_service: Arc<dyn SubscriptionService>,
    ) -> Self {
        Self { messaging_service, subscription_service }
    }

    /// Dispatches the incoming command to the appropriate handler.
    pub async fn handle_commands(&self, msg: &Message, cmd: Command) -> BotHandlerResult<()> {
        self.handle_command(msg.chat.id, cmd).await
    }

    /// Runs `cmd` for `chat_id`. Handler errors become a chat message; only a
    /// failure to deliver that message is returned.
    async fn handle_command(&self, chat_id: ChatId, cmd: Command) -> BotHandlerResult<()> {
        let ctx = Context { handler: self, chat_id };

        let result = match cmd {
            Command::Start => commands::start::handle(ctx).await,
            Command::Help => commands::help::handle(ctx).await,
            Command::Subscribe(args) => {
                commands::subscribe::handle(ctx, &args, PollKind::Arrival).await
            }
            Command::Subc(args) => commands::subscribe::handle(ctx, &args, PollKind::Proximity).await,
            Command::Unsubscribe => commands::unsubscribe::handle(ctx).await,
            Command::List => commands::list::handle(ctx).await,
        };

        match result {
            Err(BotHandlerError::Messaging(e)) => Err(BotHandlerError::Messaging(e)),
            Err(e) => {
                tracing::warn!("Command failed for chat {chat_id}: {e}");
                self.messaging_service.send_error_msg(chat_id, e).await?;
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}
