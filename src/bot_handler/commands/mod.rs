pub mod help;
pub mod list;
pub mod start;
pub mod subscribe;
pub mod unsubscribe;

use teloxide::types::ChatId;

use crate::bot_handler::BotHandler;

/// Context groups the data needed by all command handlers.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub handler: &'a BotHandler,
    pub chat_id: ChatId,
}
