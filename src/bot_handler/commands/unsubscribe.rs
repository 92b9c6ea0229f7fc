use crate::bot_handler::{BotHandlerResult, commands::Context};

pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    let removed = ctx.handler.subscription_service.unsubscribe_all(ctx.chat_id).await;
    ctx.handler.messaging_service.send_unsubscribed_msg(ctx.chat_id, removed).await?;
    Ok(())
}
