use crate::bot_handler::{BotHandlerResult, commands::Context};

pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    let keys = ctx.handler.subscription_service.list_subscriptions(ctx.chat_id).await;
    ctx.handler.messaging_service.send_list_msg(ctx.chat_id, keys).await?;
    Ok(())
}
