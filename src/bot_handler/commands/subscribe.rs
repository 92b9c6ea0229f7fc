use std::str::FromStr;

use crate::{
    bot_handler::{BotHandlerError, BotHandlerResult, commands::Context},
    subscription::{PollKind, StopTarget},
};

const SUBSCRIBE_USAGE: &str = "/subscribe <city> <route> <direction> <station>";
const SUBSCRIBE_CLOSEST_USAGE: &str = "/subc <city> <route> <direction> <station>";

/// Handles `/subscribe` (arrival time) and `/subc` (stops away).
pub async fn handle(ctx: Context<'_>, args: &str, kind: PollKind) -> BotHandlerResult<()> {
    let usage = match kind {
        PollKind::Arrival => SUBSCRIBE_USAGE,
        PollKind::Proximity => SUBSCRIBE_CLOSEST_USAGE,
    };
    let target =
        StopTarget::from_str(args).map_err(|reason| BotHandlerError::InvalidInput { usage, reason })?;

    let subscription =
        ctx.handler.subscription_service.subscribe(ctx.chat_id, kind, target).await?;
    ctx.handler.messaging_service.send_subscribed_msg(ctx.chat_id, &subscription).await?;
    Ok(())
}
