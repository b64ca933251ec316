use crate::types::Context;
use anyhow::Error;

/// Responds with the bot's latency.
#[poise::command(slash_command, check = "crate::checks::check_is_administrator", category = "Utilities")]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(format!("🏓Pong! Latency: {}ms", latency.as_millis())).await?;
    Ok(())
}
