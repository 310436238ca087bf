// Call commands.
//
// Thin on purpose: take the channel id, hand it to the call service, done.
// The service posts its own notices into both channels.

use crate::discord::{Context, Error};

/// Connect the current channel with another channel.
#[poise::command(prefix_command, guild_only, aliases("c"))]
pub async fn call(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx.channel_id().get();
    let outcome = ctx.data().calls.call(channel).await?;
    tracing::debug!(channel_id = channel, ?outcome, "call handled");
    Ok(())
}

/// Disconnect the current channel from its linked channel.
#[poise::command(prefix_command, guild_only, aliases("h"))]
pub async fn hangup(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx.channel_id().get();
    let outcome = ctx.data().calls.hangup(channel).await;
    tracing::debug!(channel_id = channel, ?outcome, "hangup handled");
    Ok(())
}

/// Hang up and look for the next call straight away.
#[poise::command(prefix_command, guild_only, aliases("s"))]
pub async fn skip(ctx: Context<'_>) -> Result<(), Error> {
    let channel = ctx.channel_id().get();
    let outcome = ctx.data().calls.skip(channel).await?;
    tracing::debug!(channel_id = channel, ?outcome, "skip handled");
    Ok(())
}
