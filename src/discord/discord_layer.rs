// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "relay/relay_events.rs"]
pub mod relay;

use crate::core::calls::{CallService, RelayRouter};
use crate::core::prompts::PromptService;
use crate::infra::calls::DiscordWebhookPlatform;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event handler.
pub struct Data {
    pub calls: Arc<CallService<DiscordWebhookPlatform>>,
    pub relay: Arc<RelayRouter<DiscordWebhookPlatform>>,
    pub prompts: Arc<PromptService>,
    /// Command prefix, e.g. `r!`.
    pub prefix: String,
}

/// Framework error hook. A failing command is logged and the bot carries on.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                channel_id = ctx.channel_id().get(),
                error = %error,
                "Command failed"
            );
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling framework error: {}", e);
            }
        }
    }
}
