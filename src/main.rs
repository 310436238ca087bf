// This is the entry point of the Ratatoskr call bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): pairing registry, calls, relay, prompts
// - `infra/` = Implementations of core traits (Discord webhooks, the prompt file)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::calls::{CallService, PairingRegistry, RelayRouter};
use crate::core::prompts::PromptService;
use crate::discord::commands::presence;
use crate::discord::relay as relay_events;
use crate::discord::{Data, Error};
use crate::infra::calls::DiscordWebhookPlatform;
use crate::infra::prompts::JsonPromptStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const DEFAULT_PREFIX: &str = "r!";
const DEFAULT_PROMPTS_PATH: &str = "topics.json";
const DEFAULT_WEBHOOK_NAME: &str = "ChannelLinker";

/// Event handler for non-command Discord events.
/// Every ordinary message goes through the relay.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // A failed relay must not take the event loop down with it.
        if let Err(e) = relay_events::handle_message(ctx, data, new_message).await {
            tracing::warn!(
                channel_id = new_message.channel_id.get(),
                error = %e,
                "Error relaying message"
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );
    let prefix = std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let prompts_path =
        std::env::var("PROMPTS_PATH").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.to_string());
    let webhook_name =
        std::env::var("WEBHOOK_NAME").unwrap_or_else(|_| DEFAULT_WEBHOOK_NAME.to_string());

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let catalog = JsonPromptStore::new(&prompts_path)
        .load()
        .await
        .expect("Failed to load conversation prompts");
    let prompt_service = Arc::new(PromptService::new(catalog));

    // Webhook calls go through their own HTTP client; the gateway client is
    // only built further down.
    let http = Arc::new(serenity::Http::new(&token));
    let platform = Arc::new(DiscordWebhookPlatform::new(http, webhook_name));

    // One registry for the whole process, shared by calls and relay.
    let registry = Arc::new(PairingRegistry::new());
    let call_service = Arc::new(CallService::new(
        Arc::clone(&platform),
        Arc::clone(&registry),
        prefix.clone(),
    ));
    let relay_router = Arc::new(RelayRouter::new(platform, registry));

    // Create the data structure that will be shared across all commands
    let data = Data {
        calls: Arc::clone(&call_service),
        relay: relay_router,
        prompts: prompt_service,
        prefix: prefix.clone(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::calls::call(),
                discord::commands::calls::hangup(),
                discord::commands::calls::skip(),
                discord::commands::prompts::topic(),
                discord::commands::prompts::wouldyourather(),
                discord::commands::prompts::truthordare(),
                discord::commands::help::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                case_insensitive_commands: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(discord::on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "Bot is ready");
                presence::on_ready(ctx, &data.prefix);
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    // On Ctrl-C, end every call so no webhook is left behind, then stop.
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }

        tracing::info!("Shutting down, ending active calls");
        call_service.hang_up_all().await;
        shard_manager.shutdown_all().await;
    });

    if let Err(e) = client.start().await {
        tracing::error!("Error running bot: {}", e);
    }
}
