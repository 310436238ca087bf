// Discord implementation of the CallPlatform port.
//
// Outbound handles are channel webhooks: they let us post into the partner
// channel under the original author's name and avatar. Everything Discord
// specific (limits, colours, builders) stays in this file.

use crate::core::calls::{
    CallPlatform, ChannelId, EmbedColor, EmbedSpec, OutboundPost, PlatformError,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Message content limit for webhook posts.
const MAX_CONTENT_LEN: usize = 2000;
/// Webhook username limit.
const MAX_USERNAME_LEN: usize = 80;
/// Words Discord refuses inside webhook usernames.
const BANNED_USERNAME_WORDS: &[&str] = &["discord", "clyde"];

pub struct DiscordWebhookPlatform {
    http: Arc<serenity::Http>,
    /// Name shown on the webhook itself in channel settings.
    webhook_name: String,
}

impl DiscordWebhookPlatform {
    pub fn new(http: Arc<serenity::Http>, webhook_name: impl Into<String>) -> Self {
        Self {
            http,
            webhook_name: webhook_name.into(),
        }
    }
}

#[async_trait]
impl CallPlatform for DiscordWebhookPlatform {
    type Handle = serenity::Webhook;

    async fn create_outbound_handle(
        &self,
        channel: ChannelId,
    ) -> Result<serenity::Webhook, PlatformError> {
        serenity::ChannelId::new(channel)
            .create_webhook(&self.http, serenity::CreateWebhook::new(&self.webhook_name))
            .await
            .map_err(|e| PlatformError::HandleCreation {
                channel,
                reason: e.to_string(),
            })
    }

    async fn delete_outbound_handle(
        &self,
        handle: serenity::Webhook,
    ) -> Result<(), PlatformError> {
        handle
            .delete(&self.http)
            .await
            .map_err(|e| PlatformError::HandleDeletion(format!("webhook {}: {}", handle.id, e)))
    }

    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError> {
        serenity::ChannelId::new(channel)
            .say(&self.http, text)
            .await
            .map(|_| ())
            .map_err(|e| PlatformError::Send(e.to_string()))
    }

    async fn send_via_handle(
        &self,
        handle: &serenity::Webhook,
        post: &OutboundPost,
    ) -> Result<(), PlatformError> {
        handle
            .execute(&self.http, false, build_execute(post))
            .await
            .map(|_| ())
            .map_err(|e| PlatformError::Send(e.to_string()))
    }
}

/// Turn a core post into a webhook execution.
///
/// Mentions are disabled: one side of a call must not be able to ping the
/// other side's server.
fn build_execute(post: &OutboundPost) -> serenity::ExecuteWebhook {
    let mut builder =
        serenity::ExecuteWebhook::new().allowed_mentions(serenity::CreateAllowedMentions::new());

    if let Some(content) = &post.content {
        builder = builder.content(truncate_content(content, MAX_CONTENT_LEN));
    }
    if let Some(name) = &post.display_name {
        builder = builder.username(sanitize_username(name));
    }
    if let Some(avatar) = &post.avatar_url {
        builder = builder.avatar_url(avatar.clone());
    }
    if let Some(embed) = &post.embed {
        builder = builder.embed(render_embed(embed));
    }

    builder
}

/// Build a serenity embed from a core embed description.
pub fn render_embed(spec: &EmbedSpec) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .description(spec.description.clone())
        .color(embed_color(spec.color));

    if let Some(title) = &spec.title {
        embed = embed.title(title.clone());
    }

    if let Some(name) = &spec.author_name {
        let mut author = serenity::CreateEmbedAuthor::new(name.clone());
        if let Some(icon) = &spec.author_icon {
            author = author.icon_url(icon.clone());
        }
        embed = embed.author(author);
    }

    embed
}

pub fn embed_color(color: EmbedColor) -> u32 {
    match color {
        EmbedColor::Blue => 0x3498DB,
        EmbedColor::Green => 0x2ECC71,
        EmbedColor::Purple => 0x9B59B6,
        EmbedColor::Red => 0xE74C3C,
        EmbedColor::Teal => 0x1ABC9C,
    }
}

/// Make a display name acceptable as a webhook username.
pub fn sanitize_username(name: &str) -> String {
    let mut cleaned: String = name.trim().chars().take(MAX_USERNAME_LEN).collect();

    // ASCII lowercasing keeps byte offsets aligned with `cleaned`.
    for banned in BANNED_USERNAME_WORDS {
        while let Some(pos) = cleaned.to_ascii_lowercase().find(banned) {
            cleaned.replace_range(pos + 1..pos + 2, "*");
        }
    }

    if cleaned.is_empty() {
        "Anonymous".to_string()
    } else {
        cleaned
    }
}

fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(max_chars - 1).collect();
    truncated.push('…');
    truncated
}
