// Gateway glue for the relay: turns a serenity Message into the core's
// InboundMessage and hands it to the relay router.

use crate::core::calls::{InboundMessage, RelayOutcome, ReplyContext};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Relay an ordinary guild message to the partner channel, if there is one.
pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    msg: &serenity::Message,
) -> Result<(), Error> {
    // Ignore our own notices and prompt embeds.
    if msg.author.id == ctx.cache.current_user().id {
        return Ok(());
    }

    // Commands are poise's business and never cross the call.
    if is_command(&msg.content, &data.prefix) {
        return Ok(());
    }

    if msg.guild_id.is_none() {
        return Ok(());
    }

    let inbound = inbound_from_message(msg);
    let outcome = data.relay.relay(&inbound).await?;

    if let RelayOutcome::Forwarded { partner } = outcome {
        tracing::debug!(
            channel_id = inbound.channel,
            partner_id = partner,
            "Relayed message"
        );
    }

    Ok(())
}

pub fn is_command(content: &str, prefix: &str) -> bool {
    !prefix.is_empty() && content.trim_start().starts_with(prefix)
}

fn inbound_from_message(msg: &serenity::Message) -> InboundMessage {
    let nick = msg.member.as_ref().and_then(|m| m.nick.as_deref());

    InboundMessage {
        channel: msg.channel_id.get(),
        author_name: display_name(&msg.author, nick),
        author_avatar: Some(msg.author.face()),
        content: compose_content(&msg.content, msg.attachments.iter().map(|a| a.url.as_str())),
        reply_to: msg.referenced_message.as_deref().map(reply_context),
        webhook_origin: msg.webhook_id.is_some(),
    }
}

fn reply_context(original: &serenity::Message) -> ReplyContext {
    let nick = original.member.as_ref().and_then(|m| m.nick.as_deref());

    ReplyContext {
        author_name: display_name(&original.author, nick),
        author_avatar: Some(original.author.face()),
        content: compose_content(
            &original.content,
            original.attachments.iter().map(|a| a.url.as_str()),
        ),
    }
}

/// Name shown for a user: server nickname, then global name, then username.
pub fn display_name(user: &serenity::User, nick: Option<&str>) -> String {
    pick_display_name(nick, user.global_name.as_deref(), &user.name)
}

fn pick_display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    let usable = |name: &&str| !name.trim().is_empty();
    nick.filter(usable)
        .or(global_name.filter(usable))
        .unwrap_or(username)
        .to_string()
}

/// Message text followed by attachment links, one per line.
///
/// Webhooks cannot re-upload the partner's files, so links are the next best
/// thing.
fn compose_content<'a>(content: &'a str, attachment_urls: impl Iterator<Item = &'a str>) -> String {
    let mut lines: Vec<&str> = Vec::new();
    if !content.is_empty() {
        lines.push(content);
    }
    lines.extend(attachment_urls);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognised_by_prefix() {
        assert!(is_command("r!call", "r!"));
        assert!(is_command("  r!topic funny", "r!"));
        assert!(!is_command("hello r!call", "r!"));
        assert!(!is_command("anything", ""));
    }

    #[test]
    fn display_name_prefers_nick_then_global_name() {
        assert_eq!(pick_display_name(Some("Haze"), Some("Hazel"), "hazel_99"), "Haze");
        assert_eq!(pick_display_name(None, Some("Hazel"), "hazel_99"), "Hazel");
        assert_eq!(pick_display_name(None, None, "hazel_99"), "hazel_99");
        assert_eq!(pick_display_name(Some("  "), Some("Hazel"), "hazel_99"), "Hazel");
    }

    #[test]
    fn attachments_are_appended_as_links() {
        let urls = ["https://cdn.example/a.png", "https://cdn.example/b.gif"];
        assert_eq!(
            compose_content("look", urls.iter().copied()),
            "look\nhttps://cdn.example/a.png\nhttps://cdn.example/b.gif"
        );
        assert_eq!(
            compose_content("", urls.iter().copied().take(1)),
            "https://cdn.example/a.png"
        );
        assert_eq!(compose_content("", std::iter::empty()), "");
    }
}
