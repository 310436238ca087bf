// Conversation-starter commands.
//
// Prompts show up in the current channel and, during a call, in the partner
// channel too, posted through the call webhook under the bot's own name.

use crate::core::calls::{EmbedColor, EmbedSpec, OutboundPost};
use crate::core::prompts::{PromptError, TopicPrompt, TruthOrDarePrompt};
use crate::discord::relay::display_name;
use crate::discord::{Context, Error};
use crate::infra::calls::render_embed;

/// Get a random topic to talk about.
#[poise::command(prefix_command, aliases("t"))]
pub async fn topic(
    ctx: Context<'_>,
    #[description = "Category to pick from (random if left out)"] category: Option<String>,
) -> Result<(), Error> {
    let picked = ctx.data().prompts.topic(category.as_deref());

    match picked {
        Ok(topic) => {
            let author = author_display_name(ctx).await;
            let line = format!("{} chose a topic from `{}`", author, topic.category);
            share_prompt(ctx, line, topic_embed(&topic)).await
        }
        Err(e) => send_local(ctx, error_embed(&e)).await,
    }
}

/// Ask a random "Would You Rather" question.
#[poise::command(prefix_command, aliases("wyr"))]
pub async fn wouldyourather(ctx: Context<'_>) -> Result<(), Error> {
    let picked = ctx.data().prompts.would_you_rather();

    match picked {
        Ok(question) => {
            let author = author_display_name(ctx).await;
            let line = format!("{} used Would You Rather", author);
            share_prompt(ctx, line, would_you_rather_embed(&question)).await
        }
        Err(e) => send_local(ctx, error_embed(&e)).await,
    }
}

/// Play Truth or Dare!
#[poise::command(prefix_command, aliases("tod"))]
pub async fn truthordare(
    ctx: Context<'_>,
    #[description = "`truth`, `dare`, or leave blank for random"] choice: Option<String>,
) -> Result<(), Error> {
    let picked = ctx.data().prompts.truth_or_dare(choice.as_deref());

    match picked {
        Ok(prompt) => {
            let author = author_display_name(ctx).await;
            let line = format!("{} chose {}", author, prompt.kind.label());
            share_prompt(ctx, line, truth_or_dare_embed(&prompt)).await
        }
        Err(e @ PromptError::InvalidChoice(_)) => {
            ctx.say(e.to_string()).await?;
            Ok(())
        }
        Err(e) => send_local(ctx, error_embed(&e)).await,
    }
}

/// Post the prompt here, then mirror it into the partner channel if any.
async fn share_prompt(ctx: Context<'_>, line: String, embed: EmbedSpec) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(render_embed(&embed)))
        .await?;

    // The cache guard is not Send, so copy what we need before awaiting.
    let (bot_name, bot_avatar) = {
        let me = ctx.cache().current_user();
        (me.name.clone(), me.face())
    };

    let post = OutboundPost {
        content: Some(line),
        display_name: Some(bot_name),
        avatar_url: Some(bot_avatar),
        embed: Some(embed),
    };

    let channel = ctx.channel_id().get();
    if let Err(e) = ctx.data().relay.mirror_to_partner(channel, &post).await {
        tracing::warn!(channel_id = channel, error = %e, "Failed to mirror prompt to partner");
    }

    Ok(())
}

async fn send_local(ctx: Context<'_>, embed: EmbedSpec) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(render_embed(&embed)))
        .await?;
    Ok(())
}

async fn author_display_name(ctx: Context<'_>) -> String {
    let nick = ctx.author_member().await.and_then(|m| m.nick.clone());
    display_name(ctx.author(), nick.as_deref())
}

pub fn topic_embed(topic: &TopicPrompt) -> EmbedSpec {
    EmbedSpec {
        title: Some(format!("Topic from `{}`", topic.category)),
        description: topic.prompt.clone(),
        color: EmbedColor::Blue,
        author_name: None,
        author_icon: None,
    }
}

pub fn would_you_rather_embed(question: &str) -> EmbedSpec {
    EmbedSpec {
        title: Some("Would You Rather".to_string()),
        description: question.to_string(),
        color: EmbedColor::Green,
        author_name: None,
        author_icon: None,
    }
}

pub fn truth_or_dare_embed(prompt: &TruthOrDarePrompt) -> EmbedSpec {
    EmbedSpec {
        title: Some(format!("{} Time!", prompt.kind.label())),
        description: prompt.prompt.clone(),
        color: EmbedColor::Purple,
        author_name: None,
        author_icon: None,
    }
}

pub fn error_embed(error: &PromptError) -> EmbedSpec {
    EmbedSpec {
        title: Some("Error".to_string()),
        description: error.to_string(),
        color: EmbedColor::Red,
        author_name: None,
        author_icon: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompts::TruthOrDare;

    #[test]
    fn topic_embed_names_the_category() {
        let embed = topic_embed(&TopicPrompt {
            category: "funny".to_string(),
            prompt: "Worst haircut?".to_string(),
        });
        assert_eq!(embed.title.as_deref(), Some("Topic from `funny`"));
        assert_eq!(embed.description, "Worst haircut?");
        assert_eq!(embed.color, EmbedColor::Blue);
    }

    #[test]
    fn truth_or_dare_embed_title_follows_kind() {
        let embed = truth_or_dare_embed(&TruthOrDarePrompt {
            kind: TruthOrDare::Dare,
            prompt: "Do ten push-ups.".to_string(),
        });
        assert_eq!(embed.title.as_deref(), Some("Dare Time!"));
        assert_eq!(embed.color, EmbedColor::Purple);
    }

    #[test]
    fn unknown_category_error_embed_lists_categories() {
        let embed = error_embed(&PromptError::UnknownCategory {
            requested: "nonexistent".to_string(),
            available: vec!["deep".to_string(), "funny".to_string()],
        });
        assert_eq!(embed.color, EmbedColor::Red);
        assert!(embed.description.contains("nonexistent"));
        assert!(embed.description.contains("deep, funny"));
    }
}
