use crate::core::calls::EmbedColor;
use crate::discord::{Context, Error};
use crate::infra::calls::embed_color;
use poise::serenity_prelude as serenity;

const CATEGORY_ORDER: &[&str] = &["Call Commands", "Fun Commands"];

/// Help text for one command. `{p}` is replaced with the command prefix.
struct CommandHelp {
    name: &'static str,
    aliases: &'static [&'static str],
    category: &'static str,
    usage: &'static str,
    summary: &'static str,
    description: &'static str,
    examples: &'static [(&'static str, &'static str)],
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "call",
        aliases: &["c"],
        category: "Call Commands",
        usage: "{p}call",
        summary: "Start or join a call with another channel.",
        description: "Start or join a call with another channel. If no channel is available, \
                      your channel will be placed in a waiting queue.",
        examples: &[],
    },
    CommandHelp {
        name: "hangup",
        aliases: &["h"],
        category: "Call Commands",
        usage: "{p}hangup",
        summary: "End the current call.",
        description: "End the current call and disconnect from the linked channel. \
                      Both channels will be notified of the disconnection.",
        examples: &[],
    },
    CommandHelp {
        name: "skip",
        aliases: &["s"],
        category: "Call Commands",
        usage: "{p}skip",
        summary: "Skip to a new call.",
        description: "Skip the current call and connect to the next available channel, \
                      or wait for a new connection.",
        examples: &[],
    },
    CommandHelp {
        name: "topic",
        aliases: &["t"],
        category: "Fun Commands",
        usage: "{p}topic [category]",
        summary: "Get a random topic to talk about. Use `category` for specific topics.",
        description: "Get a random topic to talk about. Optionally, specify a category \
                      to narrow down the type of topics.",
        examples: &[
            ("{p}topic", "Get a random topic from any category."),
            ("{p}topic funny", "Get a random funny topic."),
        ],
    },
    CommandHelp {
        name: "wouldyourather",
        aliases: &["wyr"],
        category: "Fun Commands",
        usage: "{p}wouldyourather",
        summary: "Get a random 'Would You Rather' question.",
        description: "Get a random 'Would You Rather' question to spark conversation.",
        examples: &[],
    },
    CommandHelp {
        name: "truthordare",
        aliases: &["tod"],
        category: "Fun Commands",
        usage: "{p}truthordare [choice]",
        summary: "Play Truth or Dare! Choose `truth`, `dare`, or leave blank for random.",
        description: "Play Truth or Dare! Choose between 'truth' or 'dare' for a prompt, \
                      or leave it blank for a random choice.",
        examples: &[
            ("{p}truthordare", "Get a random truth or dare prompt."),
            ("{p}truthordare truth", "Get a truth prompt."),
            ("{p}truthordare dare", "Get a dare prompt."),
        ],
    },
];

fn find_command(name: &str) -> Option<&'static CommandHelp> {
    let name = name.trim().to_lowercase();
    COMMANDS
        .iter()
        .find(|c| c.name == name || c.aliases.iter().any(|a| *a == name))
}

fn with_prefix(text: &str, prefix: &str) -> String {
    text.replace("{p}", prefix)
}

/// One line per command in `category`, e.g. "`r!call` - Start or join...".
fn category_lines(category: &str, prefix: &str) -> String {
    COMMANDS
        .iter()
        .filter(|c| c.category == category)
        .map(|c| format!("`{}` - {}", with_prefix(c.usage, prefix), c.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Displays the help menu or detailed info about a specific command.
#[poise::command(prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to explain"] command: Option<String>,
) -> Result<(), Error> {
    let prefix = ctx.data().prefix.clone();

    let embed = match command.as_deref() {
        None => general_help_embed(&prefix),
        Some(name) => match find_command(name) {
            Some(help) => command_help_embed(help, &prefix),
            None => {
                let (bot_name, bot_avatar) = {
                    let me = ctx.cache().current_user();
                    (me.name.clone(), me.face())
                };
                not_found_embed(name, &prefix)
                    .author(serenity::CreateEmbedAuthor::new(bot_name).icon_url(bot_avatar))
            }
        },
    };

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn general_help_embed(prefix: &str) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("Ratatoskr Commands")
        .description(format!(
            "Call and connect with other people. Below is the list of all available commands.\n\
             Use `{prefix}help <command>` to see more details about a specific command."
        ))
        .color(embed_color(EmbedColor::Teal));

    for category in CATEGORY_ORDER {
        embed = embed.field(*category, category_lines(category, prefix), false);
    }

    embed.footer(serenity::CreateEmbedFooter::new(format!(
        "Enjoy your conversations! Use {prefix}help <command> to learn more about a specific command."
    )))
}

fn command_help_embed(help: &CommandHelp, prefix: &str) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{prefix}{}", help.name))
        .description(help.description)
        .color(embed_color(EmbedColor::Blue))
        .field("Usage", format!("`{}`", with_prefix(help.usage, prefix)), false);

    if !help.aliases.is_empty() {
        let aliases = help
            .aliases
            .iter()
            .map(|a| format!("`{prefix}{a}`"))
            .collect::<Vec<_>>()
            .join(", ");
        embed = embed.field("Aliases", aliases, false);
    }

    if !help.examples.is_empty() {
        let examples = help
            .examples
            .iter()
            .map(|(usage, what)| format!("`{}` - {}", with_prefix(usage, prefix), what))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Examples", examples, false);
    }

    embed
}

fn not_found_embed(name: &str, prefix: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Command Not Found")
        .description(format!(
            "The command `{name}` does not exist. Use `{prefix}help` to see the list of all commands."
        ))
        .color(embed_color(EmbedColor::Red))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_found_by_name_or_alias() {
        assert_eq!(find_command("call").map(|c| c.name), Some("call"));
        assert_eq!(find_command("TOD").map(|c| c.name), Some("truthordare"));
        assert_eq!(find_command("wyr").map(|c| c.name), Some("wouldyourather"));
        assert!(find_command("dance").is_none());
    }

    #[test]
    fn every_command_sits_in_a_listed_category() {
        for command in COMMANDS {
            assert!(CATEGORY_ORDER.contains(&command.category), "{}", command.name);
        }
    }

    #[test]
    fn menu_lines_use_the_configured_prefix() {
        let lines = category_lines("Call Commands", "r!");
        assert_eq!(
            lines,
            "`r!call` - Start or join a call with another channel.\n\
             `r!hangup` - End the current call.\n\
             `r!skip` - Skip to a new call."
        );
        assert!(!lines.contains("{p}"));
    }
}
