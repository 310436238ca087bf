// Domain models for anonymous channel-to-channel calls.
//
// Like the rest of core, nothing here knows about Discord. Channels are plain
// u64 ids and everything the platform has to render is described with plain
// strings so the adapter can turn it into whatever its API wants.

use chrono::{DateTime, Utc};

/// Opaque platform identifier for a text channel.
pub type ChannelId = u64;

/// One directed side of a call, as stored in the pairing table.
#[derive(Debug, Clone)]
pub struct PairingEntry<H> {
    pub partner: ChannelId,
    /// Posts into `partner`'s channel.
    pub outbound: H,
    pub connected_at: DateTime<Utc>,
}

/// Everything released by a teardown. The caller owns both handles now and is
/// responsible for deleting them.
#[derive(Debug, Clone)]
pub struct TornDownPairing<H> {
    pub channel: ChannelId,
    pub partner: ChannelId,
    pub my_handle: H,
    pub partner_handle: H,
    pub connected_at: DateTime<Utc>,
}

/// Result of trying to put a channel into a call in one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    AlreadyInCall,
    AlreadyWaiting,
    Matched(ChannelId),
    Enqueued,
}

/// What a `call` command ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    AlreadyInCall,
    StillWaiting,
    Waiting,
    Connected { partner: ChannelId },
}

/// What a `hangup` (or the hangup half of `skip`) ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangupOutcome {
    NotInCall,
    HungUp { partner: ChannelId },
}

/// What a `skip` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    NotInCall,
    Skipped {
        previous_partner: ChannelId,
        next: CallOutcome,
    },
}

/// Short status messages posted by the bot into a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Waiting,
    StillWaiting,
    PickedUp,
    PickedUpPartner,
    AlreadyInCall,
    NotInCall,
    YouHungUp,
    PartnerHungUp,
    CallFailed,
    ServiceClosing,
}

impl Notice {
    /// Render the notice, using `prefix` wherever a command is suggested.
    pub fn render(&self, prefix: &str) -> String {
        match self {
            Notice::Waiting => "Waiting for someone to pick up...".to_string(),
            Notice::StillWaiting => format!(
                "Still waiting for someone to pick up... Type `{prefix}hangup` once you're connected to leave."
            ),
            Notice::PickedUp => "Call picked up! Say Hi.".to_string(),
            Notice::PickedUpPartner => "Call picked up! You're connected.".to_string(),
            Notice::AlreadyInCall => {
                format!("You are already in call! Type `{prefix}hangup` to disconnect.")
            }
            Notice::NotInCall => {
                format!("You're not in call. Type `{prefix}call` to start one.")
            }
            Notice::YouHungUp => "You hung up.".to_string(),
            Notice::PartnerHungUp => "The other side hung up.".to_string(),
            Notice::CallFailed => format!(
                "Couldn't connect the call. Make sure I can manage webhooks here, then try `{prefix}call` again."
            ),
            Notice::ServiceClosing => "The call ended because the bot is shutting down.".to_string(),
        }
    }
}

/// Accent colours for embeds. The adapter maps them to real colour values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedColor {
    Blue,
    Green,
    Purple,
    Red,
    Teal,
}

/// A platform-neutral description of an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSpec {
    pub title: Option<String>,
    pub description: String,
    pub color: EmbedColor,
    pub author_name: Option<String>,
    pub author_icon: Option<String>,
}

/// A post sent through an outbound handle, shown under an arbitrary identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutboundPost {
    pub content: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub embed: Option<EmbedSpec>,
}

/// The message a relayed message was replying to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyContext {
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
}

/// An inbound, non-command chat message extracted from the platform event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub channel: ChannelId,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub reply_to: Option<ReplyContext>,
    /// Set when the platform says the message was posted by a webhook.
    pub webhook_origin: bool,
}

/// What the relay router did with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Message came from an outbound handle; relaying it would echo forever.
    IgnoredEcho,
    /// Channel is not in a call.
    NotPaired,
    /// Nothing text-like to forward (e.g. a sticker-only message).
    Empty,
    Forwarded { partner: ChannelId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_mention_the_configured_prefix() {
        assert_eq!(
            Notice::AlreadyInCall.render("r!"),
            "You are already in call! Type `r!hangup` to disconnect."
        );
        assert_eq!(
            Notice::NotInCall.render("~"),
            "You're not in call. Type `~call` to start one."
        );
    }

    #[test]
    fn pickup_notices_differ_per_side() {
        assert_ne!(
            Notice::PickedUp.render("r!"),
            Notice::PickedUpPartner.render("r!")
        );
    }
}
