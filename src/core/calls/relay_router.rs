// Relay router: forwards ordinary chat messages across an active call.
//
// The router only reads the registry. A failed send is reported to the
// caller and logged; the pairing stays as it is until someone hangs up.

use super::call_service::{CallError, CallPlatform};
use super::calls_models::{
    ChannelId, EmbedColor, EmbedSpec, InboundMessage, OutboundPost, RelayOutcome,
};
use super::pairing_registry::PairingRegistry;
use std::sync::Arc;

pub struct RelayRouter<P: CallPlatform> {
    platform: Arc<P>,
    registry: Arc<PairingRegistry<P::Handle>>,
}

impl<P: CallPlatform> RelayRouter<P> {
    pub fn new(platform: Arc<P>, registry: Arc<PairingRegistry<P::Handle>>) -> Self {
        Self { platform, registry }
    }

    /// Forward `message` into the partner channel, if its channel is in a call.
    pub async fn relay(&self, message: &InboundMessage) -> Result<RelayOutcome, CallError> {
        // Our own webhook posts come back as inbound messages.
        if message.webhook_origin {
            return Ok(RelayOutcome::IgnoredEcho);
        }

        let Some((partner, handle)) = self.registry.lookup(message.channel).await else {
            return Ok(RelayOutcome::NotPaired);
        };

        let post = build_relay_post(message);
        if post.content.is_none() && post.embed.is_none() {
            return Ok(RelayOutcome::Empty);
        }

        if let Err(e) = self.platform.send_via_handle(&handle, &post).await {
            tracing::warn!(
                channel_id = message.channel,
                partner_id = partner,
                error = %e,
                "Failed to relay message"
            );
            return Err(e.into());
        }

        Ok(RelayOutcome::Forwarded { partner })
    }

    /// Post `post` into the partner channel of `channel`.
    ///
    /// Returns the partner when the channel is in a call, `None` otherwise.
    pub async fn mirror_to_partner(
        &self,
        channel: ChannelId,
        post: &OutboundPost,
    ) -> Result<Option<ChannelId>, CallError> {
        let Some((partner, handle)) = self.registry.lookup(channel).await else {
            return Ok(None);
        };

        self.platform.send_via_handle(&handle, post).await?;
        Ok(Some(partner))
    }
}

/// Build the impersonated post for a relayed message.
///
/// Replies carry a quote of the original message as an embed, since the
/// platform's own reply link cannot cross channels.
pub fn build_relay_post(message: &InboundMessage) -> OutboundPost {
    let embed = message.reply_to.as_ref().map(|original| EmbedSpec {
        title: None,
        description: original.content.clone(),
        color: EmbedColor::Blue,
        author_name: Some(original.author_name.clone()),
        author_icon: original.author_avatar.clone(),
    });

    OutboundPost {
        content: Some(message.content.clone()).filter(|content| !content.is_empty()),
        display_name: Some(message.author_name.clone()),
        avatar_url: message.author_avatar.clone(),
        embed,
    }
}
