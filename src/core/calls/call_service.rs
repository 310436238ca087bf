// Call session manager: call / hangup / skip on top of the pairing registry.
//
// The service owns the outbound-handle lifecycle. Handles are created when a
// call is picked up and deleted exactly once when it ends; a failed pickup
// never leaves a half-built pairing behind.

use super::calls_models::{
    Admission, CallOutcome, ChannelId, HangupOutcome, Notice, OutboundPost, SkipOutcome,
    TornDownPairing,
};
use super::pairing_registry::{PairingRegistry, RegistryError};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Failed to create outbound handle in channel {channel}: {reason}")]
    HandleCreation { channel: ChannelId, reason: String },

    #[error("Failed to delete outbound handle: {0}")]
    HandleDeletion(String),

    #[error("Failed to send message: {0}")]
    Send(String),
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

// ============================================================================
// PLATFORM PORT
// ============================================================================

/// What the call feature needs from the chat platform.
///
/// `Handle` is the platform's impersonation capability (a webhook on
/// Discord). Core never looks inside it.
#[async_trait]
pub trait CallPlatform: Send + Sync {
    type Handle: Clone + Debug + Send + Sync;

    /// Create a handle that posts into `channel`.
    async fn create_outbound_handle(
        &self,
        channel: ChannelId,
    ) -> Result<Self::Handle, PlatformError>;

    /// Delete the platform resource behind `handle`. Consumes it.
    async fn delete_outbound_handle(&self, handle: Self::Handle) -> Result<(), PlatformError>;

    /// Post a plain message as the bot itself.
    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError>;

    /// Post through an outbound handle under the identity given in `post`.
    async fn send_via_handle(
        &self,
        handle: &Self::Handle,
        post: &OutboundPost,
    ) -> Result<(), PlatformError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct CallService<P: CallPlatform> {
    platform: Arc<P>,
    registry: Arc<PairingRegistry<P::Handle>>,
    /// Command prefix, used when rendering notices.
    prefix: String,
}

impl<P: CallPlatform> CallService<P> {
    pub fn new(
        platform: Arc<P>,
        registry: Arc<PairingRegistry<P::Handle>>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            registry,
            prefix: prefix.into(),
        }
    }

    /// Join the oldest waiting channel, or start waiting.
    ///
    /// A waiting channel that cannot take a handle is dropped from the queue
    /// and the caller moves on to the next one. Only a failure on the caller's
    /// own side returns `Err`; the caller has been told by then and the
    /// partner is back at the head of the queue.
    pub async fn call(&self, channel: ChannelId) -> Result<CallOutcome, CallError> {
        loop {
            match self.registry.admit(channel).await {
                Admission::AlreadyInCall => {
                    self.notify(channel, Notice::AlreadyInCall).await;
                    return Ok(CallOutcome::AlreadyInCall);
                }
                Admission::AlreadyWaiting => {
                    self.notify(channel, Notice::StillWaiting).await;
                    return Ok(CallOutcome::StillWaiting);
                }
                Admission::Enqueued => {
                    tracing::info!(channel_id = channel, "Channel is waiting for a call");
                    self.notify(channel, Notice::Waiting).await;
                    return Ok(CallOutcome::Waiting);
                }
                Admission::Matched(partner) => {
                    let into_partner = match self.platform.create_outbound_handle(partner).await {
                        Ok(handle) => handle,
                        Err(e) => {
                            self.drop_unreachable_partner(channel, partner, e).await;
                            continue;
                        }
                    };
                    return self.pick_up(channel, partner, into_partner).await;
                }
            }
        }
    }

    async fn pick_up(
        &self,
        caller: ChannelId,
        partner: ChannelId,
        into_partner: P::Handle,
    ) -> Result<CallOutcome, CallError> {
        let into_caller = match self.platform.create_outbound_handle(caller).await {
            Ok(handle) => handle,
            Err(e) => return self.abort_pickup(caller, partner, into_partner, e).await,
        };

        let established = self
            .registry
            .establish(caller, partner, into_partner.clone(), into_caller.clone())
            .await;

        match established {
            Ok(()) => {
                tracing::info!(channel_id = caller, partner_id = partner, "Call picked up");
                self.notify(caller, Notice::PickedUp).await;
                self.notify(partner, Notice::PickedUpPartner).await;
                Ok(CallOutcome::Connected { partner })
            }
            // Another handler paired one side while we were creating handles.
            Err(e) => {
                tracing::warn!(
                    channel_id = caller,
                    partner_id = partner,
                    error = %e,
                    "Pairing changed during pickup"
                );
                self.release(into_partner).await;
                self.release(into_caller).await;
                self.recover_from_race(caller, partner, e).await
            }
        }
    }

    /// The waiting channel could not take a handle; it stays out of the queue.
    async fn drop_unreachable_partner(
        &self,
        caller: ChannelId,
        partner: ChannelId,
        error: PlatformError,
    ) {
        tracing::warn!(
            channel_id = caller,
            partner_id = partner,
            error = %error,
            "Waiting channel cannot take a call, removing it from the queue"
        );
        self.notify(partner, Notice::CallFailed).await;
    }

    /// Undo a pickup whose handle into the caller's channel failed.
    async fn abort_pickup(
        &self,
        caller: ChannelId,
        partner: ChannelId,
        into_partner: P::Handle,
        error: PlatformError,
    ) -> Result<CallOutcome, CallError> {
        tracing::warn!(
            channel_id = caller,
            partner_id = partner,
            error = %error,
            "Call pickup failed"
        );

        self.release(into_partner).await;

        if let Err(e) = self.registry.requeue_front(partner).await {
            tracing::debug!(partner_id = partner, error = %e, "Partner not requeued");
        }

        self.notify(caller, Notice::CallFailed).await;
        Err(error.into())
    }

    async fn recover_from_race(
        &self,
        caller: ChannelId,
        partner: ChannelId,
        error: RegistryError,
    ) -> Result<CallOutcome, CallError> {
        match error {
            // The caller got connected elsewhere; the partner goes back first
            // in line.
            RegistryError::AlreadyPaired(side) if side == caller => {
                if let Err(e) = self.registry.requeue_front(partner).await {
                    tracing::debug!(partner_id = partner, error = %e, "Partner not requeued");
                }
                self.notify(caller, Notice::AlreadyInCall).await;
                Ok(CallOutcome::AlreadyInCall)
            }
            // The partner got connected elsewhere; the caller waits instead.
            RegistryError::AlreadyPaired(_) => match self.registry.enqueue(caller).await {
                Ok(_) => {
                    self.notify(caller, Notice::Waiting).await;
                    Ok(CallOutcome::Waiting)
                }
                Err(_) => {
                    self.notify(caller, Notice::AlreadyInCall).await;
                    Ok(CallOutcome::AlreadyInCall)
                }
            },
            other => {
                self.notify(caller, Notice::CallFailed).await;
                Err(other.into())
            }
        }
    }

    /// End the channel's call. Not being in a call is a no-op.
    pub async fn hangup(&self, channel: ChannelId) -> HangupOutcome {
        let Some(torn) = self.registry.teardown(channel).await else {
            self.notify(channel, Notice::NotInCall).await;
            return HangupOutcome::NotInCall;
        };

        let partner = torn.partner;
        let duration = Utc::now() - torn.connected_at;
        tracing::info!(
            channel_id = channel,
            partner_id = partner,
            duration_secs = duration.num_seconds(),
            "Call hung up"
        );

        self.release_pairing(torn).await;
        self.notify(channel, Notice::YouHungUp).await;
        self.notify(partner, Notice::PartnerHungUp).await;

        HangupOutcome::HungUp { partner }
    }

    /// Hang up and immediately look for the next call.
    ///
    /// The two halves run one after the other; another channel's `call` can
    /// slip in between them.
    pub async fn skip(&self, channel: ChannelId) -> Result<SkipOutcome, CallError> {
        if !self.registry.is_paired(channel).await {
            self.notify(channel, Notice::NotInCall).await;
            return Ok(SkipOutcome::NotInCall);
        }

        let previous_partner = match self.hangup(channel).await {
            HangupOutcome::HungUp { partner } => partner,
            HangupOutcome::NotInCall => return Ok(SkipOutcome::NotInCall),
        };

        let next = self.call(channel).await?;
        Ok(SkipOutcome::Skipped {
            previous_partner,
            next,
        })
    }

    /// End every call and empty the queue. Returns how many calls were ended.
    pub async fn hang_up_all(&self) -> usize {
        let released = self.registry.drain().await;
        let count = released.len();

        for torn in released {
            let (channel, partner) = (torn.channel, torn.partner);
            self.release_pairing(torn).await;
            self.notify(channel, Notice::ServiceClosing).await;
            self.notify(partner, Notice::ServiceClosing).await;
        }

        if count > 0 {
            tracing::info!(calls = count, "Ended all active calls");
        }
        count
    }

    async fn release_pairing(&self, torn: TornDownPairing<P::Handle>) {
        self.release(torn.my_handle).await;
        self.release(torn.partner_handle).await;
    }

    /// Delete a handle. Failures are logged; the disconnect stands regardless.
    async fn release(&self, handle: P::Handle) {
        if let Err(e) = self.platform.delete_outbound_handle(handle).await {
            tracing::warn!(error = %e, "Failed to release outbound handle");
        }
    }

    async fn notify(&self, channel: ChannelId, notice: Notice) {
        let text = notice.render(&self.prefix);
        if let Err(e) = self.platform.send_text(channel, &text).await {
            tracing::warn!(channel_id = channel, error = %e, "Failed to send call notice");
        }
    }
}
