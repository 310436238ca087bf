// The pairing registry: waiting queue plus pairing table.
//
// This is the only stateful piece of the call feature. Both collections live
// behind ONE mutex so every mutation is a single critical section: nobody can
// observe a channel that is half-paired, or queued and paired at once.
//
// Invariants held between lock acquisitions:
// - a channel is in at most one of {queue, table}
// - the queue has no duplicates
// - A -> (B, h) in the table implies B -> (A, h') in the table

use super::calls_models::{Admission, ChannelId, PairingEntry, TornDownPairing};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Channel {0} is already in a call")]
    AlreadyInCall(ChannelId),

    #[error("Channel {0} is already paired")]
    AlreadyPaired(ChannelId),

    #[error("A channel cannot be paired with itself ({0})")]
    SelfPairing(ChannelId),
}

struct RegistryState<H> {
    waiting: VecDeque<ChannelId>,
    pairings: HashMap<ChannelId, PairingEntry<H>>,
}

impl<H> RegistryState<H> {
    fn is_waiting(&self, channel: ChannelId) -> bool {
        self.waiting.contains(&channel)
    }

    fn remove_waiting(&mut self, channel: ChannelId) {
        self.waiting.retain(|queued| *queued != channel);
    }
}

/// Owned registry, created once in `main` and shared through `Arc`.
pub struct PairingRegistry<H> {
    state: Mutex<RegistryState<H>>,
}

impl<H: Clone + Send> PairingRegistry<H> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                waiting: VecDeque::new(),
                pairings: HashMap::new(),
            }),
        }
    }

    /// Append `channel` to the waiting queue.
    ///
    /// Returns `Ok(false)` when the channel was already queued; it keeps its
    /// original slot.
    pub async fn enqueue(&self, channel: ChannelId) -> Result<bool, RegistryError> {
        let mut state = self.state.lock().await;
        if state.pairings.contains_key(&channel) {
            return Err(RegistryError::AlreadyInCall(channel));
        }
        if state.is_waiting(channel) {
            return Ok(false);
        }
        state.waiting.push_back(channel);
        Ok(true)
    }

    /// Pop the channel that has been waiting the longest.
    #[cfg(test)]
    pub async fn dequeue_oldest(&self) -> Option<ChannelId> {
        self.state.lock().await.waiting.pop_front()
    }

    /// Put a channel back at the head of the queue after a failed pickup.
    pub async fn requeue_front(&self, channel: ChannelId) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;
        if state.pairings.contains_key(&channel) {
            return Err(RegistryError::AlreadyInCall(channel));
        }
        state.remove_waiting(channel);
        state.waiting.push_front(channel);
        Ok(())
    }

    /// Check-then-match-or-enqueue as one step.
    ///
    /// The caller is never matched with itself and never queued twice. Calls
    /// match through here rather than `dequeue_oldest`, so the check and the
    /// pop share one lock.
    pub async fn admit(&self, channel: ChannelId) -> Admission {
        let mut state = self.state.lock().await;
        if state.pairings.contains_key(&channel) {
            return Admission::AlreadyInCall;
        }
        if state.is_waiting(channel) {
            return Admission::AlreadyWaiting;
        }
        match state.waiting.pop_front() {
            Some(partner) => Admission::Matched(partner),
            None => {
                state.waiting.push_back(channel);
                Admission::Enqueued
            }
        }
    }

    /// Insert both directed entries of a pairing.
    ///
    /// `a_to_b` posts into `b`, `b_to_a` posts into `a`. Both channels are
    /// also dropped from the waiting queue in case either re-queued while its
    /// handles were being created.
    pub async fn establish(
        &self,
        a: ChannelId,
        b: ChannelId,
        a_to_b: H,
        b_to_a: H,
    ) -> Result<(), RegistryError> {
        if a == b {
            return Err(RegistryError::SelfPairing(a));
        }

        let mut state = self.state.lock().await;
        for side in [a, b] {
            if state.pairings.contains_key(&side) {
                return Err(RegistryError::AlreadyPaired(side));
            }
        }

        state.remove_waiting(a);
        state.remove_waiting(b);

        let connected_at = Utc::now();
        state.pairings.insert(
            a,
            PairingEntry {
                partner: b,
                outbound: a_to_b,
                connected_at,
            },
        );
        state.pairings.insert(
            b,
            PairingEntry {
                partner: a,
                outbound: b_to_a,
                connected_at,
            },
        );
        Ok(())
    }

    /// Partner and the handle that posts into the partner's channel.
    pub async fn lookup(&self, channel: ChannelId) -> Option<(ChannelId, H)> {
        self.state
            .lock()
            .await
            .pairings
            .get(&channel)
            .map(|entry| (entry.partner, entry.outbound.clone()))
    }

    /// Remove both directed entries and hand the two handles back.
    pub async fn teardown(&self, channel: ChannelId) -> Option<TornDownPairing<H>> {
        let mut state = self.state.lock().await;
        Self::teardown_locked(&mut state, channel)
    }

    fn teardown_locked(
        state: &mut RegistryState<H>,
        channel: ChannelId,
    ) -> Option<TornDownPairing<H>> {
        let mine = state.pairings.remove(&channel)?;
        match state.pairings.remove(&mine.partner) {
            Some(theirs) => Some(TornDownPairing {
                channel,
                partner: mine.partner,
                my_handle: mine.outbound,
                partner_handle: theirs.outbound,
                connected_at: mine.connected_at,
            }),
            None => {
                // The table is only written in pairs; put the entry back
                // rather than hand out a single handle.
                tracing::error!(
                    channel_id = channel,
                    partner_id = mine.partner,
                    "Pairing table held a one-sided entry"
                );
                state.pairings.insert(channel, mine);
                None
            }
        }
    }

    /// Tear down every pairing and clear the queue, e.g. on shutdown.
    pub async fn drain(&self) -> Vec<TornDownPairing<H>> {
        let mut state = self.state.lock().await;
        state.waiting.clear();

        let mut channels: Vec<ChannelId> = state.pairings.keys().copied().collect();
        channels.sort_unstable();

        let mut released = Vec::new();
        for channel in channels {
            if let Some(pairing) = Self::teardown_locked(&mut state, channel) {
                released.push(pairing);
            }
        }
        released
    }

    pub async fn is_paired(&self, channel: ChannelId) -> bool {
        self.state.lock().await.pairings.contains_key(&channel)
    }

    #[cfg(test)]
    pub async fn is_waiting(&self, channel: ChannelId) -> bool {
        self.state.lock().await.is_waiting(channel)
    }

    /// Channels currently waiting, oldest first.
    #[cfg(test)]
    pub async fn waiting_channels(&self) -> Vec<ChannelId> {
        self.state.lock().await.waiting.iter().copied().collect()
    }

    /// Number of active calls (each call counts once).
    #[cfg(test)]
    pub async fn active_calls(&self) -> usize {
        self.state.lock().await.pairings.len() / 2
    }
}

impl<H: Clone + Send> Default for PairingRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Registry = PairingRegistry<&'static str>;

    #[tokio::test]
    async fn dequeue_is_first_in_first_out() {
        let registry = Registry::new();
        for channel in [1, 2, 3] {
            assert_eq!(registry.enqueue(channel).await, Ok(true));
        }

        assert_eq!(registry.dequeue_oldest().await, Some(1));
        assert_eq!(registry.dequeue_oldest().await, Some(2));
        assert_eq!(registry.dequeue_oldest().await, Some(3));
        assert_eq!(registry.dequeue_oldest().await, None);
    }

    #[tokio::test]
    async fn enqueue_suppresses_duplicates() {
        let registry = Registry::new();
        assert_eq!(registry.enqueue(7).await, Ok(true));
        assert_eq!(registry.enqueue(8).await, Ok(true));
        assert_eq!(registry.enqueue(7).await, Ok(false));

        assert_eq!(registry.waiting_channels().await, vec![7, 8]);
    }

    #[tokio::test]
    async fn enqueue_rejects_paired_channel() {
        let registry = Registry::new();
        registry.establish(1, 2, "1->2", "2->1").await.unwrap();

        assert_eq!(
            registry.enqueue(2).await,
            Err(RegistryError::AlreadyInCall(2))
        );
        assert!(registry.waiting_channels().await.is_empty());
    }

    #[tokio::test]
    async fn establish_writes_both_sides() {
        let registry = Registry::new();
        registry.establish(100, 200, "100->200", "200->100").await.unwrap();

        assert_eq!(registry.lookup(100).await, Some((200, "100->200")));
        assert_eq!(registry.lookup(200).await, Some((100, "200->100")));
        assert_eq!(registry.active_calls().await, 1);
    }

    #[tokio::test]
    async fn establish_fails_when_either_side_is_paired() {
        let registry = Registry::new();
        registry.establish(1, 2, "1->2", "2->1").await.unwrap();

        assert_eq!(
            registry.establish(3, 2, "3->2", "2->3").await,
            Err(RegistryError::AlreadyPaired(2))
        );
        // The failed attempt left nothing behind for channel 3.
        assert_eq!(registry.lookup(3).await, None);
        assert_eq!(registry.lookup(2).await, Some((1, "2->1")));
    }

    #[tokio::test]
    async fn establish_refuses_self_pairing() {
        let registry = Registry::new();
        assert_eq!(
            registry.establish(5, 5, "a", "b").await,
            Err(RegistryError::SelfPairing(5))
        );
    }

    #[tokio::test]
    async fn establish_removes_both_channels_from_queue() {
        let registry = Registry::new();
        registry.enqueue(1).await.unwrap();
        registry.enqueue(2).await.unwrap();
        registry.enqueue(3).await.unwrap();

        registry.establish(1, 3, "1->3", "3->1").await.unwrap();

        assert_eq!(registry.waiting_channels().await, vec![2]);
    }

    #[tokio::test]
    async fn teardown_removes_both_sides_and_returns_handles() {
        let registry = Registry::new();
        registry.establish(100, 200, "100->200", "200->100").await.unwrap();

        let torn = registry.teardown(200).await.unwrap();
        assert_eq!(torn.channel, 200);
        assert_eq!(torn.partner, 100);
        assert_eq!(torn.my_handle, "200->100");
        assert_eq!(torn.partner_handle, "100->200");

        assert_eq!(registry.lookup(100).await, None);
        assert_eq!(registry.lookup(200).await, None);
        assert!(registry.teardown(100).await.is_none());
    }

    #[tokio::test]
    async fn admit_matches_oldest_or_enqueues() {
        let registry = Registry::new();
        assert_eq!(registry.admit(1).await, Admission::Enqueued);
        assert_eq!(registry.admit(1).await, Admission::AlreadyWaiting);
        assert_eq!(registry.admit(2).await, Admission::Matched(1));
        assert!(registry.waiting_channels().await.is_empty());
    }

    #[tokio::test]
    async fn admit_reports_paired_channel() {
        let registry = Registry::new();
        registry.establish(1, 2, "1->2", "2->1").await.unwrap();
        assert_eq!(registry.admit(1).await, Admission::AlreadyInCall);
    }

    #[tokio::test]
    async fn requeue_front_jumps_the_line_once() {
        let registry = Registry::new();
        registry.enqueue(2).await.unwrap();
        registry.enqueue(1).await.unwrap();

        registry.requeue_front(1).await.unwrap();
        assert_eq!(registry.waiting_channels().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn drain_releases_each_pairing_once() {
        let registry = Registry::new();
        registry.establish(1, 2, "1->2", "2->1").await.unwrap();
        registry.establish(3, 4, "3->4", "4->3").await.unwrap();
        registry.enqueue(9).await.unwrap();

        let released = registry.drain().await;
        assert_eq!(released.len(), 2);
        assert_eq!(registry.active_calls().await, 0);
        assert!(registry.waiting_channels().await.is_empty());
    }
}
