// Recording CallPlatform used by the call and relay tests.

use super::call_service::{CallPlatform, PlatformError};
use super::calls_models::{ChannelId, OutboundPost};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Holds one handle creation until the test lets it through.
#[derive(Default)]
pub struct CreateGate {
    /// Signalled once the held creation has started waiting.
    pub reached: Notify,
    /// Signal to let the held creation finish.
    pub release: Notify,
}

/// Handles are plain ids; `handles` remembers which channel each posts into.
pub struct FakePlatform {
    next_handle: AtomicU64,
    handles: DashMap<u64, ChannelId>,
    created: Mutex<Vec<u64>>,
    deleted: Mutex<Vec<u64>>,
    texts: Mutex<Vec<(ChannelId, String)>>,
    posts: Mutex<Vec<(ChannelId, OutboundPost)>>,
    failing_creates: DashSet<ChannelId>,
    gates: DashMap<ChannelId, Arc<CreateGate>>,
    failing_deletes: AtomicBool,
    failing_posts: AtomicBool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            handles: DashMap::new(),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            texts: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
            failing_creates: DashSet::new(),
            gates: DashMap::new(),
            failing_deletes: AtomicBool::new(false),
            failing_posts: AtomicBool::new(false),
        }
    }

    pub fn fail_creates_in(&self, channel: ChannelId) {
        self.failing_creates.insert(channel);
    }

    pub fn allow_creates(&self) {
        self.failing_creates.clear();
    }

    /// Suspend the next handle creation into `channel` until the gate opens.
    pub fn hold_next_create_in(&self, channel: ChannelId) -> Arc<CreateGate> {
        let gate = Arc::new(CreateGate::default());
        self.gates.insert(channel, Arc::clone(&gate));
        gate
    }

    pub fn fail_deletes(&self) {
        self.failing_deletes.store(true, Ordering::SeqCst);
    }

    pub fn fail_posts(&self) {
        self.failing_posts.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> Vec<u64> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn handle_channel(&self, handle: u64) -> Option<ChannelId> {
        self.handles.get(&handle).map(|entry| *entry)
    }

    pub fn texts_for(&self, channel: ChannelId) -> Vec<String> {
        self.texts
            .lock()
            .unwrap()
            .iter()
            .filter(|(target, _)| *target == channel)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Posts that arrived in `channel` through a handle.
    pub fn posts_into(&self, channel: ChannelId) -> Vec<OutboundPost> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(target, _)| *target == channel)
            .map(|(_, post)| post.clone())
            .collect()
    }
}

#[async_trait]
impl CallPlatform for FakePlatform {
    type Handle = u64;

    async fn create_outbound_handle(&self, channel: ChannelId) -> Result<u64, PlatformError> {
        let gate = self.gates.remove(&channel).map(|(_, gate)| gate);
        if let Some(gate) = gate {
            gate.reached.notify_one();
            gate.release.notified().await;
        }
        if self.failing_creates.contains(&channel) {
            return Err(PlatformError::HandleCreation {
                channel,
                reason: "Missing Permissions".to_string(),
            });
        }
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.handles.insert(handle, channel);
        self.created.lock().unwrap().push(handle);
        Ok(handle)
    }

    async fn delete_outbound_handle(&self, handle: u64) -> Result<(), PlatformError> {
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(PlatformError::HandleDeletion("Unknown Webhook".to_string()));
        }
        self.deleted.lock().unwrap().push(handle);
        Ok(())
    }

    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError> {
        self.texts.lock().unwrap().push((channel, text.to_string()));
        Ok(())
    }

    async fn send_via_handle(
        &self,
        handle: &u64,
        post: &OutboundPost,
    ) -> Result<(), PlatformError> {
        if self.failing_posts.load(Ordering::SeqCst) {
            return Err(PlatformError::Send("Unknown Channel".to_string()));
        }
        let channel = self
            .handle_channel(*handle)
            .ok_or_else(|| PlatformError::Send(format!("unknown handle {handle}")))?;
        self.posts.lock().unwrap().push((channel, post.clone()));
        Ok(())
    }
}
