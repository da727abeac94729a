//! Change Feed Listener for Markline.
//!
//! Drains a [`FeedSubscription`] on a tokio task and forwards each event to
//! the session's [`SharedStore`]. The listener does no deduplication of its
//! own; duplicated or reordered deliveries are absorbed by the store.
//!
//! Detaching closes a gate before releasing the subscription, so once
//! [`FeedListener::detach`] returns no further event reaches the store, even
//! one already buffered in the channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::managers::reconciliation_store::SharedStore;
use crate::services::change_feed::{FeedSubscription, SubscriptionGuard};
use crate::services::durable_store::DurableStore;
use crate::types::bookmark::OwnerId;
use crate::types::feed::{FeedMessage, FeedStatus};

/// Counters kept while the listener runs.
#[derive(Debug, Default)]
struct Counters {
    applied: AtomicU64,
    ignored: AtomicU64,
    disconnects: AtomicU64,
    resyncs: AtomicU64,
}

/// Point-in-time copy of the listener counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerStats {
    /// Events that changed the store.
    pub applied: u64,
    /// Events the store absorbed as no-ops (echoes, duplicates, stale deletes).
    pub ignored: u64,
    /// Transport disconnects observed. Events published during each outage are lost.
    pub disconnects: u64,
    /// Full re-fetches performed after a reconnect.
    pub resyncs: u64,
}

/// Where to re-fetch the owner's list after the transport reconnects.
pub type ResyncSource = Arc<dyn DurableStore>;

/// Live subscription feeding a [`SharedStore`].
pub struct FeedListener {
    owner_id: OwnerId,
    gate: Arc<Mutex<bool>>,
    counters: Arc<Counters>,
    guard: Option<SubscriptionGuard>,
    task: Option<JoinHandle<()>>,
}

impl FeedListener {
    /// Starts forwarding `subscription` into `store`.
    ///
    /// Messages already buffered in the subscription are applied first, in
    /// order. With `resync` set, every `Reconnected` status re-seeds the store
    /// from the durable store. Must be called from within a tokio runtime.
    pub fn attach(
        subscription: FeedSubscription,
        store: SharedStore,
        resync: Option<ResyncSource>,
    ) -> Self {
        let (owner_id, receiver, guard) = subscription.into_parts();
        let gate = Arc::new(Mutex::new(true));
        let counters = Arc::new(Counters::default());

        let task = tokio::spawn(Self::run(
            owner_id.clone(),
            receiver,
            store,
            resync,
            Arc::clone(&gate),
            Arc::clone(&counters),
        ));

        info!("[Listener] Attached for {}", owner_id);
        Self {
            owner_id,
            gate,
            counters,
            guard: Some(guard),
            task: Some(task),
        }
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn is_attached(&self) -> bool {
        self.guard.is_some()
    }

    pub fn stats(&self) -> ListenerStats {
        ListenerStats {
            applied: self.counters.applied.load(Ordering::Relaxed),
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            disconnects: self.counters.disconnects.load(Ordering::Relaxed),
            resyncs: self.counters.resyncs.load(Ordering::Relaxed),
        }
    }

    /// Stops delivery and releases the subscription.
    pub fn detach(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = false;
        guard.release();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        info!("[Listener] Detached for {}", self.owner_id);
    }

    async fn run(
        owner_id: OwnerId,
        mut receiver: UnboundedReceiver<FeedMessage>,
        store: SharedStore,
        resync: Option<ResyncSource>,
        gate: Arc<Mutex<bool>>,
        counters: Arc<Counters>,
    ) {
        while let Some(message) = receiver.recv().await {
            match message {
                FeedMessage::Change(event) => {
                    let open = gate.lock().unwrap_or_else(PoisonError::into_inner);
                    if !*open {
                        break;
                    }
                    if store.apply(&event) {
                        counters.applied.fetch_add(1, Ordering::Relaxed);
                    } else {
                        counters.ignored.fetch_add(1, Ordering::Relaxed);
                    }
                }
                FeedMessage::Status(FeedStatus::Connected) => {
                    debug!("[Listener] Feed connected for {}", owner_id);
                }
                FeedMessage::Status(FeedStatus::Disconnected { reason }) => {
                    counters.disconnects.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "[Listener] Feed disconnected for {}: {}; changes made until reconnect will not arrive",
                        owner_id, reason
                    );
                }
                FeedMessage::Status(FeedStatus::Reconnected) => {
                    info!("[Listener] Feed reconnected for {}", owner_id);
                    if let Some(source) = &resync {
                        Self::resync(&owner_id, source.as_ref(), &store, &gate, &counters).await;
                    }
                }
            }
        }
        debug!("[Listener] Feed channel closed for {}", owner_id);
    }

    async fn resync(
        owner_id: &OwnerId,
        source: &dyn DurableStore,
        store: &SharedStore,
        gate: &Mutex<bool>,
        counters: &Counters,
    ) {
        match source.list_by_owner(owner_id).await {
            Ok(records) => {
                let open = gate.lock().unwrap_or_else(PoisonError::into_inner);
                if !*open {
                    return;
                }
                info!("[Listener] Re-seeding {} bookmarks after reconnect", records.len());
                store.seed(records);
                counters.resyncs.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!("[Listener] Resync after reconnect failed: {}", e),
        }
    }
}

impl Drop for FeedListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}
