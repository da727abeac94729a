//! Change feed transport for Markline.
//!
//! A transport hands out per-owner subscriptions that deliver
//! [`FeedMessage`]s over a channel. Dropping the subscription (or its
//! [`SubscriptionGuard`]) unsubscribes synchronously.
//!
//! [`LocalChangeFeed`] is the in-process implementation: the SQLite store
//! publishes every committed insert/delete to it, and it fans each event out to
//! the subscribers registered for the event's owner. It can be interrupted and
//! restored to reproduce a transport outage, during which published events are
//! dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::types::bookmark::OwnerId;
use crate::types::errors::FeedError;
use crate::types::feed::{ChangeEvent, FeedMessage, FeedStatus};

/// Transport that streams insert/delete events filtered by owner.
#[async_trait]
pub trait ChangeFeedTransport: Send + Sync {
    /// Opens a subscription that only ever receives events for `owner_id`.
    async fn subscribe(&self, owner_id: &OwnerId) -> Result<FeedSubscription, FeedError>;
}

/// Releases a subscription when dropped.
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unsubscribes now instead of at drop.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.run_release();
    }
}

/// A live subscription: the message channel plus the guard that keeps it
/// registered with the transport.
pub struct FeedSubscription {
    owner_id: OwnerId,
    receiver: UnboundedReceiver<FeedMessage>,
    guard: SubscriptionGuard,
}

impl FeedSubscription {
    pub fn new(
        owner_id: OwnerId,
        receiver: UnboundedReceiver<FeedMessage>,
        guard: SubscriptionGuard,
    ) -> Self {
        Self {
            owner_id,
            receiver,
            guard,
        }
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Waits for the next message. `None` once the transport closed the channel.
    pub async fn recv(&mut self) -> Option<FeedMessage> {
        self.receiver.recv().await
    }

    /// Returns the next buffered message without waiting.
    pub fn try_recv(&mut self) -> Option<FeedMessage> {
        self.receiver.try_recv().ok()
    }

    /// Separates the channel from the guard so a consumer task can own the
    /// receiver while the caller controls when to unsubscribe.
    pub fn into_parts(self) -> (OwnerId, UnboundedReceiver<FeedMessage>, SubscriptionGuard) {
        (self.owner_id, self.receiver, self.guard)
    }

    pub fn unsubscribe(self) {
        self.guard.release();
    }
}

struct Subscriber {
    owner_id: OwnerId,
    sender: UnboundedSender<FeedMessage>,
}

struct FeedState {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
    connected: bool,
    closed: bool,
    dropped_events: u64,
}

/// In-process change feed shared by a durable store and its sessions.
#[derive(Clone)]
pub struct LocalChangeFeed {
    state: Arc<Mutex<FeedState>>,
}

impl Default for LocalChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalChangeFeed {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState {
                next_id: 0,
                subscribers: HashMap::new(),
                connected: true,
                closed: false,
                dropped_events: 0,
            })),
        }
    }

    /// Delivers `event` to every subscriber of the event's owner.
    ///
    /// Returns the number of subscribers reached. While interrupted, the event
    /// is counted as dropped and nobody receives it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut state = self.lock();
        if !state.connected {
            state.dropped_events += 1;
            debug!(
                "[Feed] Dropped event for bookmark {} of {} while disconnected",
                event.bookmark_id(),
                event.owner_id()
            );
            return 0;
        }

        let owner_id = event.owner_id().clone();
        let mut delivered = 0;
        let mut gone = Vec::new();
        for (id, sub) in state.subscribers.iter() {
            if sub.owner_id != owner_id {
                continue;
            }
            if sub.sender.send(FeedMessage::Change(event.clone())).is_ok() {
                delivered += 1;
            } else {
                gone.push(*id);
            }
        }
        for id in gone {
            state.subscribers.remove(&id);
        }
        delivered
    }

    /// Simulates a transport outage: subscribers are told, and events published
    /// until [`restore`](Self::restore) are lost.
    pub fn interrupt(&self, reason: &str) {
        let mut state = self.lock();
        if !state.connected {
            return;
        }
        state.connected = false;
        warn!("[Feed] Transport interrupted: {}", reason);
        Self::broadcast(
            &state,
            FeedStatus::Disconnected {
                reason: reason.to_string(),
            },
        );
    }

    /// Ends an outage started by [`interrupt`](Self::interrupt).
    pub fn restore(&self) {
        let mut state = self.lock();
        if state.connected {
            return;
        }
        state.connected = true;
        info!("[Feed] Transport restored");
        Self::broadcast(&state, FeedStatus::Reconnected);
    }

    /// Shuts the transport down. Open subscriptions see their channel end and
    /// new subscriptions are refused.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Events lost to outages since creation.
    pub fn dropped_events(&self) -> u64 {
        self.lock().dropped_events
    }

    fn broadcast(state: &FeedState, status: FeedStatus) {
        for sub in state.subscribers.values() {
            let _ = sub.sender.send(FeedMessage::Status(status.clone()));
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unsubscribe(state: &Weak<Mutex<FeedState>>, id: u64) {
        if let Some(state) = state.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.subscribers.remove(&id).is_some() {
                debug!("[Feed] Subscription {} released", id);
            }
        }
    }
}

#[async_trait]
impl ChangeFeedTransport for LocalChangeFeed {
    async fn subscribe(&self, owner_id: &OwnerId) -> Result<FeedSubscription, FeedError> {
        let (sender, receiver) = mpsc::unbounded_channel();

        let id = {
            let mut state = self.lock();
            if state.closed {
                return Err(FeedError::Closed);
            }
            let id = state.next_id;
            state.next_id += 1;
            let status = if state.connected {
                FeedStatus::Connected
            } else {
                FeedStatus::Disconnected {
                    reason: "transport offline".to_string(),
                }
            };
            let _ = sender.send(FeedMessage::Status(status));
            state.subscribers.insert(
                id,
                Subscriber {
                    owner_id: owner_id.clone(),
                    sender,
                },
            );
            id
        };

        debug!("[Feed] Subscription {} opened for {}", id, owner_id);
        let weak = Arc::downgrade(&self.state);
        let guard = SubscriptionGuard::new(move || Self::unsubscribe(&weak, id));
        Ok(FeedSubscription::new(owner_id.clone(), receiver, guard))
    }
}
