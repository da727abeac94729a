//! Bookmark session for Markline.
//!
//! A [`BookmarkSession`] is one signed-in view of an owner's bookmarks: it
//! owns the reconciliation store, the feed listener attached to it, and the
//! coordinator for the user's own add/delete actions. Collaborators are
//! injected through [`SessionDeps`] so tests can substitute fakes.

use std::sync::Arc;

use log::info;

use crate::managers::feed_listener::{FeedListener, ListenerStats};
use crate::managers::mutation_coordinator::MutationCoordinator;
use crate::managers::reconciliation_store::SharedStore;
use crate::managers::view_projection;
use crate::services::change_feed::ChangeFeedTransport;
use crate::services::durable_store::DurableStore;
use crate::services::session_provider::SessionProvider;
use crate::types::bookmark::{Bookmark, BookmarkRow, OwnerId};
use crate::types::errors::{MutationError, SessionError};

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct SessionDeps {
    pub session: Arc<dyn SessionProvider>,
    pub durable: Arc<dyn DurableStore>,
    pub feed: Arc<dyn ChangeFeedTransport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Re-seed from the durable store whenever the feed reconnects.
    pub resync_on_reconnect: bool,
}

pub struct BookmarkSession {
    owner_id: OwnerId,
    store: SharedStore,
    coordinator: MutationCoordinator,
    listener: FeedListener,
}

impl BookmarkSession {
    /// Starts a session for the currently signed-in owner.
    ///
    /// The feed subscription is opened before the bulk load and its buffered
    /// events are applied after `seed`, so changes made while the load is in
    /// flight are not lost. Fails without leaving a subscription behind.
    pub async fn start(deps: &SessionDeps, options: SessionOptions) -> Result<Self, SessionError> {
        let owner_id = deps
            .session
            .current_session()
            .await
            .ok_or(SessionError::NotAuthenticated)?;

        let subscription = deps
            .feed
            .subscribe(&owner_id)
            .await
            .map_err(SessionError::SubscribeFailed)?;

        let records = deps
            .durable
            .list_by_owner(&owner_id)
            .await
            .map_err(SessionError::LoadFailed)?;

        let store = SharedStore::new(owner_id.clone());
        store.seed(records);

        let resync = options
            .resync_on_reconnect
            .then(|| Arc::clone(&deps.durable));
        let listener = FeedListener::attach(subscription, store.clone(), resync);
        let coordinator =
            MutationCoordinator::new(owner_id.clone(), store.clone(), Arc::clone(&deps.durable));

        info!(
            "[Session] Started for {} with {} bookmarks",
            owner_id,
            store.len()
        );
        Ok(Self {
            owner_id,
            store,
            coordinator,
            listener,
        })
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Handle to the session's store, for readers that outlive a single call.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Handle for running add/delete without borrowing the session.
    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }

    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.store.snapshot()
    }

    pub fn rows(&self) -> Vec<BookmarkRow> {
        view_projection::project(&self.store.snapshot())
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }

    pub fn listener_stats(&self) -> ListenerStats {
        self.listener.stats()
    }

    pub async fn add(&self, title: &str, url: &str) -> Result<Bookmark, MutationError> {
        self.coordinator.add(title, url).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), MutationError> {
        self.coordinator.delete(id).await
    }

    /// Ends the session. The feed is detached before this returns.
    pub fn end(self) {
        info!("[Session] Ending for {}", self.owner_id);
        self.listener.detach();
    }
}
