//! Optimistic Mutation Coordinator for Markline.
//!
//! Add is confirm-then-apply: the bookmark enters the local list only after
//! the durable store returns it. Delete is apply-then-confirm: the bookmark
//! leaves the local list before the durable call, and is not put back if that
//! call fails.

use std::sync::Arc;

use log::{debug, warn};
use url::Url;

use crate::managers::reconciliation_store::SharedStore;
use crate::services::durable_store::DurableStore;
use crate::types::bookmark::{Bookmark, NewBookmark, OwnerId};
use crate::types::errors::{MutationError, ValidationError};

/// Checks a title/url pair before it is sent anywhere.
///
/// Both values are trimmed; the title must be non-empty and the url must parse
/// as an absolute URL.
pub fn validate(title: &str, url: &str) -> Result<NewBookmark, ValidationError> {
    let title = title.trim();
    let url = url.trim();

    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    Url::parse(url).map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", url, e)))?;

    Ok(NewBookmark {
        title: title.to_string(),
        url: url.to_string(),
    })
}

/// Runs the current user's add/delete actions against the durable store and
/// the session's local list.
#[derive(Clone)]
pub struct MutationCoordinator {
    owner_id: OwnerId,
    store: SharedStore,
    durable: Arc<dyn DurableStore>,
}

impl MutationCoordinator {
    pub fn new(owner_id: OwnerId, store: SharedStore, durable: Arc<dyn DurableStore>) -> Self {
        Self {
            owner_id,
            store,
            durable,
        }
    }

    /// Validates, persists, and then inserts a new bookmark.
    ///
    /// The feed echo of the same creation may land before or after the local
    /// insert; either way the list ends up with one copy.
    pub async fn add(&self, title: &str, url: &str) -> Result<Bookmark, MutationError> {
        let new = validate(title, url)?;

        let bookmark = self
            .durable
            .create(&self.owner_id, &new.title, &new.url)
            .await
            .map_err(|e| {
                warn!("[Coordinator] Create failed for {}: {}", self.owner_id, e);
                MutationError::AddFailed(e.to_string())
            })?;

        if !self.store.insert(bookmark.clone()) {
            debug!("[Coordinator] Bookmark {} already arrived via feed", bookmark.id);
        }
        Ok(bookmark)
    }

    /// Removes the bookmark locally, then deletes it durably.
    ///
    /// On failure the bookmark stays removed from the local list.
    pub async fn delete(&self, id: &str) -> Result<(), MutationError> {
        self.store.remove(id);

        self.durable.delete_by_id(id).await.map_err(|e| {
            warn!(
                "[Coordinator] Delete of {} failed after local removal: {}",
                id, e
            );
            MutationError::DeleteFailed(e.to_string())
        })
    }
}
