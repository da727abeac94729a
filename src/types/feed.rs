use serde::{Deserialize, Serialize};

use super::bookmark::{Bookmark, OwnerId};

/// An insert or delete observed on the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Created(Bookmark),
    Deleted { id: String, owner_id: OwnerId },
}

impl ChangeEvent {
    /// Owner whose subscription this event is routed to.
    pub fn owner_id(&self) -> &OwnerId {
        match self {
            ChangeEvent::Created(bookmark) => &bookmark.owner_id,
            ChangeEvent::Deleted { owner_id, .. } => owner_id,
        }
    }

    pub fn bookmark_id(&self) -> &str {
        match self {
            ChangeEvent::Created(bookmark) => &bookmark.id,
            ChangeEvent::Deleted { id, .. } => id,
        }
    }
}

/// Connection state reported by a feed transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    Connected,
    Disconnected { reason: String },
    Reconnected,
}

/// Everything a subscription can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    Change(ChangeEvent),
    Status(FeedStatus),
}
