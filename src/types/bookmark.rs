use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of the user who owns a set of bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Represents a saved bookmark as assigned by the durable store.
///
/// `id` and `created_at` are server-assigned; `created_at` is milliseconds
/// since the UNIX epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub owner_id: OwnerId,
    pub title: String,
    pub url: String,
    pub created_at: i64,
}

impl Bookmark {
    /// Display ordering: newest first, ties broken by ascending id.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A title/url pair that passed local validation and may be sent to the
/// durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
}

/// One renderable row of the bookmark list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkRow {
    pub id: String,
    pub title: String,
    pub url: String,
    pub host: Option<String>,
    pub created_label: String,
}
