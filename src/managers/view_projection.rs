//! Projection of the bookmark list into renderable rows.

use chrono::{DateTime, Utc};
use url::Url;

use crate::types::bookmark::{Bookmark, BookmarkRow};

/// Maps records to rows, keeping their order.
pub fn project(records: &[Bookmark]) -> Vec<BookmarkRow> {
    records.iter().map(project_one).collect()
}

pub fn project_one(bookmark: &Bookmark) -> BookmarkRow {
    BookmarkRow {
        id: bookmark.id.clone(),
        title: bookmark.title.clone(),
        url: bookmark.url.clone(),
        host: Url::parse(&bookmark.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string)),
        created_label: created_label(bookmark.created_at),
    }
}

/// `YYYY-MM-DD HH:MM` in UTC; empty for timestamps chrono cannot represent.
pub fn created_label(created_at_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(created_at_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
