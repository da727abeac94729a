//! Durable bookmark store for Markline.
//!
//! [`DurableStore`] is the persistence contract the session depends on.
//! [`SqliteStore`] implements it on top of the rusqlite [`Database`] and, when
//! a [`LocalChangeFeed`] is attached, publishes every committed insert/delete
//! to it so other sessions of the same owner observe the change.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::services::change_feed::LocalChangeFeed;
use crate::types::bookmark::{Bookmark, OwnerId};
use crate::types::errors::StoreError;
use crate::types::feed::ChangeEvent;

/// Persistence operations for bookmarks.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// All bookmarks of `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Bookmark>, StoreError>;

    /// Persists a new bookmark and returns it with its assigned id and timestamp.
    async fn create(&self, owner_id: &OwnerId, title: &str, url: &str)
        -> Result<Bookmark, StoreError>;

    /// Deletes the bookmark with `id`. Deleting an id that does not exist succeeds.
    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;
}

/// Durable store backed by a SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
    feed: Option<LocalChangeFeed>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            feed: None,
        }
    }

    /// Publishes committed changes to `feed`.
    pub fn with_feed(mut self, feed: LocalChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Returns the current UNIX timestamp in milliseconds.
    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            owner_id: OwnerId::new(row.get::<_, String>(1)?),
            title: row.get(2)?,
            url: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn list_rows(conn: &Connection, owner_id: &OwnerId) -> Result<Vec<Bookmark>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, title, url, created_at FROM bookmarks \
             WHERE owner_id = ?1 ORDER BY created_at DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![owner_id.as_str()], Self::row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn insert_row(
        conn: &Connection,
        owner_id: &OwnerId,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, StoreError> {
        // Timestamps never go backwards per owner, even if the wall clock does.
        let latest: i64 = conn.query_row(
            "SELECT COALESCE(MAX(created_at), 0) FROM bookmarks WHERE owner_id = ?1",
            params![owner_id.as_str()],
            |row| row.get(0),
        )?;
        let created_at = Self::now_millis().max(latest);

        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.clone(),
            title: title.to_string(),
            url: url.to_string(),
            created_at,
        };
        conn.execute(
            "INSERT INTO bookmarks (id, owner_id, title, url, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                bookmark.id,
                bookmark.owner_id.as_str(),
                bookmark.title,
                bookmark.url,
                bookmark.created_at
            ],
        )?;
        Ok(bookmark)
    }

    fn delete_row(conn: &Connection, id: &str) -> Result<Option<OwnerId>, StoreError> {
        let owner: Option<String> = conn
            .query_row(
                "SELECT owner_id FROM bookmarks WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(owner) = owner else {
            return Ok(None);
        };
        conn.execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?;
        Ok(Some(OwnerId::new(owner)))
    }

    /// Runs `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(db.connection())
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }

    fn publish(&self, event: ChangeEvent) {
        if let Some(feed) = &self.feed {
            let reached = feed.publish(event);
            debug!("[SqliteStore] Change published to {} subscribers", reached);
        }
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Bookmark>, StoreError> {
        let owner_id = owner_id.clone();
        self.with_conn(move |conn| Self::list_rows(conn, &owner_id))
            .await
    }

    async fn create(
        &self,
        owner_id: &OwnerId,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, StoreError> {
        let (owner_id, title, url) = (owner_id.clone(), title.to_string(), url.to_string());
        let bookmark = self
            .with_conn(move |conn| Self::insert_row(conn, &owner_id, &title, &url))
            .await?;

        self.publish(ChangeEvent::Created(bookmark.clone()));
        Ok(bookmark)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let row_id = id.to_string();
        let owner = self
            .with_conn(move |conn| Self::delete_row(conn, &row_id))
            .await?;

        if let Some(owner_id) = owner {
            self.publish(ChangeEvent::Deleted {
                id: id.to_string(),
                owner_id,
            });
        }
        Ok(())
    }
}
