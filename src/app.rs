//! App Core for Markline.
//!
//! Owns the settings, the SQLite-backed durable store, the in-process change
//! feed, and at most one active [`BookmarkSession`].

use std::sync::Arc;

use log::info;

use crate::database::connection::Database;
use crate::managers::session_manager::{BookmarkSession, SessionDeps, SessionOptions};
use crate::services::change_feed::LocalChangeFeed;
use crate::services::durable_store::SqliteStore;
use crate::services::session_provider::{SessionProvider, StaticSessionProvider};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::bookmark::OwnerId;
use crate::types::errors::SessionError;

pub struct App {
    pub settings_engine: SettingsEngine,
    pub feed: LocalChangeFeed,
    pub durable: Arc<SqliteStore>,
    session_provider: Arc<dyn SessionProvider>,
    session: Option<BookmarkSession>,
}

impl App {
    /// Creates an App over the SQLite file at `db_path`.
    ///
    /// The session provider signs in as `session.owner_id` from the loaded
    /// settings; use [`with_session_provider`](Self::with_session_provider) to
    /// replace it.
    pub fn new(db_path: &str, settings_engine: SettingsEngine) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open(db_path)?;
        info!("[App] Database opened at {}", db_path);
        Ok(Self::with_database(db, settings_engine))
    }

    /// Creates an App over a throwaway in-memory database.
    pub fn open_in_memory(settings_engine: SettingsEngine) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(db, settings_engine))
    }

    fn with_database(db: Database, settings_engine: SettingsEngine) -> Self {
        let feed = LocalChangeFeed::new();
        let durable = Arc::new(SqliteStore::new(db).with_feed(feed.clone()));
        let owner = settings_engine
            .get_settings()
            .session
            .owner_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .map(OwnerId::new);

        Self {
            settings_engine,
            feed,
            durable,
            session_provider: Arc::new(StaticSessionProvider::new(owner)),
            session: None,
        }
    }

    pub fn with_session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.session_provider = provider;
        self
    }

    /// Collaborators for sessions opened against this App's store and feed.
    pub fn deps(&self) -> SessionDeps {
        SessionDeps {
            session: Arc::clone(&self.session_provider),
            durable: self.durable.clone(),
            feed: Arc::new(self.feed.clone()),
        }
    }

    /// Starts the session if none is active yet.
    pub async fn startup(&mut self) -> Result<&BookmarkSession, SessionError> {
        if self.session.is_none() {
            let options = SessionOptions {
                resync_on_reconnect: self.settings_engine.get_settings().feed.resync_on_reconnect,
            };
            let session = BookmarkSession::start(&self.deps(), options).await?;
            self.session = Some(session);
        }
        self.session.as_ref().ok_or(SessionError::NotAuthenticated)
    }

    pub fn session(&self) -> Option<&BookmarkSession> {
        self.session.as_ref()
    }

    /// Ends the active session, if any.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.end();
        }
    }
}
