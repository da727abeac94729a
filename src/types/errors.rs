use thiserror::Error;

// === ValidationError ===

/// Local input checks that run before anything reaches the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title is empty or whitespace only.
    #[error("Title is required")]
    EmptyTitle,
    /// URL is empty or whitespace only.
    #[error("URL is required")]
    EmptyUrl,
    /// URL does not parse as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// === MutationError ===

/// Outcome of a user-initiated add or delete that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The durable create was rejected. The local list was not touched.
    #[error("Failed to add bookmark: {0}")]
    AddFailed(String),
    /// The durable delete was rejected after the record was already removed
    /// locally.
    #[error("Failed to delete bookmark: {0}")]
    DeleteFailed(String),
}

// === StoreError ===

/// Errors reported by a durable store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("Bookmark database error: {0}")]
    DatabaseError(String),
    /// The store cannot be reached.
    #[error("Bookmark store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

// === FeedError ===

/// Errors reported by a change feed transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The transport has been shut down.
    #[error("Change feed closed")]
    Closed,
    /// The transport refused the subscription.
    #[error("Change feed unavailable: {0}")]
    Unavailable(String),
}

// === SessionError ===

/// Errors that prevent a bookmark session from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No authenticated user.
    #[error("User not authenticated")]
    NotAuthenticated,
    /// The initial bulk load failed.
    #[error("Initial load failed: {0}")]
    LoadFailed(#[source] StoreError),
    /// The change feed subscription could not be opened.
    #[error("Change feed subscription failed: {0}")]
    SubscribeFailed(#[source] FeedError),
}

// === SettingsError ===

/// Errors related to settings persistence and updates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// File system I/O failed.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// JSON serialization or deserialization failed.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The key path does not exist in the settings tree.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The value does not fit the type of the addressed setting.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
