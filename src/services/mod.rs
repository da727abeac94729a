// Markline services
// External collaborators of a bookmark session: the durable store, the change
// feed transport, the session provider, and settings persistence.

pub mod change_feed;
pub mod durable_store;
pub mod session_provider;
pub mod settings_engine;
