use serde::{Deserialize, Serialize};

/// Top-level settings container, persisted as `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SyncSettings {
    pub store: StoreSettings,
    pub feed: FeedSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    /// SQLite file name, resolved against the data directory when relative.
    pub database_file: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_file: "markline.db".to_string(),
        }
    }
}

/// Change feed settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeedSettings {
    /// Re-fetch the full list after the transport reconnects. Off by default:
    /// events missed during an outage stay missing until the next session.
    pub resync_on_reconnect: bool,
}

/// Session provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionSettings {
    /// Owner to sign in as. `None` means no session.
    pub owner_id: Option<String>,
}

/// Log output settings for the binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}
