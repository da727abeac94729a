//! Property-based tests for SyncSettings persistence.
//!
//! Any valid settings tree must survive a JSON round-trip, and writing it to
//! disk through the SettingsEngine must read back unchanged.

use markline::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use markline::types::settings::{
    FeedSettings, LogFormat, LoggingSettings, SessionSettings, StoreSettings, SyncSettings,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn arb_log_format() -> impl Strategy<Value = LogFormat> {
    prop_oneof![Just(LogFormat::Text), Just(LogFormat::Json)]
}

fn arb_sync_settings() -> impl Strategy<Value = SyncSettings> {
    (
        "[a-zA-Z0-9_./-]{1,40}",
        any::<bool>(),
        proptest::option::of("[a-zA-Z0-9-]{1,36}"),
        prop_oneof![
            Just("info".to_string()),
            Just("debug".to_string()),
            "markline=(trace|debug|warn)",
        ],
        arb_log_format(),
    )
        .prop_map(
            |(database_file, resync_on_reconnect, owner_id, level, format)| SyncSettings {
                store: StoreSettings { database_file },
                feed: FeedSettings {
                    resync_on_reconnect,
                },
                session: SessionSettings { owner_id },
                logging: LoggingSettings { level, format },
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn settings_serialization_roundtrip(settings in arb_sync_settings()) {
        let json = serde_json::to_string(&settings)
            .expect("Serialization to JSON should succeed for any valid SyncSettings");
        let deserialized: SyncSettings = serde_json::from_str(&json)
            .expect("Deserialization from JSON should succeed for valid JSON");

        prop_assert_eq!(deserialized, settings);
    }

    #[test]
    fn settings_survive_engine_save_and_load(settings in arb_sync_settings()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json").to_string_lossy().to_string();

        let mut writer = SettingsEngine::new(Some(path.clone()));
        writer.set_value("store.database_file", serde_json::json!(settings.store.database_file)).unwrap();
        writer.set_value("feed.resync_on_reconnect", serde_json::json!(settings.feed.resync_on_reconnect)).unwrap();
        writer.set_value("session.owner_id", serde_json::json!(settings.session.owner_id)).unwrap();
        writer.set_value("logging", serde_json::to_value(&settings.logging).unwrap()).unwrap();

        let mut reader = SettingsEngine::new(Some(path));
        prop_assert_eq!(reader.load().unwrap(), settings);
    }
}
