//! Unit tests for the RPC handler: every JSON-lines method dispatched by
//! `handle_method`, through the same code path used by `markline-rpc`.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::Mutex;

use markline::app::App;
use markline::rpc_handler::handle_method;
use markline::services::session_provider::StaticSessionProvider;
use markline::services::settings_engine::SettingsEngine;

fn settings(tmp: &TempDir) -> SettingsEngine {
    SettingsEngine::new(Some(
        tmp.path().join("settings.json").to_string_lossy().to_string(),
    ))
}

/// Create an App with an active session for `alice` over a temp-dir database.
async fn setup() -> (Mutex<App>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db_path = tmp.path().join("test.db");
    let mut app = App::new(db_path.to_str().unwrap(), settings(&tmp))
        .expect("Failed to init App")
        .with_session_provider(Arc::new(StaticSessionProvider::signed_in("alice")));
    app.startup().await.expect("Failed to start session");
    (Mutex::new(app), tmp)
}

// ─── Ping ───

#[tokio::test]
async fn test_ping() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "ping", &json!({})).await.unwrap();
    assert_eq!(res, json!({"pong": true}));
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (app, _tmp) = setup().await;
    let err = handle_method(&app, "nonexistent.method", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, "unknown method: nonexistent.method");
}

// ─── Session ───

#[tokio::test]
async fn test_session_info() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "session.info", &json!({})).await.unwrap();
    assert_eq!(res["owner_id"], "alice");
    assert_eq!(res["count"], 0);
    assert_eq!(res["feed"]["connected"], true);
}

#[tokio::test]
async fn test_methods_without_session_fail() {
    let tmp = TempDir::new().unwrap();
    let app = Mutex::new(App::open_in_memory(settings(&tmp)).unwrap());

    for method in ["session.info", "bookmark.list"] {
        let err = handle_method(&app, method, &json!({})).await.unwrap_err();
        assert_eq!(err, "no active session");
    }
    let err = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "T", "url": "https://x.com"}),
    )
    .await
    .unwrap_err();
    assert_eq!(err, "no active session");
}

// ─── Bookmarks ───

#[tokio::test]
async fn test_bookmark_add_and_list() {
    let (app, _tmp) = setup().await;

    let added = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "Rust", "url": "https://www.rust-lang.org/learn"}),
    )
    .await
    .unwrap();
    assert_eq!(added["title"], "Rust");
    assert_eq!(added["owner_id"], "alice");
    assert!(added["id"].as_str().is_some());

    let list = handle_method(&app, "bookmark.list", &json!({})).await.unwrap();
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], added["id"]);
    assert_eq!(items[0]["host"], "www.rust-lang.org");
    assert!(items[0]["created_label"].as_str().is_some());
    assert!(list["version"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_bookmark_add_validation_errors() {
    let (app, _tmp) = setup().await;

    let err = handle_method(&app, "bookmark.add", &json!({"url": "https://x.com"}))
        .await
        .unwrap_err();
    assert_eq!(err, "missing title");

    let err = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "  ", "url": "https://x.com"}),
    )
    .await
    .unwrap_err();
    assert_eq!(err, "Title is required");

    let err = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "T", "url": "not a url"}),
    )
    .await
    .unwrap_err();
    assert!(err.starts_with("Invalid URL"));
}

#[tokio::test]
async fn test_bookmark_delete() {
    let (app, _tmp) = setup().await;
    let added = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "Gone", "url": "https://gone.example"}),
    )
    .await
    .unwrap();

    let res = handle_method(&app, "bookmark.delete", &json!({"id": added["id"]}))
        .await
        .unwrap();
    assert_eq!(res, json!({"ok": true}));

    let list = handle_method(&app, "bookmark.list", &json!({})).await.unwrap();
    assert!(list["items"].as_array().unwrap().is_empty());

    let err = handle_method(&app, "bookmark.delete", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, "missing id");
}

#[tokio::test]
async fn test_app_lock_is_free_while_add_is_in_flight() {
    let (app, _tmp) = setup().await;
    let params = json!({"title": "Slow", "url": "https://slow.example"});
    let add = handle_method(&app, "bookmark.add", &params);
    tokio::pin!(add);

    // Poll the add once; while it waits on the database, other
    // requests must be able to take the lock meanwhile.
    let added = tokio::select! {
        biased;
        res = &mut add => res.unwrap(),
        _ = std::future::ready(()) => {
            assert!(app.try_lock().is_ok(), "App stayed locked during the durable call");
            let info = handle_method(&app, "session.info", &json!({})).await.unwrap();
            assert_eq!(info["owner_id"], "alice");
            add.await.unwrap()
        }
    };

    let list = handle_method(&app, "bookmark.list", &json!({})).await.unwrap();
    assert_eq!(list["items"][0]["id"], added["id"]);
}

// ─── Settings ───

#[tokio::test]
async fn test_settings_get_and_set() {
    let (app, _tmp) = setup().await;

    let res = handle_method(
        &app,
        "settings.set",
        &json!({"key": "feed.resync_on_reconnect", "value": true}),
    )
    .await
    .unwrap();
    assert_eq!(res, json!({"ok": true}));

    let settings = handle_method(&app, "settings.get", &json!({})).await.unwrap();
    assert_eq!(settings["feed"]["resync_on_reconnect"], true);
    assert_eq!(settings["store"]["database_file"], "markline.db");
}

#[tokio::test]
async fn test_settings_set_errors() {
    let (app, _tmp) = setup().await;

    let err = handle_method(&app, "settings.set", &json!({"key": "logging.level"}))
        .await
        .unwrap_err();
    assert_eq!(err, "missing value");

    let err = handle_method(
        &app,
        "settings.set",
        &json!({"key": "no.such.key", "value": 1}),
    )
    .await
    .unwrap_err();
    assert!(err.starts_with("Invalid settings key"));
}
