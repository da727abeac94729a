//! RPC method handler for the Markline JSON-lines protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a method call to the active bookmark session or
//! the settings engine held by [`App`]. The `App` lock is not held while a
//! durable add or delete is in flight.

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::App;
use crate::managers::session_manager::BookmarkSession;
use crate::services::settings_engine::SettingsEngineTrait;

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn active_session(app: &App) -> Result<&BookmarkSession, String> {
    app.session().ok_or_else(|| "no active session".to_string())
}

/// Dispatch a method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Session ───
        "session.info" => {
            let a = app.lock().await;
            let session = active_session(&a)?;
            let stats = session.listener_stats();
            Ok(json!({
                "owner_id": session.owner_id(),
                "count": session.store().len(),
                "version": session.version(),
                "feed": {
                    "connected": a.feed.is_connected(),
                    "applied": stats.applied,
                    "ignored": stats.ignored,
                    "disconnects": stats.disconnects,
                    "resyncs": stats.resyncs,
                },
            }))
        }

        // ─── Bookmarks ───
        "bookmark.list" => {
            let a = app.lock().await;
            let session = active_session(&a)?;
            let rows = serde_json::to_value(session.rows()).map_err(|e| e.to_string())?;
            Ok(json!({"items": rows, "version": session.version()}))
        }
        "bookmark.add" => {
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            let coordinator = active_session(&*app.lock().await)?.coordinator().clone();
            let bookmark = coordinator.add(title, url).await.map_err(|e| e.to_string())?;
            serde_json::to_value(bookmark).map_err(|e| e.to_string())
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            let coordinator = active_session(&*app.lock().await)?.coordinator().clone();
            coordinator.delete(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().await;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().await;
            a.settings_engine
                .set_value(key, value)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
