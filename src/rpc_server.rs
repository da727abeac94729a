//! Markline RPC Server: newline-delimited JSON over stdin/stdout.
//!
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Environment: `MARKLINE_DATA_DIR` overrides the data directory,
//! `MARKLINE_OWNER` overrides the signed-in owner, `MARKLINE_LOG_FORMAT=json`
//! switches log output to JSON, and `RUST_LOG` overrides the log filter.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use markline::app::App;
use markline::platform;
use markline::rpc_handler::handle_method;
use markline::services::session_provider::StaticSessionProvider;
use markline::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use markline::types::settings::{LogFormat, LoggingSettings};

fn init_tracing(logging: &LoggingSettings) {
    let json_env = std::env::var("MARKLINE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the protocol.
    if json_env || logging.format == LogFormat::Json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn emit(value: &Value) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{}", value);
    let _ = out.flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings_engine = SettingsEngine::new(None);
    let load_result = settings_engine.load();
    init_tracing(&settings_engine.get_settings().logging);
    if let Err(e) = load_result {
        tracing::warn!("Settings not loaded, using defaults: {}", e);
    }

    let data_dir = std::env::var("MARKLINE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| platform::get_data_dir());
    std::fs::create_dir_all(&data_dir)?;
    let db_path = settings_engine.database_path(&data_dir);

    let mut app = App::new(&db_path.to_string_lossy(), settings_engine)?;
    if let Ok(owner) = std::env::var("MARKLINE_OWNER") {
        app = app.with_session_provider(Arc::new(StaticSessionProvider::signed_in(owner)));
    }
    match app.startup().await {
        Ok(session) => tracing::info!("Session active for {}", session.owner_id()),
        Err(e) => tracing::warn!("No session: {}", e),
    }
    let app = Mutex::new(app);

    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&response);
    }

    app.lock().await.shutdown();
    Ok(())
}
