//! Session persistence in a single-row SQLite blob store.
//!
//! The whole session is serialized to JSON and upserted under a versioned
//! key. Schema changes bump the key; an old row is simply ignored on load.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ComparisonConfig, CurlTemplate, FetchMode, TestCase};

pub const SESSION_KEY: &str = "session_v1";

const DATA_DIR: &str = ".checkman";
const DB_FILE: &str = "checkman.db";

/// Everything needed to restore a run: the parsed template, the comparison
/// settings, the fetch mode and every case with its recorded outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub template: CurlTemplate,
    pub comparison: ComparisonConfig,
    pub fetch_mode: FetchMode,
    pub cases: Vec<TestCase>,
}

pub fn default_db_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DATA_DIR)
        .join(DB_FILE)
}

pub fn open_db(path: &Path) -> Result<Connection, String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create data dir: {err}"))?;
    }

    let conn =
        Connection::open(path).map_err(|err| format!("Failed to open SQLite: {err}"))?;

    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|err| format!("Failed to set SQLite journal mode: {err}"))?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS app_state (
         state_key TEXT PRIMARY KEY,
         state_json TEXT NOT NULL,
         updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
       );",
    )
    .map_err(|err| format!("Failed to initialize SQLite schema: {err}"))?;

    Ok(conn)
}

pub fn save_session(conn: &Connection, session: &SessionState) -> Result<(), String> {
    let state_json = serde_json::to_string(session)
        .map_err(|err| format!("Failed to serialize session: {err}"))?;

    conn.execute(
        "INSERT INTO app_state (state_key, state_json, updated_at)
       VALUES (?1, ?2, strftime('%s','now'))
       ON CONFLICT(state_key)
       DO UPDATE SET
         state_json = excluded.state_json,
         updated_at = excluded.updated_at;",
        params![SESSION_KEY, state_json],
    )
    .map_err(|err| format!("Failed to save session to SQLite: {err}"))?;

    debug!(cases = session.cases.len(), "session saved");
    Ok(())
}

pub fn clear_session(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "DELETE FROM app_state WHERE state_key = ?1;",
        params![SESSION_KEY],
    )
    .map_err(|err| format!("Failed to clear session in SQLite: {err}"))?;
    Ok(())
}

pub fn load_session(conn: &Connection) -> Result<Option<SessionState>, String> {
    let state_json: Option<String> = conn
        .query_row(
            "SELECT state_json FROM app_state WHERE state_key = ?1 LIMIT 1;",
            params![SESSION_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| format!("Failed to load session from SQLite: {err}"))?;

    match state_json {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|err| format!("Failed to parse stored session: {err}")),
        None => Ok(None),
    }
}
