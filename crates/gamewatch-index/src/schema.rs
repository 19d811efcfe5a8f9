use rusqlite::Connection;

use crate::{Error, Result};

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// Timestamps are stored as RFC 3339 UTC text with a fixed precision, so
// lexical order equals chronological order and range filters stay indexable.
//
// History rows are facts and are never rewritten. A version mismatch is an
// error rather than a drop-and-recreate.

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    match current_version {
        0 => {}
        SCHEMA_VERSION => return Ok(()),
        found => {
            return Err(Error::SchemaVersion {
                found,
                expected: SCHEMA_VERSION,
            });
        }
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS server_status (
            server_id INTEGER NOT NULL UNIQUE,
            online BOOLEAN NOT NULL,
            players_now INTEGER NOT NULL,
            players_max INTEGER NOT NULL,
            map TEXT NOT NULL,
            server_name TEXT NOT NULL,
            ping_ms INTEGER NOT NULL,
            last_update TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS player_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            server_id INTEGER NOT NULL,
            players INTEGER NOT NULL,
            online BOOLEAN NOT NULL,
            ping_ms INTEGER NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS player_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            server_id INTEGER NOT NULL,
            player_name TEXT NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            duration_secs INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_history_server_ts ON player_history(server_id, timestamp);
        CREATE INDEX IF NOT EXISTS idx_sessions_server ON player_sessions(server_id, started_at DESC);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_open
            ON player_sessions(server_id, player_name) WHERE ended_at IS NULL;
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}
