use gamewatch_types::{ServerId, StatusSnapshot};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{server_id_column, server_id_to_sql, ts_column, ts_to_sql};
use crate::Result;

const COLUMNS: &str =
    "server_id, online, players_now, players_max, map, server_name, ping_ms, last_update";

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<StatusSnapshot> {
    Ok(StatusSnapshot {
        server_id: server_id_column(row, 0)?,
        online: row.get(1)?,
        players_now: row.get(2)?,
        players_max: row.get(3)?,
        map: row.get(4)?,
        server_name: row.get(5)?,
        ping_ms: row.get(6)?,
        last_update: ts_column(row, 7)?,
    })
}

/// Insert or overwrite the single status row for `snapshot.server_id`.
pub fn upsert(conn: &Connection, snapshot: &StatusSnapshot) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO server_status (server_id, online, players_now, players_max, map, server_name, ping_ms, last_update)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(server_id) DO UPDATE SET
            online = ?2,
            players_now = ?3,
            players_max = ?4,
            map = ?5,
            server_name = ?6,
            ping_ms = ?7,
            last_update = ?8
        "#,
        params![
            server_id_to_sql(snapshot.server_id),
            snapshot.online,
            snapshot.players_now,
            snapshot.players_max,
            &snapshot.map,
            &snapshot.server_name,
            snapshot.ping_ms,
            ts_to_sql(&snapshot.last_update),
        ],
    )?;

    Ok(())
}

pub fn get(conn: &Connection, server_id: ServerId) -> Result<Option<StatusSnapshot>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM server_status WHERE server_id = ?1", COLUMNS),
            [server_id_to_sql(server_id)],
            snapshot_from_row,
        )
        .optional()?;

    Ok(result)
}

pub fn list(conn: &Connection) -> Result<Vec<StatusSnapshot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM server_status ORDER BY server_id ASC",
        COLUMNS
    ))?;

    let snapshots = stmt
        .query_map([], snapshot_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(snapshots)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM server_status", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Drop status rows for servers no longer in the catalog.
pub fn retain(conn: &Connection, keep: &[ServerId]) -> Result<usize> {
    let ids: Vec<String> = keep
        .iter()
        .map(|id| server_id_to_sql(*id).to_string())
        .collect();
    let removed = if ids.is_empty() {
        conn.execute("DELETE FROM server_status", [])?
    } else {
        conn.execute(
            &format!(
                "DELETE FROM server_status WHERE server_id NOT IN ({})",
                ids.join(", ")
            ),
            [],
        )?
    };
    Ok(removed)
}
