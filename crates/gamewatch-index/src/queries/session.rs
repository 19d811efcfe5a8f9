use chrono::{DateTime, Utc};
use gamewatch_types::{ServerId, session_duration_secs};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{opt_ts_column, server_id_column, server_id_to_sql, ts_column, ts_to_sql};
use crate::Result;
use crate::records::{SessionQuery, SessionRecord};

const COLUMNS: &str = "id, server_id, player_name, started_at, ended_at, duration_secs";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        server_id: server_id_column(row, 1)?,
        player_name: row.get(2)?,
        started_at: ts_column(row, 3)?,
        ended_at: opt_ts_column(row, 4)?,
        duration_secs: row.get(5)?,
    })
}

/// Open a session unless one is already open for (server, player).
///
/// Returns `true` when a row was inserted. The partial unique index turns a
/// duplicate open into a no-op.
pub fn open(
    conn: &Connection,
    server_id: ServerId,
    player_name: &str,
    at: DateTime<Utc>,
) -> Result<bool> {
    let inserted = conn.execute(
        r#"
        INSERT OR IGNORE INTO player_sessions (server_id, player_name, started_at, ended_at, duration_secs)
        VALUES (?1, ?2, ?3, NULL, 0)
        "#,
        params![server_id_to_sql(server_id), player_name, ts_to_sql(&at)],
    )?;

    Ok(inserted == 1)
}

fn close_row(conn: &Connection, id: i64, started_at: DateTime<Utc>, at: DateTime<Utc>) -> Result<i64> {
    let duration = session_duration_secs(started_at, at);
    conn.execute(
        "UPDATE player_sessions SET ended_at = ?2, duration_secs = ?3 WHERE id = ?1 AND ended_at IS NULL",
        params![id, ts_to_sql(&at), duration],
    )?;
    Ok(duration)
}

fn open_row(row: &Row<'_>) -> rusqlite::Result<(i64, DateTime<Utc>)> {
    Ok((row.get(0)?, ts_column(row, 1)?))
}

fn open_rows(conn: &Connection, server_id: Option<ServerId>) -> Result<Vec<(i64, DateTime<Utc>)>> {
    let mut sql = String::from("SELECT id, started_at FROM player_sessions WHERE ended_at IS NULL");
    let mut params: Vec<i64> = Vec::new();
    if let Some(id) = server_id {
        sql.push_str(" AND server_id = ?1");
        params.push(server_id_to_sql(id));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), open_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(rows)
}

/// Close the open session for (server, player). Returns its duration, or
/// `None` when no session was open.
pub fn close(
    conn: &Connection,
    server_id: ServerId,
    player_name: &str,
    at: DateTime<Utc>,
) -> Result<Option<i64>> {
    let open = conn
        .query_row(
            r#"
            SELECT id, started_at FROM player_sessions
            WHERE server_id = ?1 AND player_name = ?2 AND ended_at IS NULL
            "#,
            params![server_id_to_sql(server_id), player_name],
            open_row,
        )
        .optional()?;

    match open {
        Some((id, started_at)) => Ok(Some(close_row(conn, id, started_at, at)?)),
        None => Ok(None),
    }
}

/// Close every open session of one server (it went offline).
pub fn close_all_for_server(conn: &Connection, server_id: ServerId, at: DateTime<Utc>) -> Result<usize> {
    close_rows(conn, open_rows(conn, Some(server_id))?, at)
}

/// Close every open session left behind by a previous run.
pub fn close_orphans(conn: &Connection, at: DateTime<Utc>) -> Result<usize> {
    close_rows(conn, open_rows(conn, None)?, at)
}

fn close_rows(conn: &Connection, rows: Vec<(i64, DateTime<Utc>)>, at: DateTime<Utc>) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    for (id, started_at) in &rows {
        close_row(&tx, *id, *started_at, at)?;
    }
    tx.commit()?;

    Ok(rows.len())
}

pub fn list(conn: &Connection, query: &SessionQuery) -> Result<Vec<SessionRecord>> {
    let mut where_clauses = vec!["1 = 1"];
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(id) = query.server_id {
        where_clauses.push("server_id = ?");
        params.push(Box::new(server_id_to_sql(id)));
    }

    if let Some(name) = &query.player_name {
        where_clauses.push("player_name = ?");
        params.push(Box::new(name.clone()));
    }

    if query.open_only {
        where_clauses.push("ended_at IS NULL");
    }

    let limit_clause = query
        .limit
        .map(|l| format!("LIMIT {}", l))
        .unwrap_or_default();

    let sql = format!(
        r#"
        SELECT {}
        FROM player_sessions
        WHERE {}
        ORDER BY started_at DESC, id DESC
        {}
        "#,
        COLUMNS,
        where_clauses.join(" AND "),
        limit_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let records = stmt
        .query_map(param_refs.as_slice(), record_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(records)
}

/// Names with an open session on `server_id`, sorted.
pub fn open_names(conn: &Connection, server_id: ServerId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT player_name FROM player_sessions
        WHERE server_id = ?1 AND ended_at IS NULL
        ORDER BY player_name ASC
        "#,
    )?;

    let names = stmt
        .query_map([server_id_to_sql(server_id)], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(names)
}
