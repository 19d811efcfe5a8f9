use chrono::{DateTime, Utc};
use gamewatch_types::{HistoryPoint, ServerId};
use rusqlite::{Connection, params};

use super::{server_id_column, server_id_to_sql, ts_column, ts_to_sql};
use crate::Result;
use crate::records::HistoryStats;

/// Insert `points` in one transaction. Either every row lands or none do.
pub fn insert_batch(conn: &Connection, points: &[HistoryPoint]) -> Result<usize> {
    if points.is_empty() {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO player_history (server_id, players, online, ping_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        for point in points {
            stmt.execute(params![
                server_id_to_sql(point.server_id),
                point.players,
                point.online,
                point.ping_ms,
                ts_to_sql(&point.timestamp),
            ])?;
        }
    }
    tx.commit()?;

    Ok(points.len())
}

/// History of one server at or after `since`, oldest first. With a `limit`
/// only the newest `limit` points of the window are returned.
pub fn since(
    conn: &Connection,
    server_id: ServerId,
    since: DateTime<Utc>,
    limit: Option<usize>,
) -> Result<Vec<HistoryPoint>> {
    let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT server_id, players, online, ping_ms, timestamp
        FROM player_history
        WHERE server_id = ?1 AND timestamp >= ?2
        ORDER BY timestamp DESC, id DESC
        {}
        "#,
        limit_clause
    ))?;

    let mut points = stmt
        .query_map(
            params![server_id_to_sql(server_id), ts_to_sql(&since)],
            |row| {
                Ok(HistoryPoint {
                    server_id: server_id_column(row, 0)?,
                    players: row.get(1)?,
                    online: row.get(2)?,
                    ping_ms: row.get(3)?,
                    timestamp: ts_column(row, 4)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    points.reverse();

    Ok(points)
}

pub fn stats(conn: &Connection, server_id: ServerId, since: DateTime<Utc>) -> Result<HistoryStats> {
    let stats = conn.query_row(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN online THEN 1 ELSE 0 END), 0),
               COALESCE(MAX(players), 0),
               COALESCE(AVG(players), 0.0)
        FROM player_history
        WHERE server_id = ?1 AND timestamp >= ?2
        "#,
        params![server_id_to_sql(server_id), ts_to_sql(&since)],
        |row| {
            Ok(HistoryStats {
                samples: row.get::<_, i64>(0)? as usize,
                online_samples: row.get::<_, i64>(1)? as usize,
                peak_players: row.get::<_, i64>(2)? as u32,
                avg_players: row.get(3)?,
            })
        },
    )?;

    Ok(stats)
}

/// Delete history older than `before`.
pub fn prune(conn: &Connection, before: DateTime<Utc>) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM player_history WHERE timestamp < ?1",
        [ts_to_sql(&before)],
    )?;
    Ok(removed)
}

pub fn count(conn: &Connection, server_id: Option<ServerId>) -> Result<usize> {
    let count: i64 = match server_id {
        Some(id) => conn.query_row(
            "SELECT COUNT(*) FROM player_history WHERE server_id = ?1",
            [server_id_to_sql(id)],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM player_history", [], |row| row.get(0))?,
    };
    Ok(count as usize)
}
