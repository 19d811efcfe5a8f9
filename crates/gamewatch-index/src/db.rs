use chrono::{DateTime, Utc};
use gamewatch_types::{HistoryPoint, ServerId, StatusSnapshot};
use rusqlite::Connection;
use std::path::Path;

use crate::queries::{history, session, status};
use crate::records::{HistoryStats, SessionQuery, SessionRecord};
use crate::{Result, schema};

/// Single-connection SQLite store.
///
/// `Connection` is not `Sync`; async callers wrap the database in a mutex and
/// run calls on a blocking thread.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    // Status

    pub fn upsert_status(&self, snapshot: &StatusSnapshot) -> Result<()> {
        status::upsert(&self.conn, snapshot)
    }

    pub fn get_status(&self, server_id: ServerId) -> Result<Option<StatusSnapshot>> {
        status::get(&self.conn, server_id)
    }

    pub fn list_statuses(&self) -> Result<Vec<StatusSnapshot>> {
        status::list(&self.conn)
    }

    pub fn count_statuses(&self) -> Result<usize> {
        status::count(&self.conn)
    }

    pub fn retain_statuses(&self, keep: &[ServerId]) -> Result<usize> {
        status::retain(&self.conn, keep)
    }

    // History

    pub fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize> {
        history::insert_batch(&self.conn, points)
    }

    pub fn history_since(
        &self,
        server_id: ServerId,
        since: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryPoint>> {
        history::since(&self.conn, server_id, since, limit)
    }

    pub fn history_stats(&self, server_id: ServerId, since: DateTime<Utc>) -> Result<HistoryStats> {
        history::stats(&self.conn, server_id, since)
    }

    pub fn prune_history(&self, before: DateTime<Utc>) -> Result<usize> {
        history::prune(&self.conn, before)
    }

    pub fn count_history(&self, server_id: Option<ServerId>) -> Result<usize> {
        history::count(&self.conn, server_id)
    }

    // Sessions

    pub fn open_session(&self, server_id: ServerId, player: &str, at: DateTime<Utc>) -> Result<bool> {
        session::open(&self.conn, server_id, player, at)
    }

    pub fn close_session(
        &self,
        server_id: ServerId,
        player: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        session::close(&self.conn, server_id, player, at)
    }

    pub fn close_server_sessions(&self, server_id: ServerId, at: DateTime<Utc>) -> Result<usize> {
        session::close_all_for_server(&self.conn, server_id, at)
    }

    pub fn close_orphan_sessions(&self, at: DateTime<Utc>) -> Result<usize> {
        session::close_orphans(&self.conn, at)
    }

    pub fn list_sessions(&self, query: &SessionQuery) -> Result<Vec<SessionRecord>> {
        session::list(&self.conn, query)
    }

    pub fn open_session_names(&self, server_id: ServerId) -> Result<Vec<String>> {
        session::open_names(&self.conn, server_id)
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute("VACUUM", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn snapshot(id: u64, players: u32, at: DateTime<Utc>) -> StatusSnapshot {
        StatusSnapshot {
            server_id: ServerId::new(id),
            online: true,
            players_now: players,
            players_max: 32,
            map: "de_dust2".to_string(),
            server_name: format!("server {}", id),
            ping_ms: 25,
            last_update: at,
        }
    }

    #[test]
    fn test_upsert_keeps_one_row_per_server() -> Result<()> {
        let db = Database::open_in_memory()?;

        for i in 0..5 {
            db.upsert_status(&snapshot(1, i, t0() + Duration::seconds(i as i64)))?;
            db.upsert_status(&snapshot(2, i, t0()))?;
        }
        db.upsert_status(&StatusSnapshot::offline(ServerId::new(1), t0() + Duration::minutes(1)))?;

        assert_eq!(db.count_statuses()?, 2);
        let first = db.get_status(ServerId::new(1))?.unwrap();
        assert!(!first.online);
        assert_eq!(first.players_now, 0);
        assert_eq!(first.last_update, t0() + Duration::minutes(1));
        Ok(())
    }

    #[test]
    fn test_status_round_trips_every_field() -> Result<()> {
        let db = Database::open_in_memory()?;
        let original = snapshot(9, 17, t0());
        db.upsert_status(&original)?;

        assert_eq!(db.list_statuses()?, vec![original]);
        Ok(())
    }

    #[test]
    fn test_retain_statuses_drops_removed_servers() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.upsert_status(&snapshot(1, 0, t0()))?;
        db.upsert_status(&snapshot(2, 0, t0()))?;

        assert_eq!(db.retain_statuses(&[ServerId::new(2)])?, 1);
        assert!(db.get_status(ServerId::new(1))?.is_none());
        assert!(db.get_status(ServerId::new(2))?.is_some());
        Ok(())
    }

    #[test]
    fn test_history_batch_and_window() -> Result<()> {
        let db = Database::open_in_memory()?;
        let points: Vec<_> = (0..10)
            .map(|i| HistoryPoint {
                server_id: ServerId::new(3),
                players: i,
                online: i != 4,
                ping_ms: 10,
                timestamp: t0() + Duration::minutes(i as i64),
            })
            .collect();

        assert_eq!(db.insert_history(&points)?, 10);
        assert_eq!(db.insert_history(&[])?, 0);

        let recent = db.history_since(ServerId::new(3), t0() + Duration::minutes(5), None)?;
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].players, 5);
        assert_eq!(recent.last().unwrap().players, 9);

        // A limit keeps the newest points, still oldest first
        let newest = db.history_since(ServerId::new(3), t0(), Some(3))?;
        let players: Vec<u32> = newest.iter().map(|p| p.players).collect();
        assert_eq!(players, vec![7, 8, 9]);

        let stats = db.history_stats(ServerId::new(3), t0())?;
        assert_eq!(stats.samples, 10);
        assert_eq!(stats.online_samples, 9);
        assert_eq!(stats.peak_players, 9);
        assert!((stats.avg_players - 4.5).abs() < 1e-9);

        assert_eq!(db.prune_history(t0() + Duration::minutes(8))?, 8);
        assert_eq!(db.count_history(None)?, 2);
        Ok(())
    }

    #[test]
    fn test_single_open_session_per_player() -> Result<()> {
        let db = Database::open_in_memory()?;
        let server = ServerId::new(1);

        assert!(db.open_session(server, "Alice", t0())?);
        assert!(!db.open_session(server, "Alice", t0() + Duration::seconds(5))?);
        assert!(db.open_session(ServerId::new(2), "Alice", t0())?);

        let open = db.list_sessions(&SessionQuery {
            server_id: Some(server),
            open_only: true,
            ..Default::default()
        })?;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].started_at, t0());

        // After closing, the player can open a fresh session
        assert_eq!(db.close_session(server, "Alice", t0() + Duration::seconds(90))?, Some(90));
        assert!(db.open_session(server, "Alice", t0() + Duration::seconds(120))?);
        assert_eq!(db.close_session(server, "Nobody", t0())?, None);
        Ok(())
    }

    #[test]
    fn test_closed_duration_matches_bounds() -> Result<()> {
        let db = Database::open_in_memory()?;
        let server = ServerId::new(5);
        db.open_session(server, "Bob", t0())?;
        db.open_session(server, "Carol", t0() + Duration::seconds(30))?;

        assert_eq!(db.close_server_sessions(server, t0() + Duration::seconds(600))?, 2);

        for record in db.list_sessions(&SessionQuery::default())? {
            let ended = record.ended_at.unwrap();
            assert_eq!(record.duration_secs, (ended - record.started_at).num_seconds());
        }
        assert!(db.open_session_names(server)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_close_orphans_clamps_negative_duration() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.open_session(ServerId::new(1), "Alice", t0())?;
        db.open_session(ServerId::new(2), "Bob", t0() + Duration::hours(1))?;

        // Clock went backwards relative to Bob's start
        let now = t0() + Duration::minutes(30);
        assert_eq!(db.close_orphan_sessions(now)?, 2);
        assert_eq!(db.close_orphan_sessions(now)?, 0);

        let sessions = db.list_sessions(&SessionQuery::default())?;
        let bob = sessions.iter().find(|s| s.player_name == "Bob").unwrap();
        let alice = sessions.iter().find(|s| s.player_name == "Alice").unwrap();
        assert_eq!(bob.duration_secs, 0);
        assert_eq!(alice.duration_secs, 1800);
        assert!(sessions.iter().all(|s| !s.is_open()));
        Ok(())
    }

    #[test]
    fn test_list_sessions_filters_and_limit() -> Result<()> {
        let db = Database::open_in_memory()?;
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            db.open_session(ServerId::new(1), name, t0() + Duration::seconds(i as i64))?;
        }
        db.close_session(ServerId::new(1), "A", t0() + Duration::seconds(10))?;

        let newest = db.list_sessions(&SessionQuery {
            limit: Some(2),
            ..Default::default()
        })?;
        assert_eq!(
            newest.iter().map(|s| s.player_name.as_str()).collect::<Vec<_>>(),
            vec!["C", "B"]
        );

        let by_name = db.list_sessions(&SessionQuery {
            player_name: Some("A".to_string()),
            ..Default::default()
        })?;
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].to_session().duration_secs, 10);

        assert_eq!(db.open_session_names(ServerId::new(1))?, vec!["B", "C"]);
        Ok(())
    }
}
