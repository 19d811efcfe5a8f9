use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use gamewatch_index::Database;
use gamewatch_types::{HistoryPoint, ServerId, StatusSnapshot};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::PollStore;

/// `PollStore` backed by the SQLite database in the data directory.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> crate::Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))
    }
}

impl PollStore for SqliteStore {
    fn upsert_status(&self, snapshot: &StatusSnapshot) -> Result<()> {
        Ok(self.db()?.upsert_status(snapshot)?)
    }

    fn statuses(&self) -> Result<Vec<StatusSnapshot>> {
        Ok(self.db()?.list_statuses()?)
    }

    fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize> {
        Ok(self.db()?.insert_history(points)?)
    }

    fn open_session(&self, server_id: ServerId, player: &str, at: DateTime<Utc>) -> Result<bool> {
        Ok(self.db()?.open_session(server_id, player, at)?)
    }

    fn close_session(
        &self,
        server_id: ServerId,
        player: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        Ok(self.db()?.close_session(server_id, player, at)?)
    }

    fn close_server_sessions(&self, server_id: ServerId, at: DateTime<Utc>) -> Result<usize> {
        Ok(self.db()?.close_server_sessions(server_id, at)?)
    }

    fn close_orphan_sessions(&self, at: DateTime<Utc>) -> Result<usize> {
        Ok(self.db()?.close_orphan_sessions(at)?)
    }
}
