//! Seams between the engine and the outside world: where servers come from
//! and where results go.

mod catalog;
mod memory;
mod sqlite;

pub use catalog::{ConfigFileCatalog, StaticCatalog};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use gamewatch_types::{HistoryPoint, Server, ServerId, StatusSnapshot};

/// Source of the server list, consulted on every scheduler tick.
pub trait ServerCatalog: Send + Sync {
    fn servers(&self) -> Result<Vec<Server>>;
}

/// Persistence for poll results.
///
/// Methods are blocking; the engine calls them from `spawn_blocking`.
pub trait PollStore: Send + Sync {
    /// Insert or overwrite the one status row for `snapshot.server_id`.
    fn upsert_status(&self, snapshot: &StatusSnapshot) -> Result<()>;

    fn statuses(&self) -> Result<Vec<StatusSnapshot>>;

    /// Append `points` atomically; returns the number written.
    fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize>;

    /// Open a session for (server, player). `false` when one was already open.
    fn open_session(&self, server_id: ServerId, player: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Close the open session for (server, player); returns its duration in seconds.
    fn close_session(&self, server_id: ServerId, player: &str, at: DateTime<Utc>)
    -> Result<Option<i64>>;

    /// Close every open session of one server.
    fn close_server_sessions(&self, server_id: ServerId, at: DateTime<Utc>) -> Result<usize>;

    /// Close every open session, with duration clamped at zero.
    fn close_orphan_sessions(&self, at: DateTime<Utc>) -> Result<usize>;
}
