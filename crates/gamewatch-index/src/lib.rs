// SQLite store for poll results
// One status row per server, append-only history, player sessions

mod db;
mod error;
mod queries;
mod records;
mod schema;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use records::{HistoryStats, SessionQuery, SessionRecord};
pub use schema::SCHEMA_VERSION;
