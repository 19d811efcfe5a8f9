use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::server::ServerId;

/// Most recently observed state of a server.
///
/// Exactly one snapshot exists per server; every probe overwrites it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub server_id: ServerId,
    pub online: bool,
    pub players_now: u32,
    pub players_max: u32,
    pub map: String,
    pub server_name: String,
    pub ping_ms: u32,
    pub last_update: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Snapshot recorded for a failed probe: offline with every other field zeroed.
    pub fn offline(server_id: ServerId, at: DateTime<Utc>) -> Self {
        Self {
            server_id,
            online: false,
            players_now: 0,
            players_max: 0,
            map: String::new(),
            server_name: String::new(),
            ping_ms: 0,
            last_update: at,
        }
    }

    pub fn has_players(&self) -> bool {
        self.online && self.players_now > 0
    }

    pub fn history_point(&self, timestamp: DateTime<Utc>) -> HistoryPoint {
        HistoryPoint {
            server_id: self.server_id,
            players: self.players_now,
            online: self.online,
            ping_ms: self.ping_ms,
            timestamp,
        }
    }
}

/// Append-only time-series fact, one per processed probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub server_id: ServerId,
    pub players: u32,
    pub online: bool,
    pub ping_ms: u32,
    pub timestamp: DateTime<Utc>,
}
