use chrono::{DateTime, Utc};
use gamewatch_types::{ServerId, StatusSnapshot};

/// Normalized status returned by every protocol client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub players_now: u32,
    pub players_max: u32,
    pub map: String,
    pub server_name: String,
    /// Round trip from the first request to the first complete reply
    pub ping_ms: u32,
}

impl ProbeReport {
    /// Attach identity and time, producing an online snapshot.
    pub fn into_snapshot(self, server_id: ServerId, at: DateTime<Utc>) -> StatusSnapshot {
        StatusSnapshot {
            server_id,
            online: true,
            players_now: self.players_now,
            players_max: self.players_max,
            map: self.map,
            server_name: self.server_name,
            ping_ms: self.ping_ms,
            last_update: at,
        }
    }
}
