use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::server::ServerId;

/// Continuous presence of one named player on one server.
///
/// `ended_at` stays `None` while the player is present. `duration_secs` is
/// only meaningful once the session is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSession {
    pub server_id: ServerId,
    pub player_name: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: i64,
}

impl PlayerSession {
    pub fn open(server_id: ServerId, player_name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            server_id,
            player_name: player_name.into(),
            started_at: at,
            ended_at: None,
            duration_secs: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn close(&mut self, at: DateTime<Utc>) {
        self.duration_secs = session_duration_secs(self.started_at, at);
        self.ended_at = Some(at);
    }
}

/// Whole seconds between `start` and `end`, clamped at zero.
pub fn session_duration_secs(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}
