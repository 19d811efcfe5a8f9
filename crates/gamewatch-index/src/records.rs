use chrono::{DateTime, Utc};
use gamewatch_types::{PlayerSession, ServerId};

/// Player session row as stored, including its row id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionRecord {
    pub id: i64,
    pub server_id: ServerId,
    pub player_name: String,
    pub started_at: DateTime<Utc>,
    /// `None` while the player is still connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Zero until the session is closed.
    pub duration_secs: i64,
}

impl SessionRecord {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn to_session(&self) -> PlayerSession {
        PlayerSession {
            server_id: self.server_id,
            player_name: self.player_name.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_secs: self.duration_secs,
        }
    }
}

/// Filter for session listings. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub server_id: Option<ServerId>,
    pub player_name: Option<String>,
    pub open_only: bool,
    pub limit: Option<usize>,
}

/// Aggregate over a server's history window.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct HistoryStats {
    pub samples: usize,
    pub online_samples: usize,
    pub peak_players: u32,
    pub avg_players: f64,
}

impl HistoryStats {
    /// Fraction of samples that saw the server online, 0.0 when there are none.
    pub fn uptime_ratio(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.online_samples as f64 / self.samples as f64
        }
    }
}
