use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::server::ServerId;

/// Per-server alert configuration consulted before delivering an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Also announce recoveries, not just outages
    #[serde(default)]
    pub notify_online: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            notify_online: false,
        }
    }
}

impl AlertPolicy {
    pub fn allows(&self, alert: &Alert) -> bool {
        match alert {
            Alert::Offline { .. } => self.enabled,
            Alert::Online { .. } => self.enabled && self.notify_online,
        }
    }
}

/// Online/offline edge detected for a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Offline {
        server_id: ServerId,
        at: DateTime<Utc>,
    },
    Online {
        server_id: ServerId,
        at: DateTime<Utc>,
        /// Time since the server went offline, when that edge was observed
        downtime: Option<Duration>,
    },
}

impl Alert {
    pub fn server_id(&self) -> ServerId {
        match self {
            Alert::Offline { server_id, .. } | Alert::Online { server_id, .. } => *server_id,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Alert::Offline { .. })
    }

    /// Single-line human readable description
    pub fn describe(&self) -> String {
        match self {
            Alert::Offline { server_id, .. } => format!("server {} is offline", server_id),
            Alert::Online {
                server_id,
                downtime,
                ..
            } => match downtime.map(|d| d.num_minutes()) {
                Some(mins) if mins > 0 => {
                    format!("server {} is back online (down {} min)", server_id, mins)
                }
                _ => format!("server {} is back online", server_id),
            },
        }
    }
}
