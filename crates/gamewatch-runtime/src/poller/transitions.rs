use chrono::{DateTime, Utc};
use gamewatch_types::{Alert, ServerId};
use std::collections::HashMap;

/// Remembers the last online flag per server and turns edges into alerts.
///
/// In-memory only: after a restart the first observation of each server is a
/// baseline and never alerts.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    last_online: HashMap<ServerId, bool>,
    offline_since: HashMap<ServerId, DateTime<Utc>>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, server_id: ServerId, online: bool, at: DateTime<Utc>) -> Option<Alert> {
        let previous = self.last_online.insert(server_id, online);

        match (previous, online) {
            (None, false) => {
                self.offline_since.insert(server_id, at);
                None
            }
            (None, true) => None,
            (Some(true), false) => {
                self.offline_since.insert(server_id, at);
                Some(Alert::Offline { server_id, at })
            }
            (Some(false), true) => {
                let downtime = self.offline_since.remove(&server_id).map(|since| at - since);
                Some(Alert::Online {
                    server_id,
                    at,
                    downtime,
                })
            }
            (Some(_), _) => None,
        }
    }

    #[cfg(test)]
    pub fn offline_since(&self, server_id: ServerId) -> Option<DateTime<Utc>> {
        self.offline_since.get(&server_id).copied()
    }

    /// Drop everything known about `server_id`; its next observation is a baseline.
    pub fn forget(&mut self, server_id: ServerId) {
        self.last_online.remove(&server_id);
        self.offline_since.remove(&server_id);
    }
}
