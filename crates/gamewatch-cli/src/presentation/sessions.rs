use super::{Palette, format_duration};
use chrono::{DateTime, Utc};
use gamewatch_index::SessionRecord;
use std::fmt;

pub struct SessionListView {
    sessions: Vec<SessionRecord>,
    palette: Palette,
    now: DateTime<Utc>,
}

impl SessionListView {
    pub fn new(sessions: Vec<SessionRecord>, palette: Palette, now: DateTime<Utc>) -> Self {
        Self {
            sessions,
            palette,
            now,
        }
    }
}

impl fmt::Display for SessionListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sessions.is_empty() {
            return writeln!(f, "No sessions found.");
        }

        let p = self.palette;
        for session in &self.sessions {
            let (length, state) = match session.ended_at {
                Some(_) => (format_duration(session.duration_secs), p.dim("ended")),
                None => (
                    format_duration((self.now - session.started_at).num_seconds()),
                    p.green("playing"),
                ),
            };

            writeln!(
                f,
                "{} {} {} {} {}",
                p.dim(session.started_at.format("%Y-%m-%d %H:%M:%S")),
                p.yellow(format!("#{}", session.server_id)),
                p.bold(&session.player_name),
                length,
                state,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use gamewatch_types::ServerId;

    #[test]
    fn test_open_and_closed_sessions() {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let sessions = vec![
            SessionRecord {
                id: 2,
                server_id: ServerId::new(1),
                player_name: "Alice".to_string(),
                started_at: start,
                ended_at: None,
                duration_secs: 0,
            },
            SessionRecord {
                id: 1,
                server_id: ServerId::new(1),
                player_name: "Bob".to_string(),
                started_at: start,
                ended_at: Some(start + Duration::seconds(725)),
                duration_secs: 725,
            },
        ];

        let out =
            SessionListView::new(sessions, Palette::new(false), start + Duration::seconds(90))
                .to_string();
        assert!(out.contains("2026-03-14 12:00:00 #1 Alice 1m30s playing"));
        assert!(out.contains("#1 Bob 12m05s ended"));
    }
}
