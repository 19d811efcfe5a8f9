use super::{Palette, relative_time};
use chrono::{DateTime, Utc};
use gamewatch_runtime::StatusUpdate;
use gamewatch_types::{Server, StatusSnapshot};
use std::fmt;

pub struct StatusRow {
    pub snapshot: StatusSnapshot,
    /// `None` for rows whose server was removed from the config
    pub server: Option<Server>,
    pub players: Vec<String>,
}

pub struct StatusListView {
    rows: Vec<StatusRow>,
    palette: Palette,
    now: DateTime<Utc>,
}

impl StatusListView {
    pub fn new(rows: Vec<StatusRow>, palette: Palette, now: DateTime<Utc>) -> Self {
        Self { rows, palette, now }
    }
}

impl fmt::Display for StatusListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "No status recorded yet. Run `gamewatch run` first.");
        }

        let p = self.palette;
        for row in &self.rows {
            let s = &row.snapshot;
            let (game, address) = match &row.server {
                Some(server) => (server.game.to_string(), server.address()),
                None => ("?".to_string(), "(not configured)".to_string()),
            };

            writeln!(
                f,
                "{} {} {} {} {}",
                p.yellow(format!("#{}", s.server_id)),
                p.online(s.online),
                p.bold(&address),
                p.dim(format!("[{}]", game)),
                p.dim(relative_time(s.last_update, self.now)),
            )?;

            if s.online {
                let name = if s.server_name.is_empty() {
                    "-"
                } else {
                    s.server_name.as_str()
                };
                writeln!(
                    f,
                    "    {}  {}/{} players  map {}  {}ms",
                    name, s.players_now, s.players_max, s.map, s.ping_ms
                )?;
                if !row.players.is_empty() {
                    writeln!(f, "    {}", row.players.join(", "))?;
                }
            }
        }
        Ok(())
    }
}

/// One line per processed probe, printed by `gamewatch run`
pub struct LiveUpdateLine<'a> {
    pub update: &'a StatusUpdate,
    pub palette: Palette,
}

impl fmt::Display for LiveUpdateLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.palette;
        let s = &self.update.snapshot;
        write!(
            f,
            "{} {} {}",
            p.dim(s.last_update.format("%H:%M:%S")),
            p.yellow(format!("#{}", self.update.server_id)),
            p.online(s.online),
        )?;
        if s.online {
            write!(
                f,
                " {}/{} {} {}ms",
                s.players_now, s.players_max, s.map, s.ping_ms
            )?;
        }
        Ok(())
    }
}
