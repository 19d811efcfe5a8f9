//! Plain-text views. JSON output is produced by the handlers with serde_json.

mod history;
mod probe;
mod sessions;
mod status;

pub use history::HistoryView;
pub use probe::{GamesView, ProbeView};
pub use sessions::SessionListView;
pub use status::{LiveUpdateLine, StatusListView, StatusRow};

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use std::fmt;

/// Color switch shared by every view
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn green(&self, value: impl fmt::Display) -> String {
        if self.color {
            value.green().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn red(&self, value: impl fmt::Display) -> String {
        if self.color {
            value.red().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn yellow(&self, value: impl fmt::Display) -> String {
        if self.color {
            value.yellow().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn dim(&self, value: impl fmt::Display) -> String {
        if self.color {
            value.bright_black().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn bold(&self, value: impl fmt::Display) -> String {
        if self.color {
            value.bold().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn online(&self, online: bool) -> String {
        if online {
            self.green("online")
        } else {
            self.red("offline")
        }
    }
}

/// "just now", "5 min ago", "3 hours ago", "2 days ago"
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);

    let seconds = elapsed.num_seconds();
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else if days == 1 {
        "yesterday".to_string()
    } else {
        format!("{} days ago", days)
    }
}

/// "45s", "12m05s", "3h02m"
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::seconds(10), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5 min ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::days(1), now), "yesterday");
        assert_eq!(relative_time(now - Duration::days(4), now), "4 days ago");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(725), "12m05s");
        assert_eq!(format_duration(10_920), "3h02m");
        assert_eq!(format_duration(-5), "0s");
    }

    #[test]
    fn test_palette_without_color_is_plain() {
        let palette = Palette::new(false);
        assert_eq!(palette.online(true), "online");
        assert_eq!(palette.red("x"), "x");
    }
}
