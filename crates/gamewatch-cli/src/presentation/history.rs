use super::Palette;
use gamewatch_index::HistoryStats;
use gamewatch_types::{HistoryPoint, ServerId};
use std::fmt;

/// Summary of a history window plus its most recent samples
pub struct HistoryView {
    server_id: ServerId,
    hours: i64,
    stats: HistoryStats,
    points: Vec<HistoryPoint>,
    palette: Palette,
}

impl HistoryView {
    /// Samples shown under the summary
    const RECENT: usize = 10;

    pub fn new(
        server_id: ServerId,
        hours: i64,
        stats: HistoryStats,
        points: Vec<HistoryPoint>,
        palette: Palette,
    ) -> Self {
        Self {
            server_id,
            hours,
            stats,
            points,
            palette,
        }
    }
}

impl fmt::Display for HistoryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.palette;
        writeln!(
            f,
            "{} last {}h",
            p.bold(format!("Server #{}", self.server_id)),
            self.hours
        )?;

        if self.stats.samples == 0 {
            return writeln!(f, "  no samples");
        }

        writeln!(
            f,
            "  samples {}  uptime {:.1}%  peak {}  avg {:.1}",
            self.stats.samples,
            self.stats.uptime_ratio() * 100.0,
            self.stats.peak_players,
            self.stats.avg_players
        )?;

        let skip = self.points.len().saturating_sub(Self::RECENT);
        for point in &self.points[skip..] {
            let state = if point.online {
                format!("{:>3} players {:>4}ms", point.players, point.ping_ms)
            } else {
                p.red("offline")
            };
            writeln!(
                f,
                "  {} {}",
                p.dim(point.timestamp.format("%Y-%m-%d %H:%M:%S")),
                state
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_shows_summary_and_recent_points() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let points: Vec<HistoryPoint> = (0..12)
            .map(|i| HistoryPoint {
                server_id: ServerId::new(3),
                players: i,
                online: i != 11,
                ping_ms: 20,
                timestamp: t0 + Duration::minutes(i as i64),
            })
            .collect();
        let stats = HistoryStats {
            samples: 12,
            online_samples: 11,
            peak_players: 10,
            avg_players: 5.0,
        };

        let out = HistoryView::new(ServerId::new(3), 24, stats, points, Palette::new(false)).to_string();
        assert!(out.starts_with("Server #3 last 24h"));
        assert!(out.contains("uptime 91.7%  peak 10  avg 5.0"));
        // Only the ten most recent samples are listed
        assert!(!out.contains("12:01:00"));
        assert!(out.contains("12:02:00   2 players   20ms"));
        assert!(out.contains("12:11:00 offline"));
    }
}
