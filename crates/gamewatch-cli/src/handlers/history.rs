use crate::context::ExecutionContext;
use crate::presentation::{HistoryView, Palette};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use gamewatch_types::ServerId;

pub fn handle(
    ctx: &ExecutionContext,
    server_id: u64,
    hours: i64,
    limit: usize,
    csv: bool,
) -> Result<()> {
    if hours <= 0 {
        bail!("--hours must be positive");
    }

    let since = window_start(Duration::try_hours(hours), "--hours")?;
    let server_id = ServerId::new(server_id);
    let db = ctx.db()?;
    let points = db.history_since(server_id, since, Some(limit))?;

    if csv {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        writer.write_record(["timestamp", "players", "online", "ping_ms"])?;
        for point in &points {
            writer.write_record([
                point.timestamp.to_rfc3339(),
                point.players.to_string(),
                point.online.to_string(),
                point.ping_ms.to_string(),
            ])?;
        }
        writer.flush()?;
        return Ok(());
    }

    let stats = db.history_stats(server_id, since)?;

    if ctx.is_json() {
        let out = serde_json::json!({
            "server_id": server_id,
            "hours": hours,
            "stats": stats,
            "uptime_ratio": stats.uptime_ratio(),
            "points": points,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!(
        "{}",
        HistoryView::new(server_id, hours, stats, points, Palette::new(ctx.color))
    );
    Ok(())
}

/// Delete history older than `days` days, optionally compacting the file.
pub fn prune(ctx: &ExecutionContext, days: i64, vacuum: bool) -> Result<()> {
    if days < 0 {
        bail!("--days must not be negative");
    }

    let cutoff = window_start(Duration::try_days(days), "--days")?;
    let db = ctx.db()?;
    let deleted = db.prune_history(cutoff)?;
    let remaining = db.count_history(None)?;
    if vacuum {
        db.vacuum()?;
    }

    if ctx.is_json() {
        let out = serde_json::json!({
            "deleted": deleted,
            "remaining": remaining,
            "vacuumed": vacuum,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Deleted {} history rows older than {} days ({} remain)",
            deleted, days, remaining
        );
    }
    Ok(())
}

/// Now minus `span`; `None` or an out-of-range result means the flag was too large.
fn window_start(span: Option<Duration>, flag: &str) -> Result<DateTime<Utc>> {
    span.and_then(|span| Utc::now().checked_sub_signed(span))
        .with_context(|| format!("{} is too large", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start_rejects_overflowing_spans() {
        let err = window_start(Duration::try_hours(9_999_999_999_999_999), "--hours").unwrap_err();
        assert_eq!(err.to_string(), "--hours is too large");
        assert!(window_start(Duration::try_days(i64::MAX / 1_000), "--days").is_err());

        let start = window_start(Duration::try_hours(24), "--hours").unwrap();
        assert!(Utc::now() - start >= Duration::hours(24));
    }
}
