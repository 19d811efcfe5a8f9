use crate::context::ExecutionContext;
use crate::presentation::{Palette, SessionListView};
use anyhow::Result;
use chrono::Utc;
use gamewatch_index::SessionQuery;
use gamewatch_types::ServerId;

pub fn handle(
    ctx: &ExecutionContext,
    server: Option<u64>,
    player: Option<String>,
    open: bool,
    limit: usize,
) -> Result<()> {
    let query = SessionQuery {
        server_id: server.map(ServerId::new),
        player_name: player,
        open_only: open,
        limit: Some(limit),
    };
    let sessions = ctx.db()?.list_sessions(&query)?;

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    print!(
        "{}",
        SessionListView::new(sessions, Palette::new(ctx.color), Utc::now())
    );
    Ok(())
}
