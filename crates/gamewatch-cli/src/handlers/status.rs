use crate::context::ExecutionContext;
use crate::presentation::{Palette, StatusListView, StatusRow};
use anyhow::Result;
use chrono::Utc;
use gamewatch_types::{Server, ServerId, StatusSnapshot};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
struct StatusJson<'a> {
    #[serde(flatten)]
    snapshot: &'a StatusSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    game: Option<&'a str>,
    players: &'a [String],
}

pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    let db = ctx.db()?;
    let servers: HashMap<ServerId, Server> = ctx
        .config()?
        .servers()
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let mut rows = Vec::new();
    for snapshot in db.list_statuses()? {
        let players = if snapshot.online {
            db.open_session_names(snapshot.server_id)?
        } else {
            Vec::new()
        };
        rows.push(StatusRow {
            server: servers.get(&snapshot.server_id).cloned(),
            snapshot,
            players,
        });
    }

    if ctx.is_json() {
        let out: Vec<StatusJson<'_>> = rows
            .iter()
            .map(|row| StatusJson {
                snapshot: &row.snapshot,
                host: row.server.as_ref().map(|s| s.host.as_str()),
                port: row.server.as_ref().map(|s| s.port),
                game: row.server.as_ref().map(|s| s.game.as_str()),
                players: &row.players,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!(
        "{}",
        StatusListView::new(rows, Palette::new(ctx.color), Utc::now())
    );
    Ok(())
}
