use crate::context::ExecutionContext;
use crate::presentation::{Palette, ProbeView};
use anyhow::{Context, Result, bail};
use gamewatch_protocols::QueryClient;
use gamewatch_types::{GameType, parse_address};
use std::time::Duration;

/// One-shot status probe, plus the roster when anyone is playing.
pub fn handle(
    ctx: &ExecutionContext,
    game_tag: &str,
    address: &str,
    port: Option<u16>,
    timeout_ms: u64,
) -> Result<()> {
    let game = GameType::from(game_tag);
    if !game.is_known() {
        bail!(
            "Unknown game type '{}'. Supported: {}",
            game_tag,
            GameType::all_known().join(", ")
        );
    }
    if timeout_ms == 0 {
        bail!("--timeout-ms must be positive");
    }

    let (host, parsed_port) = parse_address(address, game.default_port())?;
    let port = port.unwrap_or(parsed_port);
    let target = format!("{}:{}", host, port);
    let client = QueryClient::new(Duration::from_millis(timeout_ms));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (report, roster) = runtime
        .block_on(async {
            let report = client.probe(game.protocol(), &host, port).await?;
            let roster = if report.players_now > 0 {
                client
                    .probe_players(game.protocol(), &host, port)
                    .await
                    .map_err(|err| err.to_string())
            } else {
                Ok(Vec::new())
            };
            Ok::<_, gamewatch_protocols::Error>((report, roster))
        })
        .with_context(|| format!("{} did not respond as a {} server", target, game))?;

    if ctx.is_json() {
        let out = serde_json::json!({
            "address": target,
            "game": game.as_str(),
            "protocol": game.protocol().as_str(),
            "online": true,
            "server_name": report.server_name,
            "map": report.map,
            "players_now": report.players_now,
            "players_max": report.players_max,
            "ping_ms": report.ping_ms,
            "roster": roster.as_ref().ok(),
            "roster_error": roster.as_ref().err(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!(
        "{}",
        ProbeView {
            game: &game,
            address: target,
            report: &report,
            roster: &roster,
            palette: Palette::new(ctx.color),
        }
    );
    Ok(())
}
