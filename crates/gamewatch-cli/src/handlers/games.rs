use crate::context::ExecutionContext;
use crate::presentation::{GamesView, Palette};
use anyhow::Result;
use gamewatch_protocols::{game_protocol_table, get_protocol_metadata};
use gamewatch_types::GameType;

pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    if ctx.is_json() {
        let games: Vec<_> = game_protocol_table()
            .into_iter()
            .map(|(tag, protocol)| {
                let meta = get_protocol_metadata(protocol);
                serde_json::json!({
                    "game": tag,
                    "protocol": protocol.as_str(),
                    "transport": meta.transport,
                    "supports_roster": meta.supports_roster,
                    "default_port": GameType::from(tag).default_port(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&games)?);
        return Ok(());
    }

    print!(
        "{}",
        GamesView {
            palette: Palette::new(ctx.color),
        }
    );
    Ok(())
}
