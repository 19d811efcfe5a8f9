use super::Palette;
use gamewatch_protocols::{ProbeReport, game_protocol_table, get_protocol_metadata};
use gamewatch_types::GameType;
use std::fmt;

pub struct ProbeView<'a> {
    pub game: &'a GameType,
    pub address: String,
    pub report: &'a ProbeReport,
    /// `Err` carries the roster probe failure message
    pub roster: &'a Result<Vec<String>, String>,
    pub palette: Palette,
}

impl fmt::Display for ProbeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.palette;
        let r = self.report;
        writeln!(
            f,
            "{} {} {}",
            p.bold(&self.address),
            p.online(true),
            p.dim(format!("[{} via {}]", self.game, self.game.protocol()))
        )?;
        writeln!(f, "  name     {}", r.server_name)?;
        writeln!(f, "  map      {}", r.map)?;
        writeln!(f, "  players  {}/{}", r.players_now, r.players_max)?;
        writeln!(f, "  ping     {}ms", r.ping_ms)?;

        match self.roster {
            Ok(names) if names.is_empty() => {}
            Ok(names) => writeln!(f, "  roster   {}", names.join(", "))?,
            Err(err) => writeln!(f, "  roster   {}", p.red(format!("unavailable ({})", err)))?,
        }
        Ok(())
    }
}

pub struct GamesView {
    pub palette: Palette,
}

impl fmt::Display for GamesView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (tag, protocol) in game_protocol_table() {
            let meta = get_protocol_metadata(protocol);
            writeln!(
                f,
                "{:<18} {:<10} {:<4} {}",
                self.palette.bold(tag),
                protocol.as_str(),
                meta.transport,
                GameType::from(tag).default_port()
            )?;
        }
        Ok(())
    }
}
