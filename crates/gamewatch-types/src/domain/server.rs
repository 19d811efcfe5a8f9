use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Identifier of a monitored server, owned by the catalog that supplies the server list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(u64);

impl ServerId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ServerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Wire protocol used to query a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Valve Source engine query (A2S_INFO / A2S_PLAYER over UDP)
    Source,
    /// SA-MP / open.mp query (UDP)
    Samp,
    /// Minecraft Java server list ping (JSON over TCP)
    Minecraft,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Source => "source",
            Protocol::Samp => "samp",
            Protocol::Minecraft => "minecraft",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared game type of a server.
///
/// The tag comes from the catalog as free text. Known tags map to a concrete
/// variant; anything else is kept verbatim in `Other` and queried with the
/// Source protocol as a best-effort default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameType {
    Source,
    Fivem,
    Gmod,
    Valheim,
    Dayz,
    Squad,
    Arma3,
    Rust,
    Vrising,
    Icarus,
    Samp,
    Minecraft,
    MinecraftBedrock,
    Terraria,
    Other(String),
}

impl GameType {
    pub fn as_str(&self) -> &str {
        match self {
            GameType::Source => "source",
            GameType::Fivem => "fivem",
            GameType::Gmod => "gmod",
            GameType::Valheim => "valheim",
            GameType::Dayz => "dayz",
            GameType::Squad => "squad",
            GameType::Arma3 => "arma3",
            GameType::Rust => "rust",
            GameType::Vrising => "vrising",
            GameType::Icarus => "icarus",
            GameType::Samp => "samp",
            GameType::Minecraft => "minecraft",
            GameType::MinecraftBedrock => "minecraft_bedrock",
            GameType::Terraria => "terraria",
            GameType::Other(tag) => tag,
        }
    }

    /// Protocol used for status probes of this game type.
    pub fn protocol(&self) -> Protocol {
        match self {
            GameType::Minecraft => Protocol::Minecraft,
            GameType::Samp => Protocol::Samp,
            GameType::Source
            | GameType::Fivem
            | GameType::Gmod
            | GameType::Valheim
            | GameType::Dayz
            | GameType::Squad
            | GameType::Arma3
            | GameType::Rust
            | GameType::Vrising
            | GameType::Icarus => Protocol::Source,
            // Bedrock, Terraria and unknown tags have no dedicated client
            GameType::MinecraftBedrock | GameType::Terraria | GameType::Other(_) => {
                Protocol::Source
            }
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, GameType::Other(_))
    }

    /// Conventional query port, used when an address omits the port.
    pub fn default_port(&self) -> u16 {
        match self {
            GameType::Minecraft => 25565,
            GameType::MinecraftBedrock => 19132,
            GameType::Samp | GameType::Terraria => 7777,
            GameType::Fivem => 30120,
            GameType::Valheim => 2457,
            GameType::Rust => 28015,
            GameType::Arma3 => 2303,
            GameType::Dayz => 27016,
            GameType::Squad => 27165,
            GameType::Vrising => 9877,
            GameType::Source | GameType::Gmod | GameType::Icarus | GameType::Other(_) => 27015,
        }
    }

    pub fn all_known() -> &'static [&'static str] {
        &[
            "source",
            "fivem",
            "gmod",
            "valheim",
            "dayz",
            "squad",
            "arma3",
            "rust",
            "vrising",
            "icarus",
            "samp",
            "minecraft",
            "minecraft_bedrock",
            "terraria",
        ]
    }
}

impl From<&str> for GameType {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "source" => GameType::Source,
            "fivem" => GameType::Fivem,
            "gmod" => GameType::Gmod,
            "valheim" => GameType::Valheim,
            "dayz" => GameType::Dayz,
            "squad" => GameType::Squad,
            "arma3" => GameType::Arma3,
            "rust" => GameType::Rust,
            "vrising" => GameType::Vrising,
            "icarus" => GameType::Icarus,
            "samp" | "openmp" | "open.mp" => GameType::Samp,
            "minecraft" => GameType::Minecraft,
            "minecraft_bedrock" => GameType::MinecraftBedrock,
            "terraria" => GameType::Terraria,
            _ => GameType::Other(tag.to_string()),
        }
    }
}

impl From<String> for GameType {
    fn from(tag: String) -> Self {
        GameType::from(tag.as_str())
    }
}

impl From<GameType> for String {
    fn from(game: GameType) -> Self {
        game.as_str().to_string()
    }
}

impl FromStr for GameType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(GameType::from(s))
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server to poll, as supplied by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: ServerId,
    pub host: String,
    pub port: u16,
    pub game: GameType,
}

impl Server {
    pub fn new(id: impl Into<ServerId>, host: impl Into<String>, port: u16, game: GameType) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
            game,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split `host[:port]` into its parts, falling back to `default_port`.
pub fn parse_address(input: &str, default_port: u16) -> Result<(String, u16)> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidAddress("empty address".to_string()));
    }

    match input.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            if host.is_empty() {
                return Err(Error::InvalidAddress(format!("missing host in '{}'", input)));
            }
            let port = port
                .parse::<u16>()
                .map_err(|_| Error::InvalidAddress(format!("bad port in '{}'", input)))?;
            Ok((host.to_string(), port))
        }
        _ => Ok((input.to_string(), default_port)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_game_falls_back_to_source() {
        let game = GameType::from("terraria");
        assert_eq!(game.protocol(), Protocol::Source);

        let game = GameType::from("some_new_game");
        assert_eq!(game, GameType::Other("some_new_game".to_string()));
        assert_eq!(game.protocol(), Protocol::Source);
        assert!(!game.is_known());
    }

    #[test]
    fn test_game_type_serde_roundtrip_uses_tag() {
        let json = serde_json::to_string(&GameType::MinecraftBedrock).unwrap();
        assert_eq!(json, "\"minecraft_bedrock\"");

        let parsed: GameType = serde_json::from_str("\"SAMP\"").unwrap();
        assert_eq!(parsed, GameType::Samp);
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("10.0.0.5:7777", 1).unwrap(),
            ("10.0.0.5".to_string(), 7777)
        );
        assert_eq!(
            parse_address("mc.example.org", 25565).unwrap(),
            ("mc.example.org".to_string(), 25565)
        );
        assert!(parse_address("host:notaport", 1).is_err());
        assert!(parse_address("", 1).is_err());
    }
}
