use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::report::ProbeReport;
use crate::Result;

/// Minecraft does not report a map; every snapshot carries this placeholder
pub const MAP_PLACEHOLDER: &str = "world";

static FORMAT_CODE: Lazy<Regex> = Lazy::new(|| Regex::new("§.").expect("valid regex"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub players: Players,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub description: Option<Description>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Players {
    #[serde(default)]
    pub online: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub sample: Vec<SamplePlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplePlayer {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: i32,
}

/// MOTD: a bare string, a chat component or a list of components.
///
/// Anything else is kept as `Other` and reads as empty text, so an odd MOTD
/// never fails the status probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Component(ChatComponent),
    List(Vec<Description>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatComponent {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub extra: Vec<Description>,
}

impl Description {
    /// Concatenated text of this component and its children, unformatted.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect(&mut out);
        strip_formatting(&out)
    }

    fn collect(&self, out: &mut String) {
        match self {
            Description::Text(text) => out.push_str(text),
            Description::Component(component) => {
                out.push_str(&component.text);
                for child in &component.extra {
                    child.collect(out);
                }
            }
            Description::List(parts) => {
                for part in parts {
                    part.collect(out);
                }
            }
            Description::Other(_) => {}
        }
    }
}

/// Remove legacy `§x` color/format codes and surrounding whitespace.
pub fn strip_formatting(text: &str) -> String {
    FORMAT_CODE.replace_all(text, "").trim().to_string()
}

pub fn parse(json: &str) -> Result<StatusResponse> {
    Ok(serde_json::from_str(json)?)
}

impl StatusResponse {
    pub fn report(&self) -> ProbeReport {
        ProbeReport {
            players_now: self.players.online,
            players_max: self.players.max,
            map: MAP_PLACEHOLDER.to_string(),
            server_name: self
                .description
                .as_ref()
                .map(Description::plain_text)
                .unwrap_or_default(),
            ping_ms: 0,
        }
    }

    pub fn player_names(&self) -> Vec<String> {
        self.players
            .sample
            .iter()
            .map(|p| p.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}
