use crate::{Error, Result};
use gamewatch_types::{AlertPolicy, GameType, Server, ServerId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "gamewatch.toml";
pub const DATABASE_FILE: &str = "gamewatch.db";

/// Resolve the data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. GAMEWATCH_PATH environment variable (with tilde expansion)
/// 3. XDG data directory
/// 4. ~/.gamewatch
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("GAMEWATCH_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("gamewatch"));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".gamewatch"));
    }

    Err(Error::Config(
        "Could not determine data directory: no HOME or XDG data directory found".to_string(),
    ))
}

/// Replace a leading `~/` with the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Engine tuning. Every duration is in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub workers: usize,
    pub tick_ms: u64,
    /// Re-probe interval for servers that had players on the last probe
    pub active_interval_ms: u64,
    /// Re-probe interval for empty, offline or never-probed servers
    pub idle_interval_ms: u64,
    pub probe_timeout_ms: u64,
    pub job_queue: usize,
    pub result_queue: usize,
    pub alert_queue: usize,
    pub batch_interval_ms: u64,
    pub batch_size: usize,
    pub alert_drain_timeout_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            workers: 50,
            tick_ms: 5_000,
            active_interval_ms: 10_000,
            idle_interval_ms: 60_000,
            probe_timeout_ms: 3_000,
            job_queue: 1_000,
            result_queue: 1_000,
            alert_queue: 100,
            batch_interval_ms: 30_000,
            batch_size: 100,
            alert_drain_timeout_ms: 5_000,
        }
    }
}

impl PollerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn active_interval(&self) -> Duration {
        Duration::from_millis(self.active_interval_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    pub fn alert_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_drain_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("workers", self.workers),
            ("job_queue", self.job_queue),
            ("result_queue", self.result_queue),
            ("alert_queue", self.alert_queue),
            ("batch_size", self.batch_size),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(Error::Config(format!("poller.{} must be at least 1", name)));
            }
        }

        let durations = [
            ("tick_ms", self.tick_ms),
            ("active_interval_ms", self.active_interval_ms),
            ("idle_interval_ms", self.idle_interval_ms),
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("batch_interval_ms", self.batch_interval_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(Error::Config(format!("poller.{} must be positive", name)));
            }
        }

        Ok(())
    }
}

/// One `[[servers]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub id: u64,
    pub host: String,
    /// Defaults to the game's conventional query port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub game: GameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<AlertPolicy>,
}

impl ServerEntry {
    pub fn to_server(&self) -> Server {
        let port = self.port.unwrap_or_else(|| self.game.default_port());
        Server::new(self.id, self.host.clone(), port, self.game.clone())
    }

    pub fn policy(&self) -> AlertPolicy {
        self.alerts.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl Config {
    /// Load and validate `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    pub fn validate(&self) -> Result<()> {
        self.poller.validate()?;

        let mut seen = HashSet::new();
        for entry in &self.servers {
            if !seen.insert(entry.id) {
                return Err(Error::Config(format!("duplicate server id {}", entry.id)));
            }
            if entry.host.trim().is_empty() {
                return Err(Error::Config(format!("server {} has an empty host", entry.id)));
            }
            if entry.port == Some(0) {
                return Err(Error::Config(format!("server {} has port 0", entry.id)));
            }
        }

        Ok(())
    }

    pub fn servers(&self) -> Vec<Server> {
        self.servers.iter().map(ServerEntry::to_server).collect()
    }

    pub fn policies(&self) -> HashMap<ServerId, AlertPolicy> {
        self.servers
            .iter()
            .map(|entry| (ServerId::new(entry.id), entry.policy()))
            .collect()
    }

    /// Starter config written by `gamewatch init`.
    pub fn example() -> Self {
        Self {
            poller: PollerConfig::default(),
            servers: vec![
                ServerEntry {
                    id: 1,
                    host: "mc.example.com".to_string(),
                    port: None,
                    game: GameType::Minecraft,
                    alerts: Some(AlertPolicy {
                        enabled: true,
                        notify_online: true,
                    }),
                },
                ServerEntry {
                    id: 2,
                    host: "cs.example.com".to_string(),
                    port: Some(27015),
                    game: GameType::Source,
                    alerts: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_engine_constants() {
        let poller = PollerConfig::default();
        assert_eq!(poller.workers, 50);
        assert_eq!(poller.tick(), Duration::from_secs(5));
        assert_eq!(poller.active_interval(), Duration::from_secs(10));
        assert_eq!(poller.idle_interval(), Duration::from_secs(60));
        assert_eq!(poller.probe_timeout(), Duration::from_secs(3));
        assert_eq!(poller.batch_interval(), Duration::from_secs(30));
        assert_eq!(poller.batch_size, 100);
    }

    #[test]
    fn test_parse_servers_and_policies() -> Result<()> {
        let config = Config::parse(
            r#"
            [poller]
            workers = 4

            [[servers]]
            id = 1
            host = "127.0.0.1"
            port = 7777
            game = "open.mp"

            [[servers]]
            id = 2
            host = "mc.local"
            game = "minecraft"

            [servers.alerts]
            notify_online = true
            "#,
        )?;

        assert_eq!(config.poller.workers, 4);
        assert_eq!(config.poller.tick_ms, 5_000);

        let servers = config.servers();
        assert_eq!(servers[0].game, GameType::Samp);
        assert_eq!(servers[1].port, 25565);

        let policies = config.policies();
        assert_eq!(policies[&ServerId::new(1)], AlertPolicy::default());
        let second = policies[&ServerId::new(2)];
        assert!(second.enabled && second.notify_online);
        Ok(())
    }

    #[test]
    fn test_rejects_zero_workers_and_capacities() {
        for key in ["workers", "job_queue", "result_queue", "alert_queue"] {
            let err = Config::parse(&format!("[poller]\n{} = 0\n", key)).unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);
        }
    }

    #[test]
    fn test_rejects_duplicate_server_ids() {
        let err = Config::parse(
            r#"
            [[servers]]
            id = 3
            host = "a"
            game = "rust"

            [[servers]]
            id = 3
            host = "b"
            game = "gmod"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate server id 3"));
    }

    #[test]
    fn test_save_and_load_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = Config::default_path(temp_dir.path());

        let config = Config::example();
        config.save_to(&path)?;
        assert_eq!(Config::load_from(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from(&temp_dir.path().join("missing.toml"))?;
        assert!(config.servers.is_empty());
        assert_eq!(config.poller, PollerConfig::default());
        Ok(())
    }

    #[test]
    fn test_explicit_data_dir_wins() -> Result<()> {
        assert_eq!(
            resolve_data_dir(Some("/srv/gamewatch"))?,
            PathBuf::from("/srv/gamewatch")
        );
        Ok(())
    }
}
