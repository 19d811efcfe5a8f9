//! TestWorld pattern for CLI integration tests.
//!
//! Owns an isolated data directory, accumulates `[[servers]]` entries into a
//! config file, and runs the `gamewatch` binary against both.

use anyhow::Result;
use assert_cmd::Command;
use gamewatch_types::GameType;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use gamewatch_testing::TestWorld;
/// use gamewatch_types::GameType;
///
/// let world = TestWorld::new()
///     .with_server(1, GameType::Minecraft, "127.0.0.1:25565".parse().unwrap());
/// world.write_config().unwrap();
///
/// let result = world.run(&["run", "--duration", "2"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
    poller: Vec<String>,
    servers: Vec<String>,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".gamewatch");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        Self {
            temp_dir,
            data_dir,
            poller: Vec::new(),
            servers: Vec::new(),
            env_vars: HashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("gamewatch.toml")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("gamewatch.db")
    }

    /// Add a `key = value` line to the `[poller]` table. `value` is raw TOML.
    pub fn with_poller_setting(mut self, key: &str, value: &str) -> Self {
        self.poller.push(format!("{} = {}", key, value));
        self
    }

    /// Register a server to be written into the config file.
    pub fn with_server(mut self, id: u64, game: GameType, addr: SocketAddr) -> Self {
        let mut entry = String::new();
        let _ = writeln!(entry, "[[servers]]");
        let _ = writeln!(entry, "id = {}", id);
        let _ = writeln!(entry, "host = \"{}\"", addr.ip());
        let _ = writeln!(entry, "port = {}", addr.port());
        let _ = writeln!(entry, "game = \"{}\"", game.as_str());
        self.servers.push(entry);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Render the accumulated settings as TOML.
    pub fn config_toml(&self) -> String {
        let mut out = String::new();
        if !self.poller.is_empty() {
            out.push_str("[poller]\n");
            for line in &self.poller {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        for server in &self.servers {
            out.push_str(server);
            out.push('\n');
        }
        out
    }

    /// Write the config file to `config_path()`.
    pub fn write_config(&self) -> Result<PathBuf> {
        let path = self.config_path();
        std::fs::write(&path, self.config_toml())?;
        Ok(path)
    }

    /// Configure a CLI command with this environment's data dir and env vars.
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--data-dir").arg(self.data_dir());
        cmd.current_dir(self.temp_dir.path());
        cmd.env_remove("GAMEWATCH_PATH");
        cmd.env("RUST_LOG", "warn");
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd
    }

    /// Execute the `gamewatch` binary with `args` and capture its output.
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("gamewatch")
            .map_err(|e| anyhow::anyhow!("Failed to find gamewatch binary: {}", e))?;

        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;

        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
