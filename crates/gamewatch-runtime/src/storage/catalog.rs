use anyhow::Result;
use gamewatch_types::Server;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

use super::ServerCatalog;
use crate::config::Config;

/// In-memory server list, replaceable while the engine runs.
pub struct StaticCatalog {
    servers: Mutex<Vec<Server>>,
}

impl StaticCatalog {
    pub fn new(servers: Vec<Server>) -> Self {
        Self {
            servers: Mutex::new(servers),
        }
    }

    pub fn set(&self, servers: Vec<Server>) {
        if let Ok(mut current) = self.servers.lock() {
            *current = servers;
        }
    }
}

impl ServerCatalog for StaticCatalog {
    fn servers(&self) -> Result<Vec<Server>> {
        let servers = self
            .servers
            .lock()
            .map_err(|_| anyhow::anyhow!("catalog mutex poisoned"))?;
        Ok(servers.clone())
    }
}

/// Server list re-read from the config file on every call.
///
/// An unreadable or invalid file keeps the last good list, so a half-saved
/// edit does not empty the catalog.
pub struct ConfigFileCatalog {
    path: PathBuf,
    last_good: Mutex<Vec<Server>>,
}

impl ConfigFileCatalog {
    pub fn new(path: PathBuf, initial: Vec<Server>) -> Self {
        Self {
            path,
            last_good: Mutex::new(initial),
        }
    }
}

impl ServerCatalog for ConfigFileCatalog {
    fn servers(&self) -> Result<Vec<Server>> {
        let mut last_good = self
            .last_good
            .lock()
            .map_err(|_| anyhow::anyhow!("catalog mutex poisoned"))?;

        match Config::load_from(&self.path) {
            Ok(config) => {
                *last_good = config.servers();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "keeping previous server list");
            }
        }

        Ok(last_good.clone())
    }
}
