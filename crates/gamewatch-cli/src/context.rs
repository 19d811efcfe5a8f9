use crate::types::OutputFormat;
use anyhow::{Context as _, Result};
use gamewatch_index::Database;
use gamewatch_runtime::{Config, DATABASE_FILE};
use is_terminal::IsTerminal;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

/// Resolved paths and lazily opened resources for one CLI invocation.
pub struct ExecutionContext {
    data_dir: PathBuf,
    config_path: PathBuf,
    db: OnceCell<Database>,
    config: OnceCell<Config>,
    pub format: OutputFormat,
    /// Colored output; off when stdout is not a terminal
    pub color: bool,
}

impl ExecutionContext {
    pub fn new(data_dir: PathBuf, config_path: Option<PathBuf>, format: OutputFormat) -> Self {
        let config_path = config_path.unwrap_or_else(|| Config::default_path(&data_dir));
        Self {
            data_dir,
            config_path,
            db: OnceCell::new(),
            config: OnceCell::new(),
            format,
            color: std::io::stdout().is_terminal(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn db(&self) -> Result<&Database> {
        self.db.get_or_try_init(|| {
            let db_path = self.db_path();
            Database::open(&db_path)
                .with_context(|| format!("failed to open database {}", db_path.display()))
        })
    }

    pub fn config(&self) -> Result<&Config> {
        self.config.get_or_try_init(|| {
            Config::load_from(&self.config_path)
                .with_context(|| format!("failed to load {}", self.config_path.display()))
        })
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
