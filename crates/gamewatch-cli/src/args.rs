use crate::types::{LogLevel, OutputFormat};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gamewatch")]
#[command(about = "Poll game servers and track who is playing", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory [default: $GAMEWATCH_PATH, then the platform data dir]
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Config file [default: <data-dir>/gamewatch.toml]
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Overridden by RUST_LOG when set
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Poll the configured servers until Ctrl-C
    Run {
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Do not print live status updates
        #[arg(long)]
        quiet: bool,
    },

    /// Query one server once and print its status and roster
    Probe {
        /// Game type, see `gamewatch games`
        game: String,

        /// host or host:port
        address: String,

        port: Option<u16>,

        #[arg(long, default_value = "3000")]
        timeout_ms: u64,
    },

    /// Latest stored status of every server
    Status,

    /// Player sessions, newest first
    Sessions {
        #[arg(long)]
        server: Option<u64>,

        #[arg(long)]
        player: Option<String>,

        /// Only sessions still in progress
        #[arg(long)]
        open: bool,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Player-count history of one server
    History {
        server_id: u64,

        #[arg(long, default_value = "24")]
        hours: i64,

        #[arg(long, default_value = "1000")]
        limit: usize,

        /// Write rows as CSV instead of a summary
        #[arg(long)]
        csv: bool,
    },

    /// Delete history older than a number of days
    Prune {
        #[arg(long, default_value = "30")]
        days: i64,

        /// Compact the database file afterwards
        #[arg(long)]
        vacuum: bool,
    },

    /// Supported game types
    Games,
}
