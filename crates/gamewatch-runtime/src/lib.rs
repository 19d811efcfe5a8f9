pub mod alerts;
pub mod config;
pub mod error;
pub mod hub;
pub mod poller;
pub mod prober;
pub mod storage;

pub use alerts::{AlertDispatcher, AlertNotifier, AlertSender, LogNotifier, PolicyNotifier};
pub use config::{CONFIG_FILE, Config, DATABASE_FILE, PollerConfig, ServerEntry, resolve_data_dir};
pub use error::{Error, Result};
pub use hub::{StatusHub, StatusSink, StatusUpdate};
pub use poller::{Job, PollEngine, ProbeResult, RunningEngine, ShutdownReport, execute_job};
pub use prober::{NetworkProber, Prober};
pub use storage::{ConfigFileCatalog, MemoryStore, PollStore, ServerCatalog, SqliteStore, StaticCatalog};
