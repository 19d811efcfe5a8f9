//! The polling pipeline.
//!
//! scheduler → job queue → workers → result queue → processor → (store,
//! history buffer, alerts, status sink). The batcher drains the history
//! buffer on its own timer.

mod batcher;
mod lifecycle;
mod processor;
mod roster;
mod scheduler;
mod transitions;
mod worker;

pub use batcher::{HistoryBatcher, HistoryBuffer};
pub use lifecycle::{PollEngine, RunningEngine, ShutdownReport};
pub use processor::ResultProcessor;
pub use roster::{RosterChange, RosterTracker};
pub use scheduler::Scheduler;
pub use transitions::TransitionTracker;
pub use worker::execute_job;

use anyhow::Result;
use chrono::{DateTime, Utc};
use gamewatch_types::{Server, ServerId, StatusSnapshot};
use std::sync::Arc;
use tracing::warn;

use crate::storage::PollStore;

/// Probe request handed from the scheduler to a worker
#[derive(Debug, Clone)]
pub struct Job {
    pub server: Server,
    /// Monotonic across the engine; orders results for the same server
    pub seq: u64,
}

/// Outcome of one job, handed from a worker to the processor
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub server_id: ServerId,
    pub seq: u64,
    pub snapshot: StatusSnapshot,
    /// `None` when no roster was fetched or the roster probe failed
    pub roster: Option<Vec<String>>,
}

/// A server that left the catalog, handed from the scheduler to the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retired {
    pub server_id: ServerId,
    pub at: DateTime<Utc>,
    /// First seq handed out after the removal; results below it are from
    /// jobs enqueued before the server was dropped
    pub next_seq: u64,
}

/// Run a blocking store call off the async threads. Failures are logged under
/// `op` and returned as `None`.
pub(crate) async fn store_call<T, F>(store: &Arc<dyn PollStore>, op: &'static str, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn PollStore) -> Result<T> + Send + 'static,
{
    let store = store.clone();
    match tokio::task::spawn_blocking(move || f(store.as_ref())).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(op, error = %format!("{:#}", err), "store operation failed");
            None
        }
        Err(err) => {
            warn!(op, error = %err, "store task failed");
            None
        }
    }
}
