use chrono::{DateTime, Utc};
use gamewatch_types::{Server, ServerId, StatusSnapshot};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Job, Retired, store_call};
use crate::config::PollerConfig;
use crate::storage::{PollStore, ServerCatalog};

/// Counts from one scheduler pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub enqueued: usize,
    pub skipped: usize,
}

/// Decides which servers need probing and enqueues them without blocking.
///
/// A server is due when `now - last` reaches its interval, where `last` is the
/// later of its snapshot's `last_update` and the scheduler's own last enqueue.
/// The enqueue time keeps a queued or in-flight server from being enqueued
/// again on the next tick.
///
/// Servers that disappear from the catalog are announced on the retirement
/// channel so the processor can close their sessions.
pub struct Scheduler {
    catalog: Arc<dyn ServerCatalog>,
    store: Arc<dyn PollStore>,
    jobs: mpsc::Sender<Job>,
    retirements: Option<mpsc::Sender<Retired>>,
    known: BTreeSet<ServerId>,
    tick: Duration,
    active_interval: chrono::Duration,
    idle_interval: chrono::Duration,
    last_enqueued: HashMap<ServerId, DateTime<Utc>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new(
        config: &PollerConfig,
        catalog: Arc<dyn ServerCatalog>,
        store: Arc<dyn PollStore>,
        jobs: mpsc::Sender<Job>,
    ) -> Self {
        Self {
            catalog,
            store,
            jobs,
            retirements: None,
            known: BTreeSet::new(),
            tick: config.tick(),
            active_interval: to_chrono(config.active_interval()),
            idle_interval: to_chrono(config.idle_interval()),
            last_enqueued: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn with_retirements(mut self, retirements: mpsc::Sender<Retired>) -> Self {
        self.retirements = Some(retirements);
        self
    }

    /// 10s-class interval for servers with players, 60s-class otherwise.
    pub fn interval_for(&self, snapshot: Option<&StatusSnapshot>) -> chrono::Duration {
        match snapshot {
            Some(snapshot) if snapshot.players_now > 0 => self.active_interval,
            _ => self.idle_interval,
        }
    }

    pub fn is_due(&self, server: &Server, snapshot: Option<&StatusSnapshot>, now: DateTime<Utc>) -> bool {
        let last_update = snapshot.map(|s| s.last_update);
        let last_enqueued = self.last_enqueued.get(&server.id).copied();

        match last_update.max(last_enqueued) {
            None => true,
            Some(last) => now - last >= self.interval_for(snapshot),
        }
    }

    /// Enqueue every due server. A full queue skips the server until the next tick.
    pub fn plan_and_enqueue(
        &mut self,
        servers: &[Server],
        statuses: &[StatusSnapshot],
        now: DateTime<Utc>,
    ) -> TickReport {
        let by_id: HashMap<ServerId, &StatusSnapshot> =
            statuses.iter().map(|s| (s.server_id, s)).collect();
        let mut report = TickReport::default();

        for server in servers {
            let snapshot = by_id.get(&server.id).copied();
            if !self.is_due(server, snapshot, now) {
                continue;
            }
            report.due += 1;

            let job = Job {
                server: server.clone(),
                seq: self.next_seq,
            };
            match self.jobs.try_send(job) {
                Ok(()) => {
                    self.next_seq += 1;
                    self.last_enqueued.insert(server.id, now);
                    report.enqueued += 1;
                }
                Err(TrySendError::Full(_)) => {
                    debug!(server_id = %server.id, "job queue full, skipping until next tick");
                    report.skipped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    report.skipped += 1;
                    break;
                }
            }
        }

        report
    }

    /// Record the current catalog and return the servers that left it since
    /// the previous call, sorted.
    pub fn retire_missing(&mut self, servers: &[Server]) -> Vec<ServerId> {
        let current: BTreeSet<ServerId> = servers.iter().map(|s| s.id).collect();
        let removed: Vec<ServerId> = self.known.difference(&current).copied().collect();
        self.last_enqueued.retain(|id, _| current.contains(id));
        self.known = current;
        removed
    }

    async fn announce_removed(&self, removed: Vec<ServerId>, now: DateTime<Utc>) {
        let Some(retirements) = &self.retirements else {
            return;
        };
        for server_id in removed {
            let retired = Retired {
                server_id,
                at: now,
                next_seq: self.next_seq,
            };
            if retirements.send(retired).await.is_err() {
                break;
            }
        }
    }

    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let servers = match self.catalog.servers() {
            Ok(servers) => servers,
            Err(err) => {
                warn!(error = %format!("{:#}", err), "server catalog unavailable, skipping tick");
                return TickReport::default();
            }
        };

        let removed = self.retire_missing(&servers);
        if !removed.is_empty() {
            debug!(?removed, "servers left the catalog");
            self.announce_removed(removed, now).await;
        }
        if servers.is_empty() {
            return TickReport::default();
        }

        let Some(statuses) = store_call(&self.store, "list statuses", |store| store.statuses()).await
        else {
            return TickReport::default();
        };

        let report = self.plan_and_enqueue(&servers, &statuses, now);
        if report.due > 0 {
            debug!(
                due = report.due,
                enqueued = report.enqueued,
                skipped = report.skipped,
                "scheduler tick"
            );
        }
        report
    }

    /// Tick until `cancel` fires. The first tick runs immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick(Utc::now()).await;
                }
            }
        }
        debug!("scheduler stopped");
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
