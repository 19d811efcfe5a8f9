use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::worker::run_worker;
use super::{HistoryBatcher, HistoryBuffer, ResultProcessor, Scheduler};
use crate::alerts::{AlertDispatcher, AlertNotifier, LogNotifier};
use crate::config::PollerConfig;
use crate::error::{Error, Result};
use crate::hub::StatusSink;
use crate::prober::Prober;
use crate::storage::{PollStore, ServerCatalog};

/// What happened during a shutdown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Sessions left open by a previous run and closed at start
    pub orphans_closed: usize,
    pub results_applied: usize,
    /// History points written by the final flush
    pub history_flushed: usize,
    /// `None` when the alert queue did not drain before the deadline
    pub alerts_delivered: Option<usize>,
}

/// Engine wiring, before anything runs.
pub struct PollEngine {
    config: PollerConfig,
    catalog: Arc<dyn ServerCatalog>,
    store: Arc<dyn PollStore>,
    prober: Arc<dyn Prober>,
    sink: Option<Arc<dyn StatusSink>>,
    notifier: Arc<dyn AlertNotifier>,
}

impl PollEngine {
    pub fn new(
        config: PollerConfig,
        catalog: Arc<dyn ServerCatalog>,
        store: Arc<dyn PollStore>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            config,
            catalog,
            store,
            prober,
            sink: None,
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Close orphaned sessions, then spawn every engine task.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn start(self) -> Result<RunningEngine> {
        self.config.validate()?;
        let config = self.config;

        let store = self.store.clone();
        let orphans_closed = tokio::task::spawn_blocking(move || store.close_orphan_sessions(Utc::now()))
            .await?
            .map_err(Error::Store)?;
        if orphans_closed > 0 {
            info!(orphans_closed, "closed sessions left open by a previous run");
        }

        let cancel = CancellationToken::new();
        let dispatcher = AlertDispatcher::spawn(self.notifier, config.alert_queue);

        let (job_tx, job_rx) = mpsc::channel(config.job_queue);
        let (result_tx, result_rx) = mpsc::channel(config.result_queue);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..config.workers)
            .map(|index| {
                tokio::spawn(run_worker(
                    index,
                    self.prober.clone(),
                    job_rx.clone(),
                    result_tx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        // Only workers hold result senders, so the processor drains once they exit
        drop(result_tx);

        // Catalog removals travel scheduler → processor
        let (retire_tx, retire_rx) = mpsc::channel(config.job_queue);

        let history = HistoryBuffer::new();
        let mut processor = ResultProcessor::new(self.store.clone(), history.clone())
            .with_alerts(dispatcher.sender())
            .with_retirements(retire_rx);
        if let Some(sink) = self.sink {
            processor = processor.with_sink(sink);
        }
        let processor = tokio::spawn(processor.run(result_rx));

        let batcher = HistoryBatcher::new(
            history,
            self.store.clone(),
            config.batch_interval(),
            config.batch_size,
        );
        let batcher_task = tokio::spawn(batcher.clone().run(cancel.clone()));

        let scheduler =
            Scheduler::new(&config, self.catalog, self.store, job_tx).with_retirements(retire_tx);
        let scheduler = tokio::spawn(scheduler.run(cancel.clone()));

        info!(workers = config.workers, "poll engine started");

        Ok(RunningEngine {
            cancel,
            scheduler,
            workers,
            processor,
            batcher,
            batcher_task,
            dispatcher,
            alert_timeout: config.alert_drain_timeout(),
            orphans_closed,
        })
    }
}

/// Handle to a started engine.
pub struct RunningEngine {
    cancel: CancellationToken,
    scheduler: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    processor: JoinHandle<usize>,
    batcher: HistoryBatcher,
    batcher_task: JoinHandle<()>,
    dispatcher: AlertDispatcher,
    alert_timeout: std::time::Duration,
    orphans_closed: usize,
}

impl RunningEngine {
    /// Token that stops the engine when cancelled. `stop` still has to be
    /// awaited for the final flush.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop in dependency order: producers first, then consumers, then the
    /// final history flush and alert drain.
    pub async fn stop(self) -> ShutdownReport {
        let Self {
            cancel,
            scheduler,
            workers,
            processor,
            batcher,
            batcher_task,
            dispatcher,
            alert_timeout,
            orphans_closed,
        } = self;

        cancel.cancel();

        join("scheduler", scheduler).await;
        for worker in workers {
            join("worker", worker).await;
        }
        let results_applied = join("processor", processor).await.unwrap_or(0);
        join("history batcher", batcher_task).await;

        let history_flushed = batcher.flush().await;
        let alerts_delivered = dispatcher.shutdown(alert_timeout).await;

        let report = ShutdownReport {
            orphans_closed,
            results_applied,
            history_flushed,
            alerts_delivered,
        };
        info!(?report, "poll engine stopped");
        report
    }
}

async fn join<T>(name: &'static str, handle: JoinHandle<T>) -> Option<T> {
    match handle.await {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(task = name, error = %err, "engine task failed");
            None
        }
    }
}
