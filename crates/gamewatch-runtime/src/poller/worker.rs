use chrono::Utc;
use gamewatch_types::StatusSnapshot;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Job, ProbeResult};
use crate::prober::Prober;

/// Probe one server. Never fails: any status error yields an offline snapshot.
///
/// The roster is only fetched when the status reports players. An online
/// server with nobody on it gets an empty roster so open sessions close; a
/// failed roster probe gives `None` and leaves sessions untouched.
pub async fn execute_job(prober: &dyn Prober, job: Job) -> ProbeResult {
    let server = &job.server;

    let (snapshot, roster) = match prober.status(server).await {
        Ok(report) => {
            let snapshot = report.into_snapshot(server.id, Utc::now());
            let roster = if snapshot.players_now > 0 {
                match prober.roster(server).await {
                    Ok(names) => Some(names),
                    Err(err) => {
                        debug!(server_id = %server.id, error = %err, "roster probe failed");
                        None
                    }
                }
            } else {
                Some(Vec::new())
            };
            (snapshot, roster)
        }
        Err(err) => {
            debug!(server_id = %server.id, address = %server.address(), error = %err, "probe failed, marking offline");
            (StatusSnapshot::offline(server.id, Utc::now()), None)
        }
    };

    ProbeResult {
        server_id: server.id,
        seq: job.seq,
        snapshot,
        roster,
    }
}

/// One member of the pool: pull a job, probe, forward the result.
///
/// Exits on cancellation or when the job queue closes. An in-flight probe is
/// finished before the cancel is noticed; probes are bounded by their timeout.
pub(crate) async fn run_worker(
    index: usize,
    prober: Arc<dyn Prober>,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<ProbeResult>,
    cancel: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = async { jobs.lock().await.recv().await } => job,
        };
        let Some(job) = job else { break };

        let result = execute_job(prober.as_ref(), job).await;
        if results.send(result).await.is_err() {
            break;
        }
    }
    debug!(worker = index, "worker stopped");
}
