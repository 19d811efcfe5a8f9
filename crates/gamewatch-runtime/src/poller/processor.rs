use chrono::{DateTime, Utc};
use gamewatch_types::ServerId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    HistoryBuffer, ProbeResult, Retired, RosterChange, RosterTracker, TransitionTracker, store_call,
};
use crate::alerts::AlertSender;
use crate::hub::{StatusSink, StatusUpdate};
use crate::storage::PollStore;

/// Single consumer of probe results.
///
/// Owns all per-server in-memory state (last seq, online flag, roster), so
/// none of it needs locking. Results older than the last applied one for the
/// same server are dropped, as are results for a server that left the
/// catalog after their job was enqueued.
pub struct ResultProcessor {
    store: Arc<dyn PollStore>,
    history: HistoryBuffer,
    alerts: Option<AlertSender>,
    sink: Option<Arc<dyn StatusSink>>,
    retirements: Option<mpsc::Receiver<Retired>>,
    transitions: TransitionTracker,
    rosters: RosterTracker,
    last_seq: HashMap<ServerId, u64>,
    retired: HashMap<ServerId, u64>,
}

impl ResultProcessor {
    pub fn new(store: Arc<dyn PollStore>, history: HistoryBuffer) -> Self {
        Self {
            store,
            history,
            alerts: None,
            sink: None,
            retirements: None,
            transitions: TransitionTracker::new(),
            rosters: RosterTracker::new(),
            last_seq: HashMap::new(),
            retired: HashMap::new(),
        }
    }

    pub fn with_alerts(mut self, alerts: AlertSender) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Receive servers dropped from the catalog while running.
    pub fn with_retirements(mut self, retirements: mpsc::Receiver<Retired>) -> Self {
        self.retirements = Some(retirements);
        self
    }

    /// Apply one result. Returns `false` when it was stale and skipped.
    ///
    /// Persistence failures are logged inside `store_call`; the in-memory
    /// state, history buffer and sink are updated regardless.
    pub async fn process(&mut self, result: ProbeResult) -> bool {
        let ProbeResult {
            server_id,
            seq,
            snapshot,
            roster,
        } = result;

        if let Some(&floor) = self.retired.get(&server_id) {
            if seq < floor {
                debug!(%server_id, seq, "dropping result of a removed server");
                return false;
            }
            self.retired.remove(&server_id);
        }
        if let Some(&last) = self.last_seq.get(&server_id)
            && seq <= last
        {
            debug!(%server_id, seq, last, "dropping stale result");
            return false;
        }
        self.last_seq.insert(server_id, seq);

        let at = snapshot.last_update;
        let row = snapshot.clone();
        store_call(&self.store, "upsert status", move |store| store.upsert_status(&row)).await;

        self.history.push(snapshot.history_point(at));

        if let Some(alert) = self.transitions.observe(server_id, snapshot.online, at) {
            if alert.is_offline() {
                info!(%server_id, "server went offline");
            } else {
                info!(%server_id, "server came back online");
            }
            if let Some(alerts) = &self.alerts {
                alerts.send(alert);
            }
        }

        if !snapshot.online {
            self.end_all_sessions(server_id, at).await;
        } else if let Some(names) = roster {
            self.apply_roster(server_id, &names, at).await;
        }

        if let Some(sink) = &self.sink {
            sink.publish(StatusUpdate { server_id, snapshot });
        }
        true
    }

    async fn end_all_sessions(&mut self, server_id: ServerId, at: DateTime<Utc>) {
        let previous = self.rosters.clear(server_id);
        let closed = store_call(&self.store, "close server sessions", move |store| {
            store.close_server_sessions(server_id, at)
        })
        .await;
        if let Some(closed) = closed
            && closed > 0
        {
            debug!(%server_id, closed, roster = previous.len(), "closed sessions of offline server");
        }
    }

    /// Open and close sessions one write at a time. Failed writes are logged
    /// and reverted in the roster so the next probe retries them.
    async fn apply_roster(&mut self, server_id: ServerId, names: &[String], at: DateTime<Utc>) {
        let change = self.rosters.update(server_id, names);
        if change.is_empty() {
            return;
        }
        debug!(%server_id, joined = ?change.joined, left = ?change.left, "roster changed");

        let attempted = change.clone();
        let failed = store_call(&self.store, "update sessions", move |store| {
            let mut failed = RosterChange::default();
            for player in change.joined {
                if let Err(err) = store.open_session(server_id, &player, at) {
                    warn!(
                        %server_id,
                        %player,
                        error = %format!("{:#}", err),
                        "failed to open session"
                    );
                    failed.joined.push(player);
                }
            }
            for player in change.left {
                if let Err(err) = store.close_session(server_id, &player, at) {
                    warn!(
                        %server_id,
                        %player,
                        error = %format!("{:#}", err),
                        "failed to close session"
                    );
                    failed.left.push(player);
                }
            }
            Ok(failed)
        })
        .await
        .unwrap_or(attempted);

        self.rosters.revert(server_id, &failed.joined, &failed.left);
    }

    /// Close the sessions of a server that left the catalog and forget it.
    pub async fn retire(&mut self, retired: Retired) {
        let Retired {
            server_id,
            at,
            next_seq,
        } = retired;
        info!(%server_id, "server removed from catalog");

        self.end_all_sessions(server_id, at).await;
        self.transitions.forget(server_id);
        self.last_seq.remove(&server_id);
        self.retired.insert(server_id, next_seq);
    }

    /// Process until every result sender is gone. Returns how many results
    /// were applied.
    pub async fn run(mut self, mut results: mpsc::Receiver<ProbeResult>) -> usize {
        let mut retirements = self.retirements.take();
        let mut applied = 0;

        loop {
            tokio::select! {
                biased;
                retired = recv_retired(&mut retirements) => match retired {
                    Some(retired) => self.retire(retired).await,
                    None => retirements = None,
                },
                result = results.recv() => match result {
                    Some(result) => {
                        if self.process(result).await {
                            applied += 1;
                        }
                    }
                    None => break,
                },
            }
        }

        if let Some(mut retirements) = retirements {
            while let Ok(retired) = retirements.try_recv() {
                self.retire(retired).await;
            }
        }
        debug!(applied, "result processor drained");
        applied
    }
}

/// Next retirement, or pending forever once there is no channel.
async fn recv_retired(retirements: &mut Option<mpsc::Receiver<Retired>>) -> Option<Retired> {
    match retirements {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertDispatcher;
    use crate::alerts::recording::RecordingNotifier;
    use crate::hub::StatusHub;
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use gamewatch_types::{Alert, StatusSnapshot};
    use std::time::Duration as StdDuration;

    fn online(id: u64, players: u32, at: DateTime<Utc>) -> StatusSnapshot {
        StatusSnapshot {
            online: true,
            players_now: players,
            players_max: 20,
            map: "world".to_string(),
            server_name: "A Minecraft Server".to_string(),
            ping_ms: 12,
            ..StatusSnapshot::offline(ServerId::new(id), at)
        }
    }

    fn result(seq: u64, snapshot: StatusSnapshot, roster: Option<&[&str]>) -> ProbeResult {
        ProbeResult {
            server_id: snapshot.server_id,
            seq,
            snapshot,
            roster: roster.map(|names| names.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[tokio::test]
    async fn test_online_roster_opens_sessions_and_publishes() {
        let store = Arc::new(MemoryStore::new());
        let hub = StatusHub::new(8);
        let mut updates = hub.subscribe();
        let buffer = HistoryBuffer::new();
        let mut processor =
            ResultProcessor::new(store.clone(), buffer.clone()).with_sink(Arc::new(hub.clone()));
        let id = ServerId::new(1);
        let t0 = Utc::now();

        processor
            .process(result(0, online(1, 2, t0), Some(&["Alice", "Bob"])))
            .await;

        let status = store.status(id).unwrap();
        assert!(status.online);
        assert_eq!(status.players_now, 2);
        assert_eq!(status.map, "world");
        assert_eq!(store.open_players(id), vec!["Alice", "Bob"]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(updates.recv().await.unwrap().snapshot.players_now, 2);

        processor
            .process(result(1, online(1, 1, t0 + Duration::seconds(10)), Some(&["Bob"])))
            .await;
        assert_eq!(store.open_players(id), vec!["Bob"]);
        let alice = store
            .sessions()
            .into_iter()
            .find(|s| s.player_name == "Alice")
            .unwrap();
        assert_eq!(alice.duration_secs, 10);
    }

    #[tokio::test]
    async fn test_offline_flip_alerts_once_and_closes_sessions() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(RecordingNotifier::default());
        let dispatcher = AlertDispatcher::spawn(recorder.clone(), 16);
        let mut processor =
            ResultProcessor::new(store.clone(), HistoryBuffer::new()).with_alerts(dispatcher.sender());
        let id = ServerId::new(4);
        let t0 = Utc::now();

        processor
            .process(result(0, online(4, 1, t0), Some(&["Alice"])))
            .await;
        processor
            .process(result(1, StatusSnapshot::offline(id, t0 + Duration::seconds(30)), None))
            .await;
        processor
            .process(result(2, StatusSnapshot::offline(id, t0 + Duration::seconds(90)), None))
            .await;

        assert!(store.open_players(id).is_empty());
        let status = store.status(id).unwrap();
        assert!(!status.online);
        assert_eq!(status.players_now, 0);

        drop(processor);
        assert_eq!(dispatcher.shutdown(StdDuration::from_secs(5)).await, Some(1));
        let alerts = recorder.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0], Alert::Offline { .. }));
    }

    #[tokio::test]
    async fn test_roster_failure_keeps_sessions() {
        let store = Arc::new(MemoryStore::new());
        let mut processor = ResultProcessor::new(store.clone(), HistoryBuffer::new());
        let id = ServerId::new(2);
        let t0 = Utc::now();

        processor
            .process(result(0, online(2, 2, t0), Some(&["Alice", "Bob"])))
            .await;
        processor
            .process(result(1, online(2, 2, t0 + Duration::seconds(10)), None))
            .await;
        assert_eq!(store.open_players(id), vec!["Alice", "Bob"]);

        // Online and empty closes everyone
        processor
            .process(result(2, online(2, 0, t0 + Duration::seconds(20)), Some(&[])))
            .await;
        assert!(store.open_players(id).is_empty());
    }

    #[tokio::test]
    async fn test_one_failed_session_write_does_not_block_the_rest() {
        let store = Arc::new(MemoryStore::new());
        let mut processor = ResultProcessor::new(store.clone(), HistoryBuffer::new());
        let id = ServerId::new(5);
        let t0 = Utc::now();

        processor
            .process(result(0, online(5, 1, t0), Some(&["Alice"])))
            .await;
        store.set_failing_player(Some("Carol"));
        processor
            .process(result(1, online(5, 1, t0 + Duration::seconds(10)), Some(&["Carol"])))
            .await;

        // Alice left even though Carol's session could not be written
        assert!(store.open_players(id).is_empty());

        store.set_failing_player(None);
        processor
            .process(result(2, online(5, 1, t0 + Duration::seconds(20)), Some(&["Carol"])))
            .await;
        assert_eq!(store.open_players(id), vec!["Carol"]);
    }

    #[tokio::test]
    async fn test_removed_server_sessions_close_and_late_results_are_dropped() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(RecordingNotifier::default());
        let dispatcher = AlertDispatcher::spawn(recorder.clone(), 16);
        let mut processor =
            ResultProcessor::new(store.clone(), HistoryBuffer::new()).with_alerts(dispatcher.sender());
        let id = ServerId::new(6);
        let t0 = Utc::now();

        processor
            .process(result(0, online(6, 2, t0), Some(&["Alice", "Bob"])))
            .await;
        processor
            .retire(Retired {
                server_id: id,
                at: t0 + Duration::seconds(15),
                next_seq: 4,
            })
            .await;
        assert!(store.open_players(id).is_empty());
        assert!(store.sessions().iter().all(|s| s.duration_secs == 15));

        // A job enqueued before the removal finishes late
        assert!(
            !processor
                .process(result(3, online(6, 2, t0 + Duration::seconds(20)), Some(&["Alice"])))
                .await
        );
        assert!(store.open_players(id).is_empty());

        // Added back: tracked again from a fresh baseline, without an online alert
        assert!(
            processor
                .process(result(4, online(6, 1, t0 + Duration::seconds(30)), Some(&["Alice"])))
                .await
        );
        assert_eq!(store.open_players(id), vec!["Alice"]);

        drop(processor);
        assert_eq!(dispatcher.shutdown(StdDuration::from_secs(5)).await, Some(0));
        assert!(recorder.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_run_applies_retirements() {
        let store = Arc::new(MemoryStore::new());
        let (retire_tx, retire_rx) = mpsc::channel(4);
        let processor =
            ResultProcessor::new(store.clone(), HistoryBuffer::new()).with_retirements(retire_rx);
        let (tx, rx) = mpsc::channel(8);
        let id = ServerId::new(8);
        let t0 = Utc::now();

        tx.send(result(0, online(8, 1, t0), Some(&["Alice"]))).await.unwrap();
        let handle = tokio::spawn(processor.run(rx));

        for _ in 0..200 {
            if !store.open_players(id).is_empty() {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        retire_tx
            .send(Retired {
                server_id: id,
                at: t0 + Duration::seconds(5),
                next_seq: 1,
            })
            .await
            .unwrap();
        drop(retire_tx);
        drop(tx);

        assert_eq!(handle.await.unwrap(), 1);
        assert!(store.open_players(id).is_empty());
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let buffer = HistoryBuffer::new();
        let mut processor = ResultProcessor::new(store.clone(), buffer.clone());
        let id = ServerId::new(3);
        let t0 = Utc::now();

        assert!(processor.process(result(5, online(3, 7, t0), Some(&[]))).await);
        assert!(
            !processor
                .process(result(4, StatusSnapshot::offline(id, t0 - Duration::seconds(5)), None))
                .await
        );

        assert!(store.status(id).unwrap().online);
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_processing() {
        let store = Arc::new(MemoryStore::new());
        let hub = StatusHub::new(8);
        let mut updates = hub.subscribe();
        let buffer = HistoryBuffer::new();
        let mut processor =
            ResultProcessor::new(store.clone(), buffer.clone()).with_sink(Arc::new(hub.clone()));

        store.set_fail_writes(true);
        assert!(
            processor
                .process(result(0, online(1, 1, Utc::now()), Some(&["Alice"])))
                .await
        );

        assert!(store.status(ServerId::new(1)).is_none());
        assert_eq!(buffer.len(), 1);
        assert!(updates.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_run_drains_until_senders_drop() {
        let store = Arc::new(MemoryStore::new());
        let processor = ResultProcessor::new(store.clone(), HistoryBuffer::new());
        let (tx, rx) = mpsc::channel(8);
        let t0 = Utc::now();

        for id in 1..=3 {
            tx.send(result(id, online(id, 0, t0), Some(&[]))).await.unwrap();
        }
        drop(tx);

        assert_eq!(processor.run(rx).await, 3);
        assert_eq!(store.statuses().unwrap().len(), 3);
    }
}
