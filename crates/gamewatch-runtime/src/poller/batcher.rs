use gamewatch_types::HistoryPoint;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::store_call;
use crate::storage::PollStore;

/// History points waiting to be written. Shared by the processor (push) and
/// the batcher (take).
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    points: Arc<Mutex<Vec<HistoryPoint>>>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, point: HistoryPoint) {
        if let Ok(mut points) = self.points.lock() {
            points.push(point);
        }
    }

    /// Swap the buffer out, leaving it empty.
    pub fn take(&self) -> Vec<HistoryPoint> {
        self.points
            .lock()
            .map(|mut points| std::mem::take(&mut *points))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.points.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writes buffered history on a timer, in chunks.
///
/// A failed chunk is logged and dropped, never re-buffered.
#[derive(Clone)]
pub struct HistoryBatcher {
    buffer: HistoryBuffer,
    store: Arc<dyn PollStore>,
    interval: Duration,
    chunk_size: usize,
}

impl HistoryBatcher {
    pub fn new(
        buffer: HistoryBuffer,
        store: Arc<dyn PollStore>,
        interval: Duration,
        chunk_size: usize,
    ) -> Self {
        Self {
            buffer,
            store,
            interval,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Write everything buffered now. Returns the number of points persisted.
    pub async fn flush(&self) -> usize {
        let points = self.buffer.take();
        if points.is_empty() {
            return 0;
        }

        let mut written = 0;
        let total = points.len();
        for chunk in points.chunks(self.chunk_size) {
            let chunk = chunk.to_vec();
            let len = chunk.len();
            match store_call(&self.store, "insert history", move |store| store.insert_history(&chunk)).await {
                Some(n) => written += n,
                None => warn!(dropped = len, "history chunk not persisted"),
            }
        }
        debug!(written, total, "history flushed");
        written
    }

    /// Flush every `interval` until `cancel` fires. The final flush belongs to
    /// the lifecycle manager, after the processor has drained.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.flush().await;
                }
            }
        }
        debug!("history batcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use gamewatch_types::ServerId;

    fn point(id: u64, players: u32) -> HistoryPoint {
        HistoryPoint {
            server_id: ServerId::new(id),
            players,
            online: true,
            ping_ms: 10,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_flush_writes_in_chunks_and_empties_buffer() {
        let store = Arc::new(MemoryStore::new());
        let buffer = HistoryBuffer::new();
        for i in 0..7 {
            buffer.push(point(1, i));
        }
        let batcher = HistoryBatcher::new(buffer.clone(), store.clone(), Duration::from_secs(30), 3);

        assert_eq!(batcher.flush().await, 7);
        assert!(buffer.is_empty());
        assert_eq!(store.history().len(), 7);
        assert_eq!(batcher.flush().await, 0);
    }

    #[tokio::test]
    async fn test_failed_flush_drops_points() {
        let store = Arc::new(MemoryStore::new());
        let buffer = HistoryBuffer::new();
        buffer.push(point(1, 1));
        buffer.push(point(2, 2));
        let batcher = HistoryBatcher::new(buffer.clone(), store.clone(), Duration::from_secs(30), 10);

        store.set_fail_writes(true);
        assert_eq!(batcher.flush().await, 0);
        assert!(buffer.is_empty());

        store.set_fail_writes(false);
        assert_eq!(batcher.flush().await, 0);
        assert!(store.history().is_empty());
    }

    #[tokio::test]
    async fn test_run_flushes_on_interval() {
        let store = Arc::new(MemoryStore::new());
        let buffer = HistoryBuffer::new();
        let batcher = HistoryBatcher::new(buffer.clone(), store.clone(), Duration::from_millis(20), 10);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(batcher.run(cancel.clone()));

        buffer.push(point(1, 4));
        for _ in 0..100 {
            if !store.history().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.history().len(), 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
