use gamewatch_types::{ServerId, StatusSnapshot};
use tokio::sync::broadcast;

/// One processed probe, as published to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub server_id: ServerId,
    pub snapshot: StatusSnapshot,
}

/// Receiver of live status updates. Must not block the caller.
pub trait StatusSink: Send + Sync {
    fn publish(&self, update: StatusUpdate);
}

/// Fan-out of status updates to any number of subscribers.
///
/// Slow subscribers lag and lose the oldest updates instead of stalling the
/// processor.
#[derive(Debug, Clone)]
pub struct StatusHub {
    tx: broadcast::Sender<StatusUpdate>,
}

impl StatusHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl StatusSink for StatusHub {
    fn publish(&self, update: StatusUpdate) {
        // No subscribers is not an error
        let _ = self.tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn update(id: u64) -> StatusUpdate {
        let server_id = ServerId::new(id);
        StatusUpdate {
            server_id,
            snapshot: StatusSnapshot::offline(server_id, Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_updates() {
        let hub = StatusHub::new(8);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(update(1));

        assert_eq!(a.recv().await.unwrap().server_id, ServerId::new(1));
        assert_eq!(b.recv().await.unwrap().server_id, ServerId::new(1));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        StatusHub::new(1).publish(update(1));
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_instead_of_blocking() {
        let hub = StatusHub::new(2);
        let mut rx = hub.subscribe();
        for id in 0..5 {
            hub.publish(update(id));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().server_id, ServerId::new(3));
    }
}
