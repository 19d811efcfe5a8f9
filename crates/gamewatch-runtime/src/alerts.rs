use anyhow::Result;
use gamewatch_types::{Alert, AlertPolicy, ServerId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delivers transition alerts. Called on a blocking thread, one alert at a time.
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, alert: &Alert) -> Result<()>;
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn notify(&self, alert: &Alert) -> Result<()> {
        if alert.is_offline() {
            warn!(server_id = %alert.server_id(), "{}", alert.describe());
        } else {
            info!(server_id = %alert.server_id(), "{}", alert.describe());
        }
        Ok(())
    }
}

/// Applies per-server `AlertPolicy` before delegating.
pub struct PolicyNotifier {
    inner: Arc<dyn AlertNotifier>,
    policies: HashMap<ServerId, AlertPolicy>,
    fallback: AlertPolicy,
}

impl PolicyNotifier {
    pub fn new(inner: Arc<dyn AlertNotifier>, policies: HashMap<ServerId, AlertPolicy>) -> Self {
        Self {
            inner,
            policies,
            fallback: AlertPolicy::default(),
        }
    }

    fn policy(&self, server_id: ServerId) -> AlertPolicy {
        self.policies.get(&server_id).copied().unwrap_or(self.fallback)
    }
}

impl AlertNotifier for PolicyNotifier {
    fn notify(&self, alert: &Alert) -> Result<()> {
        if !self.policy(alert.server_id()).allows(alert) {
            debug!(server_id = %alert.server_id(), "alert suppressed by policy");
            return Ok(());
        }
        self.inner.notify(alert)
    }
}

/// Cloneable handle for queueing alerts without waiting.
#[derive(Debug, Clone)]
pub struct AlertSender {
    tx: mpsc::Sender<Alert>,
}

impl AlertSender {
    /// Queue `alert`. A full queue drops it with a warning.
    pub fn send(&self, alert: Alert) {
        if let Err(err) = self.tx.try_send(alert) {
            warn!(error = %err, "alert queue full or closed, dropping alert");
        }
    }
}

/// Bounded alert queue with a single delivery task.
pub struct AlertDispatcher {
    sender: AlertSender,
    task: JoinHandle<usize>,
}

impl AlertDispatcher {
    pub fn spawn(notifier: Arc<dyn AlertNotifier>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Alert>(capacity.max(1));

        let task = tokio::spawn(async move {
            let mut delivered = 0;
            while let Some(alert) = rx.recv().await {
                let notifier = notifier.clone();
                let outcome = tokio::task::spawn_blocking(move || notifier.notify(&alert)).await;
                match outcome {
                    Ok(Ok(())) => delivered += 1,
                    Ok(Err(err)) => warn!(error = %err, "alert delivery failed"),
                    Err(err) => warn!(error = %err, "alert notifier panicked"),
                }
            }
            delivered
        });

        Self {
            sender: AlertSender { tx },
            task,
        }
    }

    pub fn sender(&self) -> AlertSender {
        self.sender.clone()
    }

    /// Close the queue and wait up to `timeout` for queued alerts to be
    /// delivered. Returns the number delivered over the dispatcher's life, or
    /// `None` when the deadline passed and the rest were abandoned.
    ///
    /// Every `AlertSender` clone must be dropped first or the queue never closes.
    pub async fn shutdown(self, timeout: Duration) -> Option<usize> {
        let Self { sender, mut task } = self;
        drop(sender);

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(delivered)) => Some(delivered),
            Ok(Err(err)) => {
                warn!(error = %err, "alert dispatcher task failed");
                None
            }
            Err(_) => {
                warn!(?timeout, "alert queue did not drain in time");
                task.abort();
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Notifier that remembers every alert it receives.
    #[derive(Default)]
    pub struct RecordingNotifier {
        alerts: Mutex<Vec<Alert>>,
    }

    impl RecordingNotifier {
        pub fn alerts(&self) -> Vec<Alert> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl AlertNotifier for RecordingNotifier {
        fn notify(&self, alert: &Alert) -> Result<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingNotifier;
    use super::*;
    use chrono::Utc;

    fn offline(id: u64) -> Alert {
        Alert::Offline {
            server_id: ServerId::new(id),
            at: Utc::now(),
        }
    }

    fn online(id: u64) -> Alert {
        Alert::Online {
            server_id: ServerId::new(id),
            at: Utc::now(),
            downtime: None,
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let recorder = Arc::new(RecordingNotifier::default());
        let dispatcher = AlertDispatcher::spawn(recorder.clone(), 16);

        let sender = dispatcher.sender();
        for id in 0..5 {
            sender.send(offline(id));
        }
        drop(sender);

        assert_eq!(dispatcher.shutdown(Duration::from_secs(5)).await, Some(5));
        assert_eq!(recorder.alerts().len(), 5);
    }

    #[tokio::test]
    async fn test_shutdown_gives_up_after_timeout() {
        struct Stuck;
        impl AlertNotifier for Stuck {
            fn notify(&self, _alert: &Alert) -> Result<()> {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            }
        }

        let dispatcher = AlertDispatcher::spawn(Arc::new(Stuck), 4);
        dispatcher.sender().send(offline(1));
        dispatcher.sender().send(offline(2));

        assert_eq!(dispatcher.shutdown(Duration::from_millis(50)).await, None);
    }

    #[test]
    fn test_policy_notifier_filters() -> Result<()> {
        let recorder = Arc::new(RecordingNotifier::default());
        let mut policies = HashMap::new();
        policies.insert(
            ServerId::new(1),
            AlertPolicy {
                enabled: true,
                notify_online: true,
            },
        );
        policies.insert(
            ServerId::new(2),
            AlertPolicy {
                enabled: false,
                notify_online: true,
            },
        );
        let notifier = PolicyNotifier::new(recorder.clone(), policies);

        notifier.notify(&offline(1))?;
        notifier.notify(&online(1))?;
        notifier.notify(&offline(2))?;
        // No policy: defaults allow offline only
        notifier.notify(&offline(3))?;
        notifier.notify(&online(3))?;

        let ids: Vec<u64> = recorder.alerts().iter().map(|a| a.server_id().get()).collect();
        assert_eq!(ids, vec![1, 1, 3]);
        Ok(())
    }
}
