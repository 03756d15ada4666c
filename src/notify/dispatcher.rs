// src/notify/dispatcher.rs
use super::sink::{Notifier, NotifyError};
use crate::metrics::MetricsCollector;
use crate::monitor::AlertKind;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Hands alerts to a single background worker through a bounded queue.
///
/// `dispatch` never waits: when the queue is full the alert is dropped and
/// counted. The worker delivers alerts one at a time, logs failures and
/// never retries. It exits once every `AlertDispatcher` clone is dropped
/// and the queue has drained.
#[derive(Clone)]
pub struct AlertDispatcher {
    tx: mpsc::Sender<Alert>,
    stats: Arc<DispatchStats>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl AlertDispatcher {
    pub fn spawn(
        notifier: Arc<dyn Notifier>,
        capacity: usize,
        deliver_timeout: Duration,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let stats = Arc::new(DispatchStats::default());

        let worker = DispatchWorker {
            notifier,
            deliver_timeout,
            stats: stats.clone(),
            metrics: metrics.clone(),
        };
        let handle = tokio::spawn(worker.run(rx));

        (Self { tx, stats, metrics }, handle)
    }

    /// Queue an alert for delivery. Returns `false` if it was dropped.
    pub fn dispatch(&self, kind: AlertKind) -> bool {
        let alert = Alert {
            id: Uuid::new_v4(),
            kind,
            raised_at: Utc::now(),
        };
        let alert_id = alert.id;

        match self.tx.try_send(alert) {
            Ok(()) => {
                debug!(%alert_id, status = kind.status(), "Alert queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%alert_id, status = kind.status(), "Alert queue full, dropping alert");
                self.record_dropped();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(%alert_id, status = kind.status(), "Alert worker has stopped, dropping alert");
                self.record_dropped();
                false
            }
        }
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        self.stats.clone()
    }

    fn record_dropped(&self) {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.record_alert_dropped();
        }
    }
}

struct DispatchWorker {
    notifier: Arc<dyn Notifier>,
    deliver_timeout: Duration,
    stats: Arc<DispatchStats>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl DispatchWorker {
    async fn run(self, mut rx: mpsc::Receiver<Alert>) {
        info!(sink = self.notifier.name(), "Alert dispatcher started");

        while let Some(alert) = rx.recv().await {
            self.deliver(alert).await;
        }

        info!("Alert dispatcher stopped");
    }

    async fn deliver(&self, alert: Alert) {
        // A panicking sink fails this alert only; the worker keeps running.
        let attempt = AssertUnwindSafe(self.notifier.notify(alert.kind)).catch_unwind();
        let result = match timeout(self.deliver_timeout, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(NotifyError::Panicked),
            Err(_) => Err(NotifyError::Timeout(self.deliver_timeout)),
        };

        let delivered = match result {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    alert_id = %alert.id,
                    status = alert.kind.status(),
                    latency_ms = (Utc::now() - alert.raised_at).num_milliseconds(),
                    "Alert delivered"
                );
                true
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    alert_id = %alert.id,
                    status = alert.kind.status(),
                    sink = self.notifier.name(),
                    error = %e,
                    "Failed to deliver alert"
                );
                false
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_alert(alert.kind, delivered);
        }
    }
}
