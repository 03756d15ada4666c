// src/monitor/poller.rs
use super::gate::EnablementGate;
use super::handle::MonitorHandle;
use super::prober::Prober;
use super::state::LivenessState;
use super::transition::{AlertKind, TransitionNotifier};
use crate::metrics::MetricsCollector;
use crate::notify::AlertDispatcher;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use url::Url;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The gate was closed; nothing was probed or recorded.
    Disabled,
    Checked {
        is_live: bool,
        alert: Option<AlertKind>,
    },
}

/// Background driver that probes the stream on a fixed cadence.
///
/// The only writer of [`LivenessState`]. Ticks that fall due while a check is
/// still running are skipped, so at most one check is ever in flight.
pub struct StreamMonitor {
    url: Url,
    interval: Duration,
    prober: Arc<dyn Prober>,
    state: Arc<LivenessState>,
    gate: Arc<EnablementGate>,
    transitions: TransitionNotifier,
    metrics: Option<Arc<MetricsCollector>>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl StreamMonitor {
    pub fn new(
        url: Url,
        interval: Duration,
        prober: Arc<dyn Prober>,
        gate: Arc<EnablementGate>,
        dispatcher: AlertDispatcher,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        Self {
            url,
            interval,
            prober,
            state: Arc::new(LivenessState::new()),
            gate,
            transitions: TransitionNotifier::new(dispatcher),
            metrics: None,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Query/command surface for collaborators.
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle::new(self.state.clone(), self.gate.clone())
    }

    /// Spawn the poll loop onto the runtime.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!(
            url = %self.url,
            interval = ?self.interval,
            prober = self.prober.name(),
            "Starting stream monitor"
        );

        loop {
            tokio::select! {
                // The first tick completes immediately.
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Stream monitor shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// One poll cycle: gate → probe → record → evaluate/dispatch.
    pub async fn tick(&self) -> TickOutcome {
        let enabled = self.gate.is_enabled();
        if let Some(metrics) = &self.metrics {
            metrics.update_enabled(enabled);
        }

        if !enabled {
            debug!("Stream monitoring disabled, skipping check");
            return TickOutcome::Disabled;
        }

        // No lock is held while the probe is outstanding.
        let start = Instant::now();
        let is_live = self.prober.check(&self.url).await;
        let elapsed = start.elapsed();

        let recorded = self.state.record(is_live).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_check(is_live, elapsed);
        }

        let alert = self.transitions.observe(&recorded, is_live);

        debug!(
            is_live,
            previous = recorded.previous,
            first_check = !recorded.had_prior_check,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stream check complete"
        );

        TickOutcome::Checked { is_live, alert }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notifier, NotifyError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedProber {
        results: Mutex<VecDeque<bool>>,
        calls: AtomicUsize,
    }

    impl ScriptedProber {
        fn new(results: &[bool]) -> Self {
            Self {
                results: Mutex::new(results.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn check(&self, _url: &Url) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.lock().unwrap().pop_front().unwrap_or(false)
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn notify(&self, _kind: AlertKind) -> Result<(), NotifyError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "null"
        }
    }

    fn monitor(prober: Arc<ScriptedProber>, enabled: bool) -> StreamMonitor {
        let gate = Arc::new(EnablementGate::new());
        gate.initialize(enabled);
        let (dispatcher, _worker) =
            AlertDispatcher::spawn(Arc::new(NullNotifier), 8, Duration::from_secs(1), None);

        StreamMonitor::new(
            Url::parse("http://camera.local/live").unwrap(),
            Duration::from_secs(10),
            prober,
            gate,
            dispatcher,
        )
    }

    #[tokio::test]
    async fn test_disabled_tick_does_not_probe() {
        let prober = Arc::new(ScriptedProber::new(&[true]));
        let monitor = monitor(prober.clone(), false);

        assert_eq!(monitor.tick().await, TickOutcome::Disabled);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);

        let status = monitor.handle().get_status().await;
        assert!(status.last_checked.is_none());
    }

    #[tokio::test]
    async fn test_tick_records_probe_result() {
        let prober = Arc::new(ScriptedProber::new(&[true]));
        let monitor = monitor(prober, true);

        assert_eq!(
            monitor.tick().await,
            TickOutcome::Checked {
                is_live: true,
                alert: None
            }
        );

        let status = monitor.handle().get_status().await;
        assert!(status.is_live);
        assert!(status.last_checked.is_some());
    }

    #[tokio::test]
    async fn test_tick_sequence_alerts_on_edges() {
        let prober = Arc::new(ScriptedProber::new(&[false, true, true, true, true, false]));
        let monitor = monitor(prober, true);

        let mut alerts = Vec::new();
        for _ in 0..6 {
            if let TickOutcome::Checked { alert: Some(kind), .. } = monitor.tick().await {
                alerts.push(kind);
            }
        }

        assert_eq!(
            alerts,
            vec![
                AlertKind::WentOffline,
                AlertKind::BackOnline,
                AlertKind::WentOffline
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_stops_and_resumes_checks() {
        let prober = Arc::new(ScriptedProber::new(&[true, true, true]));
        let monitor = monitor(prober.clone(), true);
        let handle = monitor.handle();

        monitor.tick().await;
        let frozen = handle.get_status().await.last_checked;

        handle.set_enabled(false);
        assert_eq!(monitor.tick().await, TickOutcome::Disabled);
        assert_eq!(monitor.tick().await, TickOutcome::Disabled);
        assert_eq!(handle.get_status().await.last_checked, frozen);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);

        handle.set_enabled(true);
        monitor.tick().await;
        assert_eq!(prober.calls.load(Ordering::SeqCst), 2);
        assert!(handle.get_status().await.last_checked >= frozen);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let prober = Arc::new(ScriptedProber::new(&[true]));
        let monitor = Arc::new(monitor(prober.clone(), true));

        let task = monitor.clone().start();
        monitor.shutdown();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poll loop did not stop")
            .unwrap();
    }
}
