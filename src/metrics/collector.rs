// src/metrics/collector.rs
use crate::monitor::AlertKind;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        buffer
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub checks_total: IntCounterVec,
    pub check_duration_seconds: Histogram,
    pub stream_live: IntGauge,
    pub stream_enabled: IntGauge,

    // Alert metrics
    pub alerts_total: IntCounterVec,
    pub alerts_dropped_total: IntCounter,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let checks_total = IntCounterVec::new(
            Opts::new("stream_monitor_checks_total", "Total number of stream probes"),
            &["result"],
        )?;
        registry.register(Box::new(checks_total.clone()))?;

        let check_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "stream_monitor_check_duration_seconds",
            "Stream probe duration in seconds",
        ))?;
        registry.register(Box::new(check_duration_seconds.clone()))?;

        let stream_live = IntGauge::new(
            "stream_monitor_live",
            "Most recent stream verdict (1=live, 0=offline)",
        )?;
        registry.register(Box::new(stream_live.clone()))?;

        let stream_enabled = IntGauge::new(
            "stream_monitor_enabled",
            "Whether polling is enabled (1=enabled, 0=disabled)",
        )?;
        registry.register(Box::new(stream_enabled.clone()))?;

        let alerts_total = IntCounterVec::new(
            Opts::new("stream_monitor_alerts_total", "Alerts handed to the notification sink"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(alerts_total.clone()))?;

        let alerts_dropped_total = IntCounter::new(
            "stream_monitor_alerts_dropped_total",
            "Alerts dropped because the dispatch queue was full",
        )?;
        registry.register(Box::new(alerts_dropped_total.clone()))?;

        Ok(Self {
            checks_total,
            check_duration_seconds,
            stream_live,
            stream_enabled,
            alerts_total,
            alerts_dropped_total,
        })
    }

    pub fn record_check(&self, is_live: bool, duration: Duration) {
        let result = if is_live { "live" } else { "offline" };
        self.checks_total.with_label_values(&[result]).inc();
        self.check_duration_seconds.observe(duration.as_secs_f64());
        self.stream_live.set(if is_live { 1 } else { 0 });
    }

    pub fn update_enabled(&self, enabled: bool) {
        self.stream_enabled.set(if enabled { 1 } else { 0 });
    }

    pub fn record_alert(&self, kind: AlertKind, delivered: bool) {
        let outcome = if delivered { "delivered" } else { "failed" };
        self.alerts_total
            .with_label_values(&[kind.status(), outcome])
            .inc();
    }

    pub fn record_alert_dropped(&self) {
        self.alerts_dropped_total.inc();
    }
}
