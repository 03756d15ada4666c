// src/main.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use stream_monitor::{
    config,
    metrics::MetricsRegistry,
    monitor::{EnablementGate, HttpProber, MonitorHandle, StreamMonitor},
    notify::{self, AlertDispatcher},
    server::{OpsHandler, ServerBuilder},
    settings::{self, FileSettingsStore, SettingsStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stream_monitor=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path)?;

    // Initialize metrics
    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let metrics = metrics_registry.collector();

    // Seed the gate from the persisted flag
    let store = FileSettingsStore::new(&config.settings.path);
    let gate = Arc::new(EnablementGate::new());
    gate.initialize(settings::load_initial_flag(&store).await);

    // Alert sink and its dispatch worker
    let notifier = notify::build_notifier(&config.notifier, &config.stream.camera_name)
        .context("Failed to build notifier")?;
    let (dispatcher, dispatch_worker) = AlertDispatcher::spawn(
        notifier,
        config.notifier.queue_capacity,
        config.notifier.timeout(),
        Some(metrics.clone()),
    );

    // Start the poll loop
    let prober = Arc::new(
        HttpProber::new(config.stream.timeout()).context("Failed to create HTTP client")?,
    );
    let monitor = Arc::new(
        StreamMonitor::new(
            config.stream.url.clone(),
            config.stream.interval(),
            prober,
            gate,
            dispatcher,
        )
        .with_metrics(metrics),
    );
    let handle = monitor.handle();
    let poll_task = monitor.clone().start();

    // Start ops server if enabled
    if config.metrics.enabled {
        let ops = OpsHandler::new(handle.clone(), metrics_registry, &config.metrics.path);
        let builder = ServerBuilder::new(config.metrics.bind).with_handler(ops);
        tokio::spawn(async move {
            if let Err(e) = builder.serve().await {
                error!("Ops server error: {:#}", e);
            }
        });
    }

    run_until_shutdown(&handle, &store).await;

    // Stop polling, then let queued alerts drain
    monitor.shutdown();
    if let Err(e) = poll_task.await {
        error!("Poll task join error: {}", e);
    }
    drop(monitor);
    if let Err(e) = dispatch_worker.await {
        error!("Alert worker join error: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM. SIGHUP re-reads the persisted flag so the
/// backend that owns the setting can toggle monitoring without a restart.
async fn run_until_shutdown(handle: &MonitorHandle, store: &FileSettingsStore) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(ctrl_c);

    #[cfg(unix)]
    {
        use signal::unix::{signal as unix_signal, SignalKind};

        let (mut terminate, mut hangup) =
            match (unix_signal(SignalKind::terminate()), unix_signal(SignalKind::hangup())) {
                (Ok(terminate), Ok(hangup)) => (terminate, hangup),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("Failed to install signal handlers: {}", e);
                    ctrl_c.await;
                    info!("Shutdown signal received");
                    return;
                }
            };

        loop {
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = terminate.recv() => break,
                _ = hangup.recv() => reload_enabled_flag(handle, store).await,
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (handle, store);
        ctrl_c.await;
    }

    info!("Shutdown signal received");
}

async fn reload_enabled_flag(handle: &MonitorHandle, store: &FileSettingsStore) {
    match store.load_stream_enabled().await {
        Ok(enabled) => {
            info!(enabled, path = %store.path().display(), "Reloaded stream setting");
            handle.set_enabled(enabled);
        }
        Err(e) => warn!(
            error = %e,
            path = %store.path().display(),
            "Failed to reload stream setting, keeping current state"
        ),
    }
}
