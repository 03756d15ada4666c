// src/notify/mod.rs
mod dispatcher;
mod sink;

pub use dispatcher::{Alert, AlertDispatcher, DispatchSnapshot, DispatchStats};
pub use sink::{
    DisabledNotifier, EventNotifier, Notifier, NotifyError, PushNotifier, STREAM_STATUS_EVENT,
};

use crate::config::{NotifierConfig, NotifierKind};
use std::sync::Arc;

/// Build the configured notification sink.
///
/// Expects a validated config: a push or event kind always carries a URL and token.
pub fn build_notifier(
    config: &NotifierConfig,
    camera_name: &str,
) -> Result<Arc<dyn Notifier>, NotifyError> {
    let notifier: Arc<dyn Notifier> = match (config.kind, &config.url, &config.token) {
        (NotifierKind::Push, Some(url), Some(token)) => Arc::new(PushNotifier::new(
            url.clone(),
            token.clone(),
            config,
            camera_name,
        )?),
        (NotifierKind::Event, Some(url), Some(token)) => {
            Arc::new(EventNotifier::new(url, token.clone(), config, camera_name)?)
        }
        (kind, _, _) => {
            if kind != NotifierKind::Disabled {
                tracing::warn!(?kind, "Notifier url or token missing, alerts will only be logged");
            }
            Arc::new(DisabledNotifier)
        }
    };

    tracing::info!(sink = notifier.name(), "Notification sink configured");
    Ok(notifier)
}
