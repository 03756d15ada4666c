// src/monitor/transition.rs
use crate::monitor::state::Recorded;
use crate::notify::AlertDispatcher;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    WentOffline,
    BackOnline,
}

impl AlertKind {
    /// Short status tag used in event payloads and metric labels.
    pub fn status(&self) -> &'static str {
        match self {
            AlertKind::WentOffline => "offline",
            AlertKind::BackOnline => "online",
        }
    }

    pub fn message(&self, camera_name: &str) -> String {
        match self {
            AlertKind::WentOffline => format!("{} stream went offline", camera_name),
            AlertKind::BackOnline => format!("{} stream is back online", camera_name),
        }
    }
}

/// Decide whether a new verdict warrants an alert.
///
/// Before the first completed check the previous verdict is taken to be
/// `true`: a stream that is down at startup still raises `WentOffline`,
/// while one that is already up stays quiet instead of announcing
/// `BackOnline`.
pub fn evaluate(previous: bool, current: bool, had_prior_check: bool) -> Option<AlertKind> {
    let previous = if had_prior_check { previous } else { true };

    match (previous, current) {
        (true, false) => Some(AlertKind::WentOffline),
        (false, true) => Some(AlertKind::BackOnline),
        _ => None,
    }
}

/// Turns verdict changes into alerts handed off to the dispatch worker.
pub struct TransitionNotifier {
    dispatcher: AlertDispatcher,
}

impl TransitionNotifier {
    pub fn new(dispatcher: AlertDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Evaluate a freshly recorded verdict and dispatch any resulting alert.
    ///
    /// Never waits on the notification sink.
    pub fn observe(&self, recorded: &Recorded, current: bool) -> Option<AlertKind> {
        let kind = evaluate(recorded.previous, current, recorded.had_prior_check)?;

        match kind {
            AlertKind::WentOffline => warn!("ALERT: stream went offline"),
            AlertKind::BackOnline => info!("Stream is back online"),
        }

        self.dispatcher.dispatch(kind);
        Some(kind)
    }
}
