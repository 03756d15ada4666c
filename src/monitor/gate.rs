// src/monitor/gate.rs
use std::sync::atomic::{AtomicBool, Ordering};

/// Runtime on/off switch for polling.
///
/// The poll loop reads the flag once per tick, so a change is honoured on
/// the next tick and never interrupts a check already in flight.
#[derive(Debug, Default)]
pub struct EnablementGate {
    enabled: AtomicBool,
}

impl EnablementGate {
    /// A gate that starts disabled until [`initialize`](Self::initialize) seeds it.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
        }
    }

    /// Seed the flag from persisted configuration at startup.
    pub fn initialize(&self, seed: bool) {
        self.enabled.store(seed, Ordering::SeqCst);
        tracing::info!(enabled = seed, "Stream monitoring gate initialized");
    }

    pub fn set_enabled(&self, value: bool) {
        let previous = self.enabled.swap(value, Ordering::SeqCst);
        if previous != value {
            tracing::info!(enabled = value, "Stream monitoring toggled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}
