// src/monitor/handle.rs
use super::gate::EnablementGate;
use super::state::{LivenessState, StreamStatus};
use crate::settings::{SettingsError, SettingsStore};
use std::sync::Arc;

/// Cheap, cloneable view of a running monitor for status queries and the
/// administrative on/off command.
#[derive(Clone)]
pub struct MonitorHandle {
    state: Arc<LivenessState>,
    gate: Arc<EnablementGate>,
}

impl MonitorHandle {
    pub(crate) fn new(state: Arc<LivenessState>, gate: Arc<EnablementGate>) -> Self {
        Self { state, gate }
    }

    /// Current verdict. While disabled this keeps reporting the last
    /// observed value.
    pub async fn get_status(&self) -> StreamStatus {
        self.state.snapshot().await
    }

    /// Takes effect on the next tick.
    pub fn set_enabled(&self, value: bool) {
        self.gate.set_enabled(value);
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    /// Persist the flag, then flip the gate. If persisting fails the gate
    /// is left as it was.
    pub async fn update_enabled(
        &self,
        store: &dyn SettingsStore,
        value: bool,
    ) -> Result<(), SettingsError> {
        store.save_stream_enabled(value).await?;
        self.set_enabled(value);
        Ok(())
    }
}
