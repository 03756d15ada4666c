// src/monitor/mod.rs
//! Stream liveness monitoring.
//!
//! ```text
//! ticker ─▶ EnablementGate ─▶ Prober ─▶ LivenessState::record
//!                                              │
//!                                              ▼
//!                                  TransitionNotifier ─▶ AlertDispatcher (worker)
//! ```
mod gate;
mod handle;
mod poller;
mod prober;
mod state;
mod transition;

pub use gate::EnablementGate;
pub use handle::MonitorHandle;
pub use poller::{StreamMonitor, TickOutcome};
pub use prober::{HttpProber, Prober};
pub use state::{LivenessState, Recorded, StreamStatus};
pub use transition::{evaluate, AlertKind, TransitionNotifier};
