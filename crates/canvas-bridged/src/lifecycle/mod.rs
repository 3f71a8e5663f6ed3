//! Bridge lifecycle: starting and stopping the listener on request.
//!
//! The host toggles the bridge through [`BridgeController::reconcile`], which
//! compares the desired state with the running listener and starts or stops
//! it. Each call returns a human-readable status line plus the recent
//! lifecycle log.

mod controller;
mod log;

pub use self::controller::BridgeController;
pub use self::log::{BridgeLog, LOG_CAPACITY};

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// What the host wants the bridge to be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredState {
    /// Whether the bridge should accept connections.
    pub enabled: bool,
    /// Port to listen on when starting. Zero selects an ephemeral port.
    pub port: u16,
}

/// Observable listener state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// No listener is running.
    Stopped,
    /// Accepting connections on `port`.
    Listening {
        /// Bound port.
        port: u16,
    },
}

/// Outcome of a reconcile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeStatus {
    /// Human-readable status line.
    pub status: String,
    /// Recent lifecycle messages, oldest first.
    pub log: Vec<String>,
    /// Listener state after reconciling.
    pub state: ListenerState,
}
