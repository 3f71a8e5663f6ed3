//! Command bridge between network clients and a parametric design canvas.
//!
//! Clients connect over TCP and send JSON commands that create components,
//! wire their parameters together, or clear the canvas. The bridge assigns
//! each created component an opaque identifier, keeps the mapping from
//! identifier to host object in an [`ObjectRegistry`], and performs every
//! host mutation through a [`HostAdapter`]. The bundled [`InMemoryCanvas`]
//! stands in for a real host application.
//!
//! The host controls the bridge through [`BridgeController::reconcile`],
//! passing whether it should be enabled and on which port. Stopping the
//! bridge closes the listener and every open connection; the registry
//! survives, so identifiers handed out earlier keep resolving after a
//! restart.
//!
//! Health reporting hooks emit structured telemetry at each lifecycle stage
//! so operators can diagnose bind failures and connection trouble quickly.

mod bootstrap;
pub mod dispatch;
mod health;
pub mod host;
pub mod lifecycle;
mod process;
pub mod registry;
mod telemetry;
mod transport;

pub use bootstrap::{
    Bridge, BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use host::{HostAdapter, HostError, HostHandle, InMemoryCanvas, NodeSpec};
pub use lifecycle::{BridgeController, BridgeStatus, DesiredState, ListenerState};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_bridge, run_bridge_with,
};
pub use registry::{ComponentId, ObjectRegistry, RegistryError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
