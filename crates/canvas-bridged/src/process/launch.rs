//! Supervises bridge launch sequencing and shutdown.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::host::{HostAdapter, InMemoryCanvas};
use crate::lifecycle::ListenerState;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the bridge with production collaborators until a termination signal
/// arrives.
///
/// The bridge drives an [`InMemoryCanvas`]; embedders with a real host call
/// [`run_bridge_with`] instead.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap fails, the enabled listener cannot
/// start, or signal handlers cannot be installed.
pub fn run_bridge() -> Result<(), LaunchError> {
    run_bridge_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        Arc::new(InMemoryCanvas::new()),
        &SystemShutdownSignal::new(),
    )
}

/// Runs the bridge with injected collaborators.
///
/// # Errors
///
/// See [`run_bridge`].
pub fn run_bridge_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    host: Arc<dyn HostAdapter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let mut bridge = bootstrap_with(loader, reporter, host)?;
    info!(target: PROCESS_TARGET, "starting bridge runtime");

    let status = bridge.apply_config();
    info!(target: PROCESS_TARGET, status = %status.status, "bridge configured");
    if bridge.config().enabled() && status.state == ListenerState::Stopped {
        return Err(LaunchError::Start {
            status: status.status,
        });
    }

    shutdown.wait()?;
    let status = bridge.disable();
    info!(
        target: PROCESS_TARGET,
        status = %status.status,
        "shutdown sequence completed"
    );
    Ok(())
}
