//! Defines the unified error surface for bridge launch and supervision.

use thiserror::Error;

use canvas_bridge_config::ConfigError;

use crate::bootstrap::BootstrapError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the bridge process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed before the bridge could start.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The bridge was enabled but the listener did not start.
    #[error("bridge failed to start: {status}")]
    Start {
        /// Status line reported by the lifecycle controller.
        status: String,
    },
    /// Waiting for a termination signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

impl LaunchError {
    /// Returns the configuration error behind a failed launch, if any.
    ///
    /// Help and version requests surface here as parser errors.
    #[must_use]
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Self::Bootstrap(BootstrapError::Configuration { source }) => Some(source),
            _ => None,
        }
    }
}
