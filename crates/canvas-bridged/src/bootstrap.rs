//! Bridge bootstrap orchestration.

use std::sync::Arc;

use thiserror::Error;

use canvas_bridge_config::{Config, ConfigError};

use crate::health::HealthReporter;
use crate::host::HostAdapter;
use crate::lifecycle::{BridgeController, BridgeStatus, DesiredState};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the bridge configuration.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Bridge {
    config: Config,
    controller: BridgeController,
    telemetry: TelemetryHandle,
}

impl Bridge {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Lifecycle controller owning the listener and registry.
    #[must_use]
    pub fn controller(&self) -> &BridgeController {
        &self.controller
    }

    /// Mutable access to the lifecycle controller.
    pub fn controller_mut(&mut self) -> &mut BridgeController {
        &mut self.controller
    }

    /// Applies the configured `enable` and `port` settings.
    pub fn apply_config(&mut self) -> BridgeStatus {
        let desired = DesiredState {
            enabled: self.config.enabled(),
            port: self.config.port(),
        };
        self.controller.reconcile(desired)
    }

    /// Disables the bridge, closing the listener and every connection.
    pub fn disable(&mut self) -> BridgeStatus {
        let desired = DesiredState {
            enabled: false,
            port: self.config.port(),
        };
        self.controller.reconcile(desired)
    }
}

/// Bootstraps the bridge using the supplied collaborators.
///
/// The returned bridge is stopped; call [`Bridge::apply_config`] to start
/// listening.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration or telemetry fails. The
/// reporter is notified before the error is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    host: Arc<dyn HostAdapter>,
) -> Result<Bridge, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let controller = BridgeController::new(&config, host, Arc::clone(&reporter));
    reporter.bootstrap_succeeded(&config);

    Ok(Bridge {
        config,
        controller,
        telemetry,
    })
}
