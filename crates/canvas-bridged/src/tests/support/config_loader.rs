//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;

use canvas_bridge_config::{Config, ConfigError, LogFormat};

use crate::bootstrap::ConfigLoader;

/// Loader that binds loopback on an ephemeral port.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    enabled: bool,
    port: u16,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            port: 0,
        }
    }

    /// Uses a fixed port instead of an ephemeral one.
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::new()
        }
    }

    /// Loads a configuration with the bridge disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(Config {
            enable: self.enabled,
            port: self.port,
            log_format: LogFormat::Compact,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        let args = vec![
            OsString::from("canvas-bridged"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
