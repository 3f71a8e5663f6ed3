//! Shared configuration for the canvas bridge.
//!
//! The bridge is configured from command-line flags, falling back to
//! `CANVAS_BRIDGE_*` environment variables and finally to the `DEFAULT_*`
//! constants. Flags win over environment variables, which win over
//! defaults.

mod defaults;
mod logging;

use std::ffi::OsString;

use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_BIND_HOST, DEFAULT_LOG_FILTER, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_PORT,
    default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser, Serialize, Deserialize)]
#[command(
    name = "canvas-bridged",
    version,
    about = "Command bridge between network clients and a parametric design canvas"
)]
pub struct Config {
    /// Whether the bridge accepts connections once launched.
    #[arg(
        long,
        env = "CANVAS_BRIDGE_ENABLE",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub enable: bool,

    /// Interface the listener binds to.
    #[arg(long, env = "CANVAS_BRIDGE_HOST", default_value = DEFAULT_BIND_HOST)]
    pub bind_host: String,

    /// TCP port the listener binds to. Zero selects an ephemeral port.
    #[arg(short, long, env = "CANVAS_BRIDGE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// `tracing` filter expression, for example `info,canvas_bridged=debug`.
    #[arg(long, env = "CANVAS_BRIDGE_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Log output format.
    #[arg(long, env = "CANVAS_BRIDGE_LOG_FORMAT", default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Upper bound on a single buffered request, in bytes.
    #[arg(
        long,
        env = "CANVAS_BRIDGE_MAX_REQUEST_BYTES",
        default_value_t = DEFAULT_MAX_REQUEST_BYTES
    )]
    pub max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable: true,
            bind_host: DEFAULT_BIND_HOST.to_owned(),
            port: DEFAULT_PORT,
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Arguments or environment variables could not be parsed.
    #[error("invalid configuration: {source}")]
    Parse {
        /// Parser diagnostic, including help and version requests.
        #[source]
        source: clap::Error,
    },
    /// The request size limit was zero.
    #[error("max_request_bytes must be greater than zero")]
    ZeroRequestLimit,
}

impl ConfigError {
    /// Returns the underlying parser error, when there is one.
    #[must_use]
    pub fn parse_error(&self) -> Option<&clap::Error> {
        match self {
            Self::Parse { source } => Some(source),
            Self::ZeroRequestLimit => None,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a flag or environment variable is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list. The first item is
    /// treated as the binary name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a flag or environment variable is invalid.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config =
            Self::try_parse_from(args).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_request_bytes == 0 {
            return Err(ConfigError::ZeroRequestLimit);
        }
        Ok(())
    }

    /// Whether the bridge should start listening on launch.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enable
    }

    /// Interface the listener binds to.
    #[must_use]
    pub fn bind_host(&self) -> &str {
        &self.bind_host
    }

    /// Configured TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Request size limit in bytes.
    #[must_use]
    pub const fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }
}
