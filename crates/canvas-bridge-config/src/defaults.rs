use crate::logging::LogFormat;

/// TCP port the bridge listens on when none is configured.
pub const DEFAULT_PORT: u16 = 8888;

/// Interface the listener binds to when none is configured.
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";

/// Log filter expression applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Largest single request, in bytes, the bridge will buffer.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
