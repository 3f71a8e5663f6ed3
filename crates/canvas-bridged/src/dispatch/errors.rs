//! Error types for request decoding and command dispatch.
//!
//! [`DecodeError`] covers everything that can go wrong before a typed command
//! exists; [`DispatchError`] covers validation and host failures while a
//! command runs. Both render into the `error` field of a failure response, so
//! their display strings are part of the wire contract.

use std::io;

use thiserror::Error;

use crate::host::HostError;
use crate::registry::RegistryError;

/// Errors surfaced while turning buffered bytes into a typed command.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Bytes were not valid JSON, including invalid UTF-8 inside strings, or
    /// the connection closed mid-request.
    #[error("malformed request: {message}")]
    Malformed {
        /// Parser diagnostic or description of the truncation.
        message: String,
        /// Underlying parser error, absent for truncated requests.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The request was valid JSON but not an object.
    #[error("request must be a JSON object")]
    NotAnObject,

    /// The `command` field was absent or null.
    #[error("Missing command field")]
    MissingCommand,

    /// The `command` field named no known operation.
    #[error("Unknown command: {name}")]
    UnknownCommand {
        /// Command name as sent by the client.
        name: String,
    },

    /// The payload did not match the command's schema.
    #[error("invalid {command} request: {message}")]
    InvalidPayload {
        /// Wire name of the command whose payload failed.
        command: &'static str,
        /// Deserialisation failure describing the offending field.
        message: String,
    },

    /// An incomplete request outgrew the buffer limit. The stream cannot be
    /// resynchronised after this error.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes buffered when the limit was exceeded.
        size: usize,
        /// Configured `max_request_bytes`.
        max_size: usize,
    },
}

impl DecodeError {
    /// Creates a malformed request error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    /// Creates an invalid payload error.
    pub fn invalid_payload(command: &'static str, source: &serde_json::Error) -> Self {
        Self::InvalidPayload {
            command,
            message: source.to_string(),
        }
    }

    /// Whether the connection must close after replying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RequestTooLarge { .. })
    }
}

/// Errors surfaced while executing a decoded command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `component_name` names no catalogue entry.
    #[error("Unsupported component: {name}")]
    UnsupportedComponent { name: String },

    /// A component parameter had the wrong type or range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A referenced identifier does not resolve in the registry.
    #[error("Component not found")]
    ComponentNotFound {
        #[source]
        source: RegistryError,
    },

    /// The host declined to create the node.
    #[error("Failed to create component")]
    CreationDeclined,

    /// The host refused to wire the named parameters.
    #[error("Failed to connect {output} to {input}")]
    ConnectionRejected { output: String, input: String },

    /// Some host removals failed while clearing the canvas.
    #[error("failed to remove {failed} of {total} components from the canvas: {first}")]
    ClearIncomplete {
        failed: usize,
        total: usize,
        first: String,
    },

    /// The host adapter reported a failure.
    #[error("{source}")]
    Host {
        operation: &'static str,
        #[source]
        source: HostError,
    },

    /// The host adapter panicked.
    #[error("host adapter panicked during {operation}")]
    HostPanicked { operation: &'static str },

    /// Writing a response failed.
    #[error("failed to write response: {0}")]
    Io(#[from] io::Error),

    /// Serialising a response failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

impl DispatchError {
    /// Creates an unsupported component error.
    pub fn unsupported_component(name: impl Into<String>) -> Self {
        Self::UnsupportedComponent { name: name.into() }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a host adapter failure for a handle the host no
    /// longer knows about.
    pub fn is_stale_handle(&self) -> bool {
        matches!(
            self,
            Self::Host {
                source: HostError::StaleHandle { .. },
                ..
            }
        )
    }
}

impl From<RegistryError> for DispatchError {
    fn from(source: RegistryError) -> Self {
        Self::ComponentNotFound { source }
    }
}
