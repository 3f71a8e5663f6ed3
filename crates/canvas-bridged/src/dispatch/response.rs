//! Response envelopes and the writer that streams them back to clients.

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::host::ComponentInfo;
use crate::registry::ComponentId;

use super::codec::encode;
use super::errors::DispatchError;

/// Reply to a single request.
///
/// Serialises as one flat object: `success` plus the fields of the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    success: bool,
    #[serde(flatten)]
    body: ResponseBody,
}

/// Operation-specific response fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// A component was placed on the canvas.
    Created {
        /// Registry identifier for the new component.
        component_guid: String,
        /// Component name as the client requested it.
        component_name: String,
        /// Human-readable confirmation.
        message: String,
    },
    /// Supported component kinds.
    Catalogue {
        /// One entry per supported kind.
        components: Vec<ComponentInfo>,
        /// Human-readable summary.
        message: String,
    },
    /// Plain confirmation.
    Message {
        /// Human-readable confirmation.
        message: String,
    },
    /// The request failed.
    Failure {
        /// Description of the failure.
        error: String,
    },
}

impl CommandResponse {
    /// Reply for a successful `create_component`.
    pub fn created(id: ComponentId, component_name: impl Into<String>) -> Self {
        Self::success(ResponseBody::Created {
            component_guid: id.to_string(),
            component_name: component_name.into(),
            message: "Component created successfully".to_owned(),
        })
    }

    /// Reply carrying the component catalogue.
    pub fn catalogue(components: Vec<ComponentInfo>) -> Self {
        let message = format!("{} components available", components.len());
        Self::success(ResponseBody::Catalogue {
            components,
            message,
        })
    }

    /// Successful reply with a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::success(ResponseBody::Message {
            message: message.into(),
        })
    }

    /// Failure reply carrying the error's display text.
    pub fn failure(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            body: ResponseBody::Failure {
                error: error.to_string(),
            },
        }
    }

    const fn success(body: ResponseBody) -> Self {
        Self {
            success: true,
            body,
        }
    }

    /// Whether the request succeeded.
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Operation-specific fields.
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Failure text, for failed replies.
    pub fn error(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Failure { error } => Some(error),
            _ => None,
        }
    }
}

/// Writes responses to a stream, one line each, flushing after every reply.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one response and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_response(&mut self, response: &CommandResponse) -> Result<(), DispatchError> {
        let bytes = encode(response)?;
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn to_json(response: &CommandResponse) -> Value {
        serde_json::to_value(response).expect("serialize")
    }

    #[test]
    fn failure_is_flat() {
        let response = CommandResponse::failure("Unknown command: frobnicate");
        assert_eq!(
            to_json(&response),
            json!({"success": false, "error": "Unknown command: frobnicate"})
        );
        assert_eq!(response.error(), Some("Unknown command: frobnicate"));
    }

    #[test]
    fn message_reply_is_flat() {
        assert_eq!(
            to_json(&CommandResponse::message("Canvas cleared")),
            json!({"success": true, "message": "Canvas cleared"})
        );
    }

    #[test]
    fn created_reply_echoes_the_requested_name() {
        let id: ComponentId = "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
            .parse()
            .expect("valid id");
        let value = to_json(&CommandResponse::created(id, "circle"));
        assert_eq!(value["success"], json!(true));
        assert_eq!(
            value["component_guid"],
            json!("1b4e28ba-2fa1-11d2-883f-0016d3cca427")
        );
        assert_eq!(value["component_name"], json!("circle"));
        assert_eq!(value["message"], json!("Component created successfully"));
    }

    #[test]
    fn writer_emits_one_flushed_line_per_response() {
        let mut output = Vec::new();
        let mut writer = ResponseWriter::new(&mut output);
        writer
            .write_response(&CommandResponse::message("first"))
            .expect("write");
        writer
            .write_response(&CommandResponse::failure("second"))
            .expect("write");

        let text = String::from_utf8(output).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));
        assert!(lines[1].contains(r#""success":false"#));
    }
}
