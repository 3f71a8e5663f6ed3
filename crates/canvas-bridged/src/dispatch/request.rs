//! Typed command requests.
//!
//! A request is a JSON object whose `command` field selects the operation and
//! whose remaining fields form that operation's payload. Unknown fields are
//! ignored.

use serde::{Deserialize, Deserializer};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::errors::DecodeError;

const CREATE_COMPONENT: &str = "create_component";
const CONNECT_PARAMETERS: &str = "connect_parameters";
const CLEAR_CANVAS: &str = "clear_canvas";
const LIST_COMPONENTS: &str = "list_components";

/// A decoded client command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Place a new component on the canvas.
    CreateComponent(CreateComponent),
    /// Wire an output parameter to an input parameter.
    ConnectParameters(ConnectParameters),
    /// Remove every component the bridge created.
    ClearCanvas,
    /// Describe the supported component kinds.
    ListComponents,
}

/// Payload of `create_component`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateComponent {
    /// Requested kind, for example `circle` or `GH_Circle`.
    pub component_name: String,
    /// Supplied parameters. Absent and `null` both read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parameters: Map<String, Value>,
}

impl CreateComponent {
    /// Creates a payload with explicit parameters.
    pub fn new(component_name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            component_name: component_name.into(),
            parameters,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload of `connect_parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectParameters {
    /// Identifier of the component providing the value.
    pub source_component_guid: String,
    /// Identifier of the component consuming the value.
    pub target_component_guid: String,
    /// Output parameter on the source.
    pub source_parameter_name: String,
    /// Input parameter on the target.
    pub target_parameter_name: String,
}

impl Command {
    /// Wire name of the command.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateComponent(_) => CREATE_COMPONENT,
            Self::ConnectParameters(_) => CONNECT_PARAMETERS,
            Self::ClearCanvas => CLEAR_CANVAS,
            Self::ListComponents => LIST_COMPONENTS,
        }
    }

    /// Interprets a parsed JSON value as a command.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the value is not an object, carries no
    /// `command` field, names an unknown command, or has a payload that does
    /// not fit the command.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let Value::Object(mut object) = value else {
            return Err(DecodeError::NotAnObject);
        };
        let name = match object.remove("command") {
            None | Some(Value::Null) => return Err(DecodeError::MissingCommand),
            Some(Value::String(name)) => name,
            Some(other) => return Err(DecodeError::unknown_command(other.to_string())),
        };
        let body = Value::Object(object);

        match name.as_str() {
            CREATE_COMPONENT => payload(CREATE_COMPONENT, body).map(Self::CreateComponent),
            CONNECT_PARAMETERS => payload(CONNECT_PARAMETERS, body).map(Self::ConnectParameters),
            CLEAR_CANVAS => Ok(Self::ClearCanvas),
            LIST_COMPONENTS => Ok(Self::ListComponents),
            _ => Err(DecodeError::unknown_command(name)),
        }
    }
}

fn payload<T: DeserializeOwned>(command: &'static str, body: Value) -> Result<T, DecodeError> {
    serde_json::from_value(body).map_err(|error| DecodeError::invalid_payload(command, &error))
}
