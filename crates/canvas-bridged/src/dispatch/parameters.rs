//! Resolution of `create_component` parameters into a [`NodeSpec`].
//!
//! Parameter names match the catalogue exactly. Missing or `null` parameters
//! take the catalogue default; unrecognised parameters are ignored.

use serde_json::{Map, Value};

use crate::host::{ComponentKind, NodeSpec, Point3};

use super::errors::DispatchError;

type Parameters = Map<String, Value>;

/// Builds the node description for `kind` from client parameters.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidParameter`] when a supplied parameter has
/// the wrong type or is out of range.
pub fn node_spec(kind: ComponentKind, parameters: &Parameters) -> Result<NodeSpec, DispatchError> {
    match kind {
        ComponentKind::Circle => {
            let radius = number(parameters, "Radius", 1.0)?;
            if radius < 0.0 {
                return Err(DispatchError::invalid_parameter(
                    "Radius",
                    "must not be negative",
                ));
            }
            Ok(NodeSpec::Circle {
                radius,
                plane: text(parameters, "Plane", "XY")?,
            })
        }
        ComponentKind::Point => Ok(NodeSpec::Point {
            x: number(parameters, "X", 0.0)?,
            y: number(parameters, "Y", 0.0)?,
            z: number(parameters, "Z", 0.0)?,
        }),
        ComponentKind::Line => Ok(NodeSpec::Line {
            start: point(parameters, "Start")?,
            end: point(parameters, "End")?,
        }),
    }
}

fn supplied<'a>(parameters: &'a Parameters, name: &str) -> Option<&'a Value> {
    parameters.get(name).filter(|value| !value.is_null())
}

fn number(parameters: &Parameters, name: &str, default: f64) -> Result<f64, DispatchError> {
    let Some(value) = supplied(parameters, name) else {
        return Ok(default);
    };
    coerce_number(value).ok_or_else(|| DispatchError::invalid_parameter(name, "expected a number"))
}

/// Numbers and numeric strings are both accepted.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn text(parameters: &Parameters, name: &str, default: &str) -> Result<String, DispatchError> {
    match supplied(parameters, name) {
        None => Ok(default.to_owned()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(DispatchError::invalid_parameter(name, "expected a string")),
    }
}

fn point(parameters: &Parameters, name: &str) -> Result<Option<Point3>, DispatchError> {
    let Some(value) = supplied(parameters, name) else {
        return Ok(None);
    };
    let invalid = || DispatchError::invalid_parameter(name, "expected [x, y, z]");
    let Value::Array(items) = value else {
        return Err(invalid());
    };
    let [x, y, z] = items.as_slice() else {
        return Err(invalid());
    };
    match (coerce_number(x), coerce_number(y), coerce_number(z)) {
        (Some(x), Some(y), Some(z)) => Ok(Some([x, y, z])),
        _ => Err(invalid()),
    }
}
