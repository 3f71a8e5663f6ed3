//! Static catalogue of the component kinds the bridge can place on the canvas.
//!
//! Each kind advertises its input and output parameters so clients can
//! discover valid names for `connect_parameters`, and so the simulated canvas
//! can reject wiring between parameters that do not exist.

use serde::Serialize;

/// Component kinds supported by `create_component`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComponentKind {
    /// Circle defined by a base plane and radius.
    #[serde(rename = "GH_Circle")]
    Circle,
    /// Point defined by its coordinates.
    #[serde(rename = "GH_Point")]
    Point,
    /// Line between two points.
    #[serde(rename = "GH_Line")]
    Line,
}

/// Data type carried by a component parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    /// Floating point number.
    Number,
    /// Free text.
    Text,
    /// Point in 3D space.
    Point,
    /// Construction plane.
    Plane,
    /// Curve geometry.
    Curve,
}

/// Default applied when a client omits an optional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Numeric default.
    Number(f64),
    /// Textual default.
    Text(&'static str),
}

/// Description of a single component parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterInfo {
    /// Parameter name as used on the wire.
    pub name: &'static str,
    /// Data type of the parameter.
    #[serde(rename = "type")]
    pub kind: ParameterType,
    /// Value used when the parameter is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

const fn param(name: &'static str, kind: ParameterType) -> ParameterInfo {
    ParameterInfo {
        name,
        kind,
        default: None,
    }
}

const fn number(name: &'static str, default: f64) -> ParameterInfo {
    ParameterInfo {
        name,
        kind: ParameterType::Number,
        default: Some(DefaultValue::Number(default)),
    }
}

const CIRCLE_INPUTS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "Plane",
        kind: ParameterType::Plane,
        default: Some(DefaultValue::Text("XY")),
    },
    number("Radius", 1.0),
];
const CIRCLE_OUTPUTS: &[ParameterInfo] = &[param("Circle", ParameterType::Curve)];
const POINT_INPUTS: &[ParameterInfo] = &[number("X", 0.0), number("Y", 0.0), number("Z", 0.0)];
const POINT_OUTPUTS: &[ParameterInfo] = &[param("Point", ParameterType::Point)];
const LINE_INPUTS: &[ParameterInfo] = &[
    param("Start", ParameterType::Point),
    param("End", ParameterType::Point),
];
const LINE_OUTPUTS: &[ParameterInfo] = &[param("Line", ParameterType::Curve)];

impl ComponentKind {
    /// Every supported kind, in catalogue order.
    pub const ALL: [Self; 3] = [Self::Point, Self::Circle, Self::Line];

    /// Resolves a client-supplied component name.
    ///
    /// Matching ignores ASCII case and an optional `GH_` prefix, so `circle`,
    /// `Circle`, and `GH_Circle` all resolve to [`ComponentKind::Circle`].
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let bare = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("gh_") => trimmed.get(3..)?,
            _ => trimmed,
        };
        Self::ALL
            .into_iter()
            .find(|kind| kind.short_name().eq_ignore_ascii_case(bare))
    }

    /// Canonical host-side name, for example `GH_Point`.
    #[must_use]
    pub const fn canonical_name(self) -> &'static str {
        match self {
            Self::Circle => "GH_Circle",
            Self::Point => "GH_Point",
            Self::Line => "GH_Line",
        }
    }

    /// Lower-case short alias, for example `point`.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Point => "point",
            Self::Line => "line",
        }
    }

    /// One-line description shown in the catalogue.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Circle => "Create a circle from a base plane and radius",
            Self::Point => "Create a point from X, Y, Z coordinates",
            Self::Line => "Create a line between two points",
        }
    }

    /// Input parameters accepted by the kind.
    #[must_use]
    pub const fn inputs(self) -> &'static [ParameterInfo] {
        match self {
            Self::Circle => CIRCLE_INPUTS,
            Self::Point => POINT_INPUTS,
            Self::Line => LINE_INPUTS,
        }
    }

    /// Output parameters produced by the kind.
    #[must_use]
    pub const fn outputs(self) -> &'static [ParameterInfo] {
        match self {
            Self::Circle => CIRCLE_OUTPUTS,
            Self::Point => POINT_OUTPUTS,
            Self::Line => LINE_OUTPUTS,
        }
    }

    /// Whether `name` is one of this kind's inputs.
    #[must_use]
    pub fn has_input(self, name: &str) -> bool {
        self.inputs().iter().any(|p| p.name == name)
    }

    /// Whether `name` is one of this kind's outputs.
    #[must_use]
    pub fn has_output(self, name: &str) -> bool {
        self.outputs().iter().any(|p| p.name == name)
    }
}

/// Catalogue entry returned by `list_components`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentInfo {
    /// Canonical component name.
    pub name: &'static str,
    /// Accepted short alias.
    pub alias: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Input parameters.
    pub inputs: &'static [ParameterInfo],
    /// Output parameters.
    pub outputs: &'static [ParameterInfo],
}

impl From<ComponentKind> for ComponentInfo {
    fn from(kind: ComponentKind) -> Self {
        Self {
            name: kind.canonical_name(),
            alias: kind.short_name(),
            description: kind.description(),
            inputs: kind.inputs(),
            outputs: kind.outputs(),
        }
    }
}

/// Returns catalogue entries for every supported kind.
#[must_use]
pub fn catalogue() -> Vec<ComponentInfo> {
    ComponentKind::ALL.into_iter().map(ComponentInfo::from).collect()
}
