//! Boundary between the bridge and the host canvas application.
//!
//! The bridge never constructs host objects itself. It asks a [`HostAdapter`]
//! to materialise a node described by a [`NodeSpec`] and keeps the returned
//! [`HostHandle`] purely as a non-owning reference for later lookups.
//!
//! ## Thread safety
//!
//! Adapters are shared across every connection thread and are called
//! concurrently. The bridge does not serialise calls on an adapter's behalf:
//! an adapter whose host requires single-threaded access must provide its own
//! synchronisation.

mod canvas;
mod catalogue;

use std::fmt;

use thiserror::Error;

pub use canvas::{InMemoryCanvas, Wire};
pub use catalogue::{
    ComponentInfo, ComponentKind, DefaultValue, ParameterInfo, ParameterType, catalogue,
};

/// Opaque reference to a live object inside the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(u64);

impl HostHandle {
    /// Wraps a host-assigned raw handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in 3D space.
pub type Point3 = [f64; 3];

/// Fully resolved description of a node to create, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    /// Circle on a named construction plane.
    Circle {
        /// Circle radius.
        radius: f64,
        /// Construction plane name, for example `XY`.
        plane: String,
    },
    /// Point at the given coordinates.
    Point {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Z coordinate.
        z: f64,
    },
    /// Line, optionally seeded with endpoints.
    Line {
        /// Start point, when supplied.
        start: Option<Point3>,
        /// End point, when supplied.
        end: Option<Point3>,
    },
}

impl NodeSpec {
    /// Component kind described by this spec.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Circle { .. } => ComponentKind::Circle,
            Self::Point { .. } => ComponentKind::Point,
            Self::Line { .. } => ComponentKind::Line,
        }
    }
}

/// Failure reported by the host application.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The handle does not refer to a live host object.
    #[error("host object {handle} no longer exists")]
    StaleHandle {
        /// Handle that failed to resolve.
        handle: HostHandle,
    },
    /// The host rejected the operation.
    #[error("{message}")]
    Rejected {
        /// Host-supplied explanation.
        message: String,
    },
}

impl HostError {
    /// Creates a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Operations the bridge needs from the host application.
///
/// All methods are synchronous and may be invoked from several threads at
/// once; see the module documentation for the synchronisation contract.
#[cfg_attr(test, mockall::automock)]
pub trait HostAdapter: Send + Sync {
    /// Materialises a node. `Ok(None)` means the host declined to create one.
    fn create_node(&self, spec: &NodeSpec) -> Result<Option<HostHandle>, HostError>;

    /// Removes a node from the host document.
    fn remove_node(&self, handle: HostHandle) -> Result<(), HostError>;

    /// Wires `output` on `source` to `input` on `target`.
    ///
    /// Returns `Ok(false)` when the host refuses the wiring, for example
    /// because a parameter name does not exist on the node.
    fn connect(
        &self,
        source: HostHandle,
        output: &str,
        target: HostHandle,
        input: &str,
    ) -> Result<bool, HostError>;

    /// Asks the host to recompute its document.
    fn trigger_reevaluation(&self) -> Result<(), HostError>;
}
