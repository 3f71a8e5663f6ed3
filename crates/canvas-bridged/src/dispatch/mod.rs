//! Request decoding and command dispatch.
//!
//! This module turns the byte stream of a client connection into typed
//! [`Command`]s, executes them against the [`ObjectRegistry`] and host
//! adapter, and streams one [`CommandResponse`] line back per request.
//!
//! ## Protocol
//!
//! Each request is a single JSON object. The `command` field selects the
//! operation; the remaining fields are its payload:
//!
//! ```json
//! {"command":"create_component","component_name":"circle","parameters":{"Radius":10.0}}
//! ```
//!
//! Each reply is one compact JSON object terminated by `\n`:
//!
//! ```json
//! {"success":true,"component_guid":"…","component_name":"circle","message":"Component created successfully"}
//! {"success":false,"error":"Unknown command: frobnicate"}
//! ```
//!
//! Requests on a connection are answered strictly in arrival order.
//!
//! [`ObjectRegistry`]: crate::registry::ObjectRegistry

mod codec;
mod errors;
mod handler;
mod parameters;
mod request;
mod response;
mod router;

pub use self::codec::{RequestDecoder, encode};
pub use self::errors::{DecodeError, DispatchError};
pub(crate) use self::handler::DispatchConnectionHandler;
pub use self::request::{Command, ConnectParameters, CreateComponent};
pub use self::response::{CommandResponse, ResponseBody};
pub use self::router::CommandDispatcher;
