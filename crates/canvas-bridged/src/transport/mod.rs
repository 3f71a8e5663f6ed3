//! TCP listener for the bridge.
//!
//! The listener accepts connections on a background thread and hands each one
//! to a [`ConnectionHandler`] on its own worker thread. Stopping the listener
//! closes the listening socket, shuts down every open connection, and joins
//! all worker threads.

mod connection;
mod errors;
mod listener;
#[cfg(test)]
mod test_utils;

pub(crate) use self::connection::{Cancellation, ConnectionHandler, ConnectionStream};
pub use self::errors::ListenerError;
pub(crate) use self::listener::{AcceptObserver, ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, HoldingHandler, RecordingObserver};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
