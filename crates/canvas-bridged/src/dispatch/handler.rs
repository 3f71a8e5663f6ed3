//! Connection handler that decodes and dispatches pipelined commands.
//!
//! Each connection runs a read loop on its own worker thread: bytes are fed
//! to a [`RequestDecoder`], every complete request is executed in arrival
//! order, and its reply is written and flushed before the next request is
//! taken. Malformed requests get an error reply and the connection stays
//! open; only an oversize request closes it.

use std::io::{self, Read};
use std::net::TcpStream;

use tracing::{debug, warn};

use crate::transport::{Cancellation, ConnectionHandler, ConnectionStream};

use super::codec::{READ_CHUNK_BYTES, RequestDecoder};
use super::errors::DispatchError;
use super::response::{CommandResponse, ResponseWriter};
use super::router::{CommandDispatcher, DISPATCH_TARGET};

/// Why a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    PeerFinished,
    Cancelled,
    RequestTooLarge,
}

/// Connection handler that serves commands until the peer disconnects.
#[derive(Debug, Clone)]
pub struct DispatchConnectionHandler {
    dispatcher: CommandDispatcher,
    max_request_bytes: usize,
}

impl DispatchConnectionHandler {
    /// Creates a handler sharing `dispatcher` across connections.
    pub fn new(dispatcher: CommandDispatcher, max_request_bytes: usize) -> Self {
        Self {
            dispatcher,
            max_request_bytes,
        }
    }

    fn serve(&self, socket: &TcpStream, cancellation: &Cancellation) -> Result<Closed, DispatchError> {
        let mut reader = socket;
        let mut writer = ResponseWriter::new(socket);
        let mut decoder = RequestDecoder::new(self.max_request_bytes);
        let mut chunk = [0_u8; READ_CHUNK_BYTES];

        loop {
            while let Some(decoded) = decoder.next_request() {
                let fatal = decoded.as_ref().is_err_and(|error| error.is_fatal());
                let response = self.dispatcher.respond(decoded);
                writer.write_response(&response)?;
                if fatal {
                    return Ok(Closed::RequestTooLarge);
                }
            }

            if cancellation.is_cancelled() {
                return Ok(Closed::Cancelled);
            }
            let read = read_with_retry(&mut reader, &mut chunk)?;
            if read == 0 {
                if cancellation.is_cancelled() {
                    return Ok(Closed::Cancelled);
                }
                if let Some(error) = decoder.finish() {
                    writer.write_response(&CommandResponse::failure(&error))?;
                }
                return Ok(Closed::PeerFinished);
            }
            decoder.push(&chunk[..read]);
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream, cancellation: &Cancellation) {
        let connection = stream.id();
        match self.serve(stream.tcp(), cancellation) {
            Ok(closed) => debug!(
                target: DISPATCH_TARGET,
                connection,
                reason = ?closed,
                "connection finished"
            ),
            Err(error) if cancellation.is_cancelled() => debug!(
                target: DISPATCH_TARGET,
                connection,
                %error,
                "connection interrupted by shutdown"
            ),
            Err(error) => warn!(
                target: DISPATCH_TARGET,
                connection,
                %error,
                "connection failed"
            ),
        }
    }
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry(stream: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
