//! Accepted connections and the handler seam.

use std::collections::HashMap;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use super::LISTENER_TARGET;

/// Shared stop flag observed by the accept loop and every connection.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A client connection accepted by the listener.
#[derive(Debug)]
pub(crate) struct ConnectionStream {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
}

impl ConnectionStream {
    pub(crate) fn new(id: u64, stream: TcpStream, peer: SocketAddr) -> Self {
        Self { id, peer, stream }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Underlying socket. `&TcpStream` implements both `Read` and `Write`.
    pub(crate) fn tcp(&self) -> &TcpStream {
        &self.stream
    }
}

/// Handles a single accepted connection until the peer leaves or the
/// listener is cancelled.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    fn handle(&self, stream: ConnectionStream, cancellation: &Cancellation);
}

/// Open connections and their worker threads.
///
/// The tracker keeps a clone of each socket so that shutdown can unblock
/// workers parked in `read`.
#[derive(Debug, Default)]
pub(super) struct ConnectionTracker {
    open: Mutex<HashMap<u64, TcpStream>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConnectionTracker {
    pub(super) fn register(&self, id: u64, stream: TcpStream) {
        lock(&self.open).insert(id, stream);
    }

    pub(super) fn release(&self, id: u64) {
        lock(&self.open).remove(&id);
    }

    pub(super) fn add_worker(&self, worker: JoinHandle<()>) {
        let mut workers = lock(&self.workers);
        workers.retain(|worker| !worker.is_finished());
        workers.push(worker);
    }

    pub(super) fn open_count(&self) -> usize {
        lock(&self.open).len()
    }

    /// Shuts down every tracked socket in both directions.
    pub(super) fn close_all(&self) {
        let open: Vec<_> = lock(&self.open).drain().collect();
        for (id, stream) in open {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => debug!(target: LISTENER_TARGET, connection = id, "connection closed"),
                Err(error) if error.kind() == io::ErrorKind::NotConnected => {}
                Err(error) => warn!(
                    target: LISTENER_TARGET,
                    connection = id,
                    %error,
                    "failed to close connection"
                ),
            }
        }
    }

    /// Joins every worker, returning how many panicked.
    pub(super) fn join_all(&self) -> usize {
        let workers: Vec<_> = lock(&self.workers).drain(..).collect();
        workers
            .into_iter()
            .map(JoinHandle::join)
            .filter(Result::is_err)
            .count()
    }
}
