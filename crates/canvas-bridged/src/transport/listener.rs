//! Listener implementation for the bridge's TCP endpoint.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::connection::ConnectionTracker;
use super::{Cancellation, ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Receives accept failures that occur while the listener is meant to be
/// running.
pub(crate) trait AcceptObserver: Send + Sync {
    fn accept_failed(&self, error: &io::Error);
}

/// Listener bound to a TCP address but not yet accepting.
#[derive(Debug)]
pub(crate) struct SocketListener {
    addr: SocketAddr,
    listener: TcpListener,
}

impl SocketListener {
    pub(crate) fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let listener = bind_tcp(host, port)?;
        let addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self { addr, listener })
    }

    /// Address actually bound; reports the real port when zero was requested.
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        observer: Arc<dyn AcceptObserver>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;

        let addr = self.addr;
        let cancellation = Cancellation::default();
        let connections = Arc::new(ConnectionTracker::default());
        let accept = AcceptLoop {
            listener: self,
            cancellation: cancellation.clone(),
            connections: Arc::clone(&connections),
            handler,
            observer,
        };
        let handle = thread::Builder::new()
            .name("canvas-bridge-accept".to_owned())
            .spawn(move || accept.run())
            .map_err(|source| ListenerError::Spawn { source })?;

        Ok(ListenerHandle {
            addr,
            cancellation,
            connections,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
pub(crate) struct ListenerHandle {
    addr: SocketAddr,
    cancellation: Cancellation,
    connections: Arc<ConnectionTracker>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) fn open_connections(&self) -> usize {
        self.connections.open_count()
    }

    pub(crate) fn shutdown(&self) {
        self.cancellation.cancel();
    }

    /// Waits for the accept loop to exit, then closes every open connection
    /// and waits for its worker.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        let accept = self.handle.take().map(thread::JoinHandle::join);
        self.connections.close_all();
        let panicked = self.connections.join_all();
        if panicked > 0 {
            warn!(target: LISTENER_TARGET, panicked, "connection workers panicked");
        }
        match accept {
            Some(Err(_)) => Err(ListenerError::ThreadPanic),
            _ => Ok(()),
        }
    }

    pub(crate) fn stop(self) -> Result<(), ListenerError> {
        self.shutdown();
        self.join()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancellation.cancel();
        self.connections.close_all();
    }
}

struct AcceptLoop {
    listener: SocketListener,
    cancellation: Cancellation,
    connections: Arc<ConnectionTracker>,
    handler: Arc<dyn ConnectionHandler>,
    observer: Arc<dyn AcceptObserver>,
}

impl AcceptLoop {
    fn run(self) {
        info!(
            target: LISTENER_TARGET,
            addr = %self.listener.addr,
            "TCP listener active"
        );
        let mut next_id = 0_u64;
        let mut last_error = None::<io::ErrorKind>;
        while !self.cancellation.is_cancelled() {
            match accept_connection(&self.listener.listener) {
                Ok(Some((stream, peer))) => {
                    last_error = None;
                    next_id += 1;
                    self.spawn_worker(ConnectionStream::new(next_id, stream, peer));
                }
                Ok(None) => thread::sleep(ACCEPT_BACKOFF),
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(target: LISTENER_TARGET, %error, "socket accept error");
                        self.observer.accept_failed(&error);
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        info!(target: LISTENER_TARGET, addr = %self.listener.addr, "TCP listener closed");
    }

    fn spawn_worker(&self, stream: ConnectionStream) {
        let id = stream.id();
        let tracked = match stream.tcp().try_clone() {
            Ok(tracked) => tracked,
            Err(error) => {
                warn!(target: LISTENER_TARGET, connection = id, %error, "dropping connection");
                return;
            }
        };
        self.connections.register(id, tracked);
        debug!(target: LISTENER_TARGET, connection = id, peer = %stream.peer(), "client connected");

        let handler = Arc::clone(&self.handler);
        let connections = Arc::clone(&self.connections);
        let cancellation = self.cancellation.clone();
        let spawned = thread::Builder::new()
            .name(format!("canvas-bridge-conn-{id}"))
            .spawn(move || {
                handler.handle(stream, &cancellation);
                connections.release(id);
            });
        match spawned {
            Ok(worker) => self.connections.add_worker(worker),
            Err(error) => {
                warn!(target: LISTENER_TARGET, connection = id, %error, "failed to spawn worker");
                self.connections.release(id);
            }
        }
    }
}

fn accept_connection(listener: &TcpListener) -> io::Result<Option<(TcpStream, SocketAddr)>> {
    match listener.accept() {
        Ok((stream, peer)) => {
            stream.set_nonblocking(false)?;
            Ok(Some((stream, peer)))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) if error.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
