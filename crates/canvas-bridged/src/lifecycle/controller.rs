//! Start/stop control of the bridge listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::debug;

use canvas_bridge_config::Config;

use crate::dispatch::{CommandDispatcher, DispatchConnectionHandler};
use crate::health::HealthReporter;
use crate::host::HostAdapter;
use crate::registry::ObjectRegistry;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

use super::log::{BridgeLog, LogObserver};
use super::{BridgeStatus, DesiredState, LIFECYCLE_TARGET, ListenerState};

/// Owns the listener and reconciles it with the host's desired state.
///
/// The object registry belongs to the controller, not to the listener, so
/// components created before a stop remain addressable after a restart.
pub struct BridgeController {
    bind_host: String,
    max_request_bytes: usize,
    dispatcher: CommandDispatcher,
    reporter: Arc<dyn HealthReporter>,
    log: Arc<BridgeLog>,
    listener: Option<ListenerHandle>,
}

impl BridgeController {
    /// Creates a stopped controller with an empty registry.
    pub fn new(
        config: &Config,
        host: Arc<dyn HostAdapter>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        let dispatcher = CommandDispatcher::new(Arc::new(ObjectRegistry::new()), host);
        let log = Arc::new(BridgeLog::default());
        log.push("Bridge initialized");
        Self {
            bind_host: config.bind_host().to_owned(),
            max_request_bytes: config.max_request_bytes(),
            dispatcher,
            reporter,
            log,
            listener: None,
        }
    }

    /// Dispatcher shared by every connection.
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Registry of components created through the bridge.
    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        self.dispatcher.registry()
    }

    /// Whether the listener is running, and on which port.
    pub fn state(&self) -> ListenerState {
        self.listener
            .as_ref()
            .map_or(ListenerState::Stopped, |listener| ListenerState::Listening {
                port: listener.local_addr().port(),
            })
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    /// Recent lifecycle messages, oldest first.
    pub fn log(&self) -> Vec<String> {
        self.log.snapshot()
    }

    /// Starts listening on `port`. Zero selects an ephemeral port.
    ///
    /// Starting a running controller is a no-op that returns the current
    /// address.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the address cannot be resolved or bound.
    /// The controller stays stopped and the failure is logged.
    pub fn start(&mut self, port: u16) -> Result<SocketAddr, ListenerError> {
        if let Some(addr) = self.local_addr() {
            return Ok(addr);
        }
        let started = self.spawn_listener(port);
        match &started {
            Ok(handle) => {
                let addr = handle.local_addr();
                self.reporter.listener_started(addr);
                self.log.push(format!("Bridge started on port {}", addr.port()));
            }
            Err(error) => {
                self.reporter.listener_failed(error);
                self.log.push(format!("Failed to start TCP listener: {error}"));
            }
        }
        let handle = started?;
        let addr = handle.local_addr();
        self.listener = Some(handle);
        Ok(addr)
    }

    fn spawn_listener(&self, port: u16) -> Result<ListenerHandle, ListenerError> {
        let listener = SocketListener::bind(&self.bind_host, port)?;
        let handler = Arc::new(DispatchConnectionHandler::new(
            self.dispatcher.clone(),
            self.max_request_bytes,
        ));
        let observer = Arc::new(LogObserver {
            log: Arc::clone(&self.log),
            reporter: Arc::clone(&self.reporter),
        });
        listener.start(handler, observer)
    }

    /// Stops listening, closes every open connection, and waits for their
    /// workers. Stopping a stopped controller is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the accept thread panicked.
    /// The controller is stopped either way.
    pub fn stop(&mut self) -> Result<(), ListenerError> {
        let Some(handle) = self.listener.take() else {
            return Ok(());
        };
        let addr = handle.local_addr();
        let stopped = handle.stop();
        match &stopped {
            Ok(()) => {
                self.reporter.listener_stopped(addr);
                self.log.push("Bridge stopped");
            }
            Err(error) => {
                self.reporter.listener_failed(error);
                self.log.push(format!("Error stopping TCP listener: {error}"));
            }
        }
        stopped
    }

    /// Drives the listener towards `desired` and reports the outcome.
    ///
    /// A port change while running is not applied; disable and re-enable the
    /// bridge to move it.
    pub fn reconcile(&mut self, desired: DesiredState) -> BridgeStatus {
        let status = match (desired.enabled, self.local_addr()) {
            (true, None) => match self.start(desired.port) {
                Ok(addr) => format!("Bridge started on port {}", addr.port()),
                Err(error) => format!("Failed to start TCP listener: {error}"),
            },
            (true, Some(addr)) => {
                if desired.port != 0 && desired.port != addr.port() {
                    debug!(
                        target: LIFECYCLE_TARGET,
                        requested = desired.port,
                        current = addr.port(),
                        "port change ignored while running"
                    );
                }
                format!("Bridge running on port {}", addr.port())
            }
            (false, Some(_)) => match self.stop() {
                Ok(()) => "Bridge stopped".to_owned(),
                Err(error) => format!("Error stopping TCP listener: {error}"),
            },
            (false, None) => "Bridge disabled".to_owned(),
        };
        BridgeStatus {
            status,
            log: self.log(),
            state: self.state(),
        }
    }
}

impl Drop for BridgeController {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
