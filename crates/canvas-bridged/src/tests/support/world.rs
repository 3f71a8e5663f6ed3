//! BDD test world: owns the loader, reporter, canvas, and bootstrapped bridge
//! shared by step functions.

use std::cell::RefCell;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use serde_json::Value;

use crate::bootstrap::{BootstrapError, Bridge, ConfigLoader, bootstrap_with};
use crate::host::InMemoryCanvas;
use crate::lifecycle::{BridgeStatus, DesiredState};

use super::client::BridgeClient;
use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    pub canvas: Arc<InMemoryCanvas>,
    bridge: Option<Bridge>,
    bootstrap_error: Option<BootstrapError>,
    pub status: Option<BridgeStatus>,
    pub client: Option<BridgeClient>,
    pub replies: Vec<Value>,
    pub identifiers: Vec<String>,
    pub reserved: Option<TcpListener>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            canvas: Arc::new(InMemoryCanvas::new()),
            bridge: None,
            bootstrap_error: None,
            status: None,
            client: None,
            replies: Vec::new(),
            identifiers: Vec::new(),
            reserved: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Installs a loader that succeeds.
    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(TestConfigLoader::new());
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.bridge.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone(), self.canvas.clone()) {
            Ok(bridge) => self.bridge = Some(bridge),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the bootstrapped bridge.
    pub fn bridge(&self) -> &Bridge {
        self.bridge.as_ref().expect("bridge should be bootstrapped")
    }

    /// Bootstraps if needed and applies the configured state.
    pub fn enable(&mut self) {
        self.bootstrap();
        let bridge = self.bridge.as_mut().expect("bridge should be bootstrapped");
        self.status = Some(bridge.apply_config());
    }

    /// Reconciles the bridge towards `desired`.
    pub fn reconcile(&mut self, desired: DesiredState) {
        let bridge = self.bridge.as_mut().expect("bridge should be bootstrapped");
        self.status = Some(bridge.controller_mut().reconcile(desired));
    }

    /// Binds a port so the bridge cannot take it, returning the port.
    pub fn hold_port(&mut self) -> u16 {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind reserved port");
        let port = listener.local_addr().expect("local addr").port();
        self.reserved = Some(listener);
        port
    }

    /// Address the bridge is listening on.
    pub fn address(&self) -> SocketAddr {
        self.bridge()
            .controller()
            .local_addr()
            .expect("bridge should be listening")
    }

    /// Opens a client connection to the running bridge.
    pub fn connect(&mut self) -> &mut BridgeClient {
        let addr = self.address();
        self.client.insert(BridgeClient::connect(addr))
    }

    /// Returns the connected client.
    pub fn client(&mut self) -> &mut BridgeClient {
        self.client.as_mut().expect("client should be connected")
    }

    /// Last reply received.
    pub fn last_reply(&self) -> &Value {
        self.replies.last().expect("a reply should have been received")
    }

    fn reset_results(&mut self) {
        self.bridge = None;
        self.bootstrap_error = None;
        self.status = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
