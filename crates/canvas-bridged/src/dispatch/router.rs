//! Command execution against the registry and host adapter.
//!
//! [`CommandDispatcher`] maps each decoded [`Command`] to its handler and turns
//! every outcome, including adapter failures and adapter panics, into a
//! [`CommandResponse`]. It never fails and never panics on behalf of the host.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::host::{ComponentKind, HostAdapter, HostError, catalogue};
use crate::registry::ObjectRegistry;

use super::errors::{DecodeError, DispatchError};
use super::parameters::node_spec;
use super::request::{Command, ConnectParameters, CreateComponent};
use super::response::CommandResponse;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Executes commands on behalf of every connection.
///
/// Cloning is cheap; clones share the registry and adapter.
#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<ObjectRegistry>,
    host: Arc<dyn HostAdapter>,
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    /// Creates a dispatcher over a shared registry and host adapter.
    pub fn new(registry: Arc<ObjectRegistry>, host: Arc<dyn HostAdapter>) -> Self {
        Self { registry, host }
    }

    /// Registry of components created through this dispatcher.
    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    /// Produces the reply for a decoded request or a decode failure.
    pub fn respond(&self, decoded: Result<Command, DecodeError>) -> CommandResponse {
        match decoded {
            Ok(command) => self.dispatch(command),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request");
                CommandResponse::failure(&error)
            }
        }
    }

    /// Executes one command.
    pub fn dispatch(&self, command: Command) -> CommandResponse {
        let name = command.name();
        debug!(target: DISPATCH_TARGET, command = name, "dispatching command");
        let outcome = match command {
            Command::CreateComponent(request) => self.create_component(&request),
            Command::ConnectParameters(request) => self.connect_parameters(&request),
            Command::ClearCanvas => self.clear_canvas(),
            Command::ListComponents => Ok(CommandResponse::catalogue(catalogue())),
        };
        outcome.unwrap_or_else(|error| {
            warn!(target: DISPATCH_TARGET, command = name, %error, "command failed");
            CommandResponse::failure(&error)
        })
    }

    fn create_component(&self, request: &CreateComponent) -> Result<CommandResponse, DispatchError> {
        let kind = ComponentKind::parse(&request.component_name)
            .ok_or_else(|| DispatchError::unsupported_component(&request.component_name))?;
        let spec = node_spec(kind, &request.parameters)?;

        let handle = self
            .call_host("create_node", || self.host.create_node(&spec))?
            .ok_or(DispatchError::CreationDeclined)?;
        let id = self.registry.insert(handle);
        self.reevaluate();

        info!(
            target: DISPATCH_TARGET,
            %id,
            %handle,
            kind = kind.canonical_name(),
            "component created"
        );
        Ok(CommandResponse::created(id, &request.component_name))
    }

    fn connect_parameters(
        &self,
        request: &ConnectParameters,
    ) -> Result<CommandResponse, DispatchError> {
        let source = self.registry.lookup(&request.source_component_guid)?;
        let target = self.registry.lookup(&request.target_component_guid)?;
        let output = &request.source_parameter_name;
        let input = &request.target_parameter_name;

        let wired = self.call_host("connect", || {
            self.host.connect(source, output, target, input)
        })?;
        if !wired {
            return Err(DispatchError::ConnectionRejected {
                output: output.clone(),
                input: input.clone(),
            });
        }
        debug!(target: DISPATCH_TARGET, %source, output, %target, input, "parameters connected");
        Ok(CommandResponse::message(format!("Connected {output} to {input}")))
    }

    fn clear_canvas(&self) -> Result<CommandResponse, DispatchError> {
        let handles = self.registry.remove_all();
        let total = handles.len();
        let mut failures = Vec::new();

        for handle in handles {
            match self.call_host("remove_node", || self.host.remove_node(handle)) {
                Ok(()) => {}
                Err(error) if error.is_stale_handle() => {
                    debug!(target: DISPATCH_TARGET, %handle, "node already gone from host");
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %handle, %error, "failed to remove node");
                    failures.push(error);
                }
            }
        }
        self.reevaluate();

        if let Some(first) = failures.first() {
            return Err(DispatchError::ClearIncomplete {
                failed: failures.len(),
                total,
                first: first.to_string(),
            });
        }
        info!(target: DISPATCH_TARGET, removed = total, "canvas cleared");
        Ok(CommandResponse::message("Canvas cleared"))
    }

    /// Re-evaluation failures are logged; the mutation already happened.
    fn reevaluate(&self) {
        if let Err(error) = self.call_host("trigger_reevaluation", || {
            self.host.trigger_reevaluation()
        }) {
            warn!(target: DISPATCH_TARGET, %error, "host re-evaluation failed");
        }
    }

    fn call_host<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce() -> Result<T, HostError>,
    ) -> Result<T, DispatchError> {
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(DispatchError::Host { operation, source }),
            Err(_) => Err(DispatchError::HostPanicked { operation }),
        }
    }
}
