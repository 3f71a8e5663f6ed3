//! In-process canvas used when no real host application is attached.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{HostAdapter, HostError, HostHandle, NodeSpec};

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// A wire between an output parameter and an input parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    /// Node providing the value.
    pub source: HostHandle,
    /// Output parameter on the source node.
    pub output: String,
    /// Node consuming the value.
    pub target: HostHandle,
    /// Input parameter on the target node.
    pub input: String,
}

#[derive(Debug, Default)]
struct CanvasState {
    next_handle: u64,
    nodes: BTreeMap<HostHandle, NodeSpec>,
    wires: Vec<Wire>,
    evaluations: u64,
}

/// Simulated canvas document.
///
/// Nodes, wires, and re-evaluation requests are recorded in a single
/// mutex-guarded table, which makes the adapter safe to share across
/// connection threads. Wiring is validated against the component catalogue.
#[derive(Debug, Default)]
pub struct InMemoryCanvas {
    state: Mutex<CanvasState>,
}

impl InMemoryCanvas {
    /// Creates an empty canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CanvasState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of nodes currently on the canvas.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state().nodes.len()
    }

    /// Returns the spec of a live node.
    #[must_use]
    pub fn node(&self, handle: HostHandle) -> Option<NodeSpec> {
        self.state().nodes.get(&handle).cloned()
    }

    /// Snapshot of the wires on the canvas.
    #[must_use]
    pub fn wires(&self) -> Vec<Wire> {
        self.state().wires.clone()
    }

    /// Number of re-evaluations requested so far.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.state().evaluations
    }
}

impl HostAdapter for InMemoryCanvas {
    fn create_node(&self, spec: &NodeSpec) -> Result<Option<HostHandle>, HostError> {
        let mut state = self.state();
        state.next_handle += 1;
        let handle = HostHandle::new(state.next_handle);
        state.nodes.insert(handle, spec.clone());
        debug!(
            target: HOST_TARGET,
            %handle,
            kind = spec.kind().canonical_name(),
            "node added to canvas"
        );
        Ok(Some(handle))
    }

    fn remove_node(&self, handle: HostHandle) -> Result<(), HostError> {
        let mut state = self.state();
        if state.nodes.remove(&handle).is_none() {
            return Err(HostError::StaleHandle { handle });
        }
        state
            .wires
            .retain(|wire| wire.source != handle && wire.target != handle);
        debug!(target: HOST_TARGET, %handle, "node removed from canvas");
        Ok(())
    }

    fn connect(
        &self,
        source: HostHandle,
        output: &str,
        target: HostHandle,
        input: &str,
    ) -> Result<bool, HostError> {
        let mut state = self.state();
        let source_kind = state
            .nodes
            .get(&source)
            .map(NodeSpec::kind)
            .ok_or(HostError::StaleHandle { handle: source })?;
        let target_kind = state
            .nodes
            .get(&target)
            .map(NodeSpec::kind)
            .ok_or(HostError::StaleHandle { handle: target })?;

        if !source_kind.has_output(output) || !target_kind.has_input(input) {
            debug!(
                target: HOST_TARGET,
                %source,
                output,
                %target,
                input,
                "wiring rejected: unknown parameter"
            );
            return Ok(false);
        }

        state.wires.push(Wire {
            source,
            output: output.to_owned(),
            target,
            input: input.to_owned(),
        });
        Ok(true)
    }

    fn trigger_reevaluation(&self) -> Result<(), HostError> {
        self.state().evaluations += 1;
        Ok(())
    }
}
