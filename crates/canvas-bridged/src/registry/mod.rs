//! Identifier registry for host objects created through the bridge.
//!
//! The [`ObjectRegistry`] maps bridge-issued identifiers to [`HostHandle`]s.
//! It is shared by every connection and outlives listener restarts, so
//! clients can refer to components created on an earlier connection.
//!
//! Every operation runs inside one critical section of a single mutex, which
//! makes inserts, lookups, and drains linearizable with respect to each
//! other. An insert racing a drain lands either wholly before it (and is
//! drained) or wholly after it (and survives).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::host::HostHandle;

/// Bridge-generated identifier for a registered host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ComponentId(Uuid);

impl ComponentId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for ComponentId {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| RegistryError::not_found(value))
    }
}

/// Errors reported by registry lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No live entry exists for the identifier.
    #[error("no component registered as '{identifier}'")]
    NotFound {
        /// Identifier supplied by the caller.
        identifier: String,
    },
}

impl RegistryError {
    fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }
}

/// Concurrency-safe map from identifiers to host handles.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: Mutex<HashMap<ComponentId, HostHandle>>,
}

impl ObjectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while the lock is held cannot leave the map half-updated, so a
    // poisoned lock is safe to keep using.
    fn entries(&self) -> MutexGuard<'_, HashMap<ComponentId, HostHandle>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `handle` under a freshly generated identifier.
    pub fn insert(&self, handle: HostHandle) -> ComponentId {
        let mut entries = self.entries();
        let mut id = ComponentId::generate();
        while entries.contains_key(&id) {
            id = ComponentId::generate();
        }
        entries.insert(id, handle);
        id
    }

    /// Resolves an identifier supplied by a client.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the identifier is malformed or
    /// has no live entry.
    pub fn lookup(&self, identifier: &str) -> Result<HostHandle, RegistryError> {
        let id = identifier.parse::<ComponentId>()?;
        self.entries()
            .get(&id)
            .copied()
            .ok_or_else(|| RegistryError::not_found(identifier))
    }

    /// Atomically empties the registry, returning every handle it held.
    pub fn remove_all(&self) -> Vec<HostHandle> {
        self.entries().drain().map(|(_, handle)| handle).collect()
    }

    /// Whether `identifier` currently resolves.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.lookup(identifier).is_ok()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests;
