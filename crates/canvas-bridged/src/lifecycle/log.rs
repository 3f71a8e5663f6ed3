//! Bounded, shared log of bridge lifecycle messages.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::health::HealthReporter;
use crate::transport::AcceptObserver;

/// Number of entries retained by the bridge log.
pub const LOG_CAPACITY: usize = 100;

/// Ring of the most recent status messages, oldest first.
#[derive(Debug)]
pub struct BridgeLog {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl Default for BridgeLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl BridgeLog {
    /// Creates a log that keeps at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn push(&self, entry: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.into());
    }

    /// Copy of the retained entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.entries().iter().cloned().collect()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the log holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Routes listener accept failures to the bridge log and health reporter.
pub(super) struct LogObserver {
    pub(super) log: Arc<BridgeLog>,
    pub(super) reporter: Arc<dyn HealthReporter>,
}

impl AcceptObserver for LogObserver {
    fn accept_failed(&self, error: &io::Error) {
        self.reporter.accept_failed(error);
        self.log.push(format!("TCP listener error: {error}"));
    }
}
