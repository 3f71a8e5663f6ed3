//! Test helpers for the transport module.

use std::io::{self, Read};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use super::{AcceptObserver, Cancellation, ConnectionHandler, ConnectionStream};

pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: ConnectionStream, _cancellation: &Cancellation) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reads until the peer or the listener closes the socket.
pub(crate) struct HoldingHandler {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl HoldingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<Self>) {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            started: Arc::clone(&started),
            finished: Arc::clone(&finished),
        });
        (started, finished, handler)
    }
}

impl ConnectionHandler for HoldingHandler {
    fn handle(&self, stream: ConnectionStream, _cancellation: &Cancellation) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut sink = Vec::new();
        let mut socket = stream.tcp();
        let _ = socket.read_to_end(&mut sink);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct RecordingObserver {
    errors: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("observer lock").clone()
    }
}

impl AcceptObserver for RecordingObserver {
    fn accept_failed(&self, error: &io::Error) {
        self.errors
            .lock()
            .expect("observer lock")
            .push(error.to_string());
    }
}
