//! Recording sink

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use launch_protocol::StatusEvent;

use super::{EventSink, SinkError};

/// Keeps every published event in memory. Can be switched into a failing
/// mode to exercise sink outages.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StatusEvent>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every publish
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successfully published events, in order
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Publish attempts, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &StatusEvent) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("memory sink set to fail".to_string()));
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }
}
