//! Status event emission for one launch

use std::cell::Cell;
use std::sync::Arc;

use launch_protocol::{JobState, Phase, StatusEvent};
use serde_json::Value;

use crate::job::JobHandle;
use crate::sink::{publish_best_effort, EventSink};

/// Builds and publishes events, counting deliveries. Never fails.
pub struct EventEmitter {
    sink: Arc<dyn EventSink>,
    environment: String,
    published: Cell<usize>,
    failed: Cell<usize>,
}

impl EventEmitter {
    pub fn new(sink: Arc<dyn EventSink>, environment: impl Into<String>) -> Self {
        Self {
            sink,
            environment: environment.into(),
            published: Cell::new(0),
            failed: Cell::new(0),
        }
    }

    pub fn emit(&self, handle: &JobHandle, phase: Phase, state: JobState, message: Option<Value>) {
        let mut event = StatusEvent::new(
            self.environment.clone(),
            handle.job_name(),
            handle.job_id(),
            phase,
            state,
        );
        if let Some(message) = message {
            event = event.with_message(message);
        }

        if publish_best_effort(self.sink.as_ref(), &event) {
            self.published.set(self.published.get() + 1);
        } else {
            self.failed.set(self.failed.get() + 1);
        }
    }

    pub fn published(&self) -> usize {
        self.published.get()
    }

    pub fn failed(&self) -> usize {
        self.failed.get()
    }
}
