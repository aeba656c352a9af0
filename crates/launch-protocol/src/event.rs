//! Status events published to the event sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attributes;
use crate::state::JobState;

/// Lifecycle phase an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Job id resolved; emitted once before the first poll.
    Submitted,
    /// One state sample.
    Poll,
    /// Terminal state reached; emitted once.
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Submitted => "submitted",
            Phase::Poll => "poll",
            Phase::Finished => "finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status notification. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub environment: String,
    pub job_name: String,
    pub job_id: String,
    pub phase: Phase,
    pub state: JobState,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<serde_json::Value>,
}

impl StatusEvent {
    /// Build an event stamped with the current time.
    pub fn new(
        environment: impl Into<String>,
        job_name: impl Into<String>,
        job_id: impl Into<String>,
        phase: Phase,
        state: JobState,
    ) -> Self {
        Self {
            environment: environment.into(),
            job_name: job_name.into(),
            job_id: job_id.into(),
            phase,
            state,
            timestamp: Utc::now(),
            message: None,
        }
    }

    /// Attach a structured message.
    pub fn with_message(mut self, message: serde_json::Value) -> Self {
        self.message = Some(message);
        self
    }

    /// Routing attributes in publish order.
    pub fn attributes(&self) -> [(&'static str, &str); 3] {
        [
            (attributes::ENVIRONMENT, self.environment.as_str()),
            (attributes::STATE, self.state.name()),
            (attributes::JOB_NAME, self.job_name.as_str()),
        ]
    }

    /// Compact JSON body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
