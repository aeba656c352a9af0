//! Backend job states.
//!
//! The backend reports states as free-form strings, either plain
//! (`Running`) or prefixed (`JOB_STATE_RUNNING`). Parsing never fails:
//! empty reports become [`JobState::Unknown`] and anything unrecognized is
//! kept verbatim in [`JobState::Other`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix used by the backend's describe output.
const STATE_PREFIX: &str = "JOB_STATE_";

/// Job state as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum JobState {
    /// No state reported (empty output or failed query).
    Unknown,
    Pending,
    Queued,
    Running,
    Draining,
    Cancelling,
    Stopped,
    /// Job completed successfully.
    Done,
    Failed,
    Cancelled,
    /// Job was superseded by an in-place update.
    Updated,
    /// Unrecognized state, raw text preserved.
    Other(String),
}

/// Every named backend state, terminal and non-terminal.
///
/// Used as the allow-list when resolving a job by name so a job is found
/// whatever state it has already reached.
pub const KNOWN_STATES: [JobState; 10] = [
    JobState::Running,
    JobState::Pending,
    JobState::Queued,
    JobState::Draining,
    JobState::Cancelling,
    JobState::Stopped,
    JobState::Done,
    JobState::Failed,
    JobState::Cancelled,
    JobState::Updated,
];

impl JobState {
    /// Parse a backend state report.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return JobState::Unknown;
        }

        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix(STATE_PREFIX).unwrap_or(&upper);

        match bare {
            "UNKNOWN" | "UNSPECIFIED" => JobState::Unknown,
            "PENDING" => JobState::Pending,
            "QUEUED" => JobState::Queued,
            "RUNNING" => JobState::Running,
            "DRAINING" => JobState::Draining,
            "CANCELLING" => JobState::Cancelling,
            "STOPPED" => JobState::Stopped,
            "DONE" => JobState::Done,
            "FAILED" => JobState::Failed,
            "CANCELLED" => JobState::Cancelled,
            "UPDATED" => JobState::Updated,
            _ => JobState::Other(trimmed.to_string()),
        }
    }

    /// Canonical display name (raw text for [`JobState::Other`]).
    pub fn name(&self) -> &str {
        match self {
            JobState::Unknown => "Unknown",
            JobState::Pending => "Pending",
            JobState::Queued => "Queued",
            JobState::Running => "Running",
            JobState::Draining => "Draining",
            JobState::Cancelling => "Cancelling",
            JobState::Stopped => "Stopped",
            JobState::Done => "Done",
            JobState::Failed => "Failed",
            JobState::Cancelled => "Cancelled",
            JobState::Updated => "Updated",
            JobState::Other(raw) => raw,
        }
    }

    /// Whether the stock policy stops polling at this state.
    pub fn is_terminal_by_default(&self) -> bool {
        matches!(
            self,
            JobState::Done | JobState::Failed | JobState::Cancelled | JobState::Updated
        )
    }

    /// What the stock policy does with this state.
    pub fn default_disposition(&self) -> Disposition {
        match self {
            JobState::Done => Disposition::Success,
            JobState::Failed | JobState::Cancelled | JobState::Updated => Disposition::Failure,
            _ => Disposition::Continue,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Other(raw) => raw,
            other => other.name().to_string(),
        }
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        JobState::parse(&raw)
    }
}

/// What the poll loop does after observing a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Non-terminal: sample again after the interval.
    Continue,
    /// Terminal, run succeeded.
    Success,
    /// Terminal, run failed.
    Failure,
}

impl Disposition {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Disposition::Continue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Continue => "continue",
            Disposition::Success => "success",
            Disposition::Failure => "failure",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized disposition string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid disposition '{0}' (expected continue, success or failure)")]
pub struct InvalidDisposition(pub String);

impl FromStr for Disposition {
    type Err = InvalidDisposition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Disposition::Continue),
            "success" => Ok(Disposition::Success),
            "failure" => Ok(Disposition::Failure),
            _ => Err(InvalidDisposition(s.to_string())),
        }
    }
}
