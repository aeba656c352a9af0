//! Job backend seam
//!
//! The launcher talks to the batch backend through [`JobBackend`]:
//! - `submit`: launch the pipeline under a derived job name
//! - `list`: find job ids by exact name among an allow-list of states
//! - `describe`: current state of one job id
//!
//! [`CommandBackend`] shells out to the configured CLIs for production.
//! `crate::mock::MockBackend` scripts the same calls in-process for tests.

mod command;

pub use command::CommandBackend;

use launch_protocol::JobState;
use serde::{Deserialize, Serialize};
use std::io;

/// Everything the submit call needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitSpec {
    pub project: String,
    pub region: String,
    pub staging_location: String,
    pub temp_location: String,
    pub job_name: String,
    /// Appended verbatim after the standard parameters
    pub extra_args: Vec<String>,
}

impl SubmitSpec {
    /// Standard parameters followed by the extra args.
    pub fn pipeline_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--project={}", self.project),
            format!("--region={}", self.region),
            format!("--stagingLocation={}", self.staging_location),
            format!("--tempLocation={}", self.temp_location),
            format!("--jobName={}", self.job_name),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Raw result of the submit call.
///
/// A non-zero exit code is not an error: the backend may have accepted the
/// job even though its client reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub exit_code: i32,
    /// Captured stdout followed by stderr
    pub log: String,
}

impl SubmitOutcome {
    pub fn new(exit_code: i32, log: impl Into<String>) -> Self {
        Self {
            exit_code,
            log: log.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Backend call errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("backend error: {0}")]
    Other(String),
}

/// Job backend operations. Every call blocks until the backend answers.
pub trait JobBackend: Send + Sync {
    /// Launch the pipeline.
    fn submit(&self, spec: &SubmitSpec) -> Result<SubmitOutcome, BackendError>;

    /// Ids of jobs named exactly `job_name` whose state is in `states`, in
    /// the backend's own order.
    fn list(&self, job_name: &str, states: &[JobState]) -> Result<Vec<String>, BackendError>;

    /// Current state of a job; empty reports come back as `Unknown`.
    fn describe(&self, job_id: &str) -> Result<JobState, BackendError>;
}
