//! Resolver: find the backend id for a derived job name.
//!
//! The query filters on the exact name and on every known state, so a job
//! that has already finished (or already failed) is still found. When
//! several jobs match, the first in backend order wins.

use std::fmt;
use std::sync::Arc;

use launch_protocol::KNOWN_STATES;

use crate::backend::{JobBackend, SubmitOutcome};
use crate::job::JobHandle;
use crate::summary::ExitCode;

/// No job id could be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNotFound {
    pub job_name: String,
    pub submit_exit_code: i32,
    /// Set when the list query itself failed
    pub query_error: Option<String>,
}

impl fmt::Display for JobNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "job {} not found (submit exit code {})",
            self.job_name, self.submit_exit_code
        )?;
        if let Some(ref e) = self.query_error {
            write!(f, ": {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for JobNotFound {}

impl JobNotFound {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        ExitCode::for_unresolved(self.submit_exit_code)
    }
}

pub struct Resolver {
    backend: Arc<dyn JobBackend>,
}

impl Resolver {
    pub fn new(backend: Arc<dyn JobBackend>) -> Self {
        Self { backend }
    }

    /// Resolve exactly once, whatever the submit outcome was.
    pub fn resolve(&self, job_name: &str, submitted: &SubmitOutcome) -> Result<JobHandle, JobNotFound> {
        let not_found = |query_error: Option<String>| JobNotFound {
            job_name: job_name.to_string(),
            submit_exit_code: submitted.exit_code,
            query_error,
        };

        let ids = self
            .backend
            .list(job_name, &KNOWN_STATES)
            .map_err(|e| {
                tracing::error!(job_name, error = %e, "job list query failed");
                not_found(Some(e.to_string()))
            })?;

        if ids.len() > 1 {
            tracing::warn!(job_name, matches = ids.len(), "several jobs share this name; using the first");
        }

        match ids.into_iter().next() {
            Some(job_id) => {
                tracing::info!(job_name, job_id = %job_id, "resolved job id");
                Ok(JobHandle::new(job_name, job_id))
            }
            None => {
                tracing::error!(job_name, submit_exit_code = submitted.exit_code, "no job found");
                Err(not_found(None))
            }
        }
    }
}
