//! Job launcher: Submitter → Resolver → Poller
//!
//! Strictly sequential and blocking. The submit outcome never stops the
//! run by itself; only a failed resolution does, and then the submit exit
//! code becomes the process exit code.

mod events;
mod poll;
mod resolve;
mod submit;

pub use events::EventEmitter;
pub use poll::{PollResult, Poller};
pub use resolve::{JobNotFound, Resolver};
pub use submit::{Submitter, SPAWN_FAILURE_EXIT_CODE};

use std::sync::Arc;

use launch_protocol::{Disposition, JobState, Phase};

use crate::backend::{BackendError, JobBackend};
use crate::clock::Clock;
use crate::config::{ConfigError, LaunchConfig};
use crate::job::JobRequest;
use crate::sink::EventSink;
use crate::summary::{ExitCode, LaunchReport, LaunchStatus};

/// Errors surfaced to the CLI
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    NotFound(#[from] JobNotFound),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LaunchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::Config(_) => ExitCode::Config.as_i32(),
            LaunchError::NotFound(e) => e.exit_code(),
            _ => ExitCode::Failure.as_i32(),
        }
    }
}

/// Wires the three stages to one backend, sink and clock
pub struct Launcher {
    environment: String,
    sink: Arc<dyn EventSink>,
    submitter: Submitter,
    resolver: Resolver,
    poller: Poller,
    clock: Arc<dyn Clock>,
}

impl Launcher {
    pub fn new(
        config: &LaunchConfig,
        backend: Arc<dyn JobBackend>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            environment: config.environment.clone(),
            submitter: Submitter::new(backend.clone(), config),
            resolver: Resolver::new(backend.clone()),
            poller: Poller::new(
                backend,
                clock.clone(),
                config.poll,
                config.policy.clone(),
            ),
            sink,
            clock,
        }
    }

    /// Run the whole lifecycle once.
    pub fn run(&self, request: &JobRequest) -> LaunchReport {
        let started = self.clock.now();
        let job_name = request.job_name();
        let span = tracing::info_span!("launch", job_name = %job_name, environment = %self.environment);
        let _guard = span.enter();

        let submitted = self.submitter.submit(request);

        let handle = match self.resolver.resolve(&job_name, &submitted) {
            Ok(handle) => handle,
            Err(not_found) => {
                let elapsed = self.clock.now().saturating_duration_since(started);
                return LaunchReport::not_found(
                    job_name,
                    submitted.exit_code,
                    not_found.exit_code(),
                    elapsed.as_millis() as u64,
                );
            }
        };

        let events = EventEmitter::new(self.sink.clone(), self.environment.clone());
        events.emit(&handle, Phase::Submitted, JobState::Unknown, None);

        let result = self.poller.poll(&handle, &events);

        let (status, exit_code) = match result.disposition {
            Disposition::Success => (LaunchStatus::Success, ExitCode::Success),
            _ => (LaunchStatus::Failed, ExitCode::Failure),
        };
        let elapsed = self.clock.now().saturating_duration_since(started);

        tracing::info!(
            job_id = handle.job_id(),
            state = %result.final_state,
            polls = result.polls,
            exit_code = exit_code.as_i32(),
            "launch finished"
        );

        LaunchReport::polled(
            job_name,
            handle.job_id().to_string(),
            result.final_state,
            status,
            exit_code.as_i32(),
            submitted.exit_code,
            result.polls,
            result.timed_out,
            elapsed.as_millis() as u64,
        )
        .with_event_counts(events.published(), events.failed())
    }
}
