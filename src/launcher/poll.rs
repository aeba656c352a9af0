//! Poller: sample job state at a fixed interval until a terminal state.
//!
//! Every sample publishes a `poll` event. A terminal state publishes one
//! `finished` event and stops the loop. Describe failures count as an
//! `Unknown` sample and never end the loop on their own.

use std::sync::Arc;

use launch_protocol::{Disposition, JobState, Phase};
use serde_json::json;

use super::events::EventEmitter;
use crate::backend::JobBackend;
use crate::clock::{Clock, PollDeadline};
use crate::config::PollSettings;
use crate::job::JobHandle;
use crate::policy::StatePolicy;

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    /// Last observed state
    pub final_state: JobState,
    /// `Failure` when the max duration passed before a terminal state
    pub disposition: Disposition,
    /// Number of describe samples
    pub polls: u32,
    pub timed_out: bool,
}

pub struct Poller {
    backend: Arc<dyn JobBackend>,
    clock: Arc<dyn Clock>,
    settings: PollSettings,
    policy: StatePolicy,
}

impl Poller {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        clock: Arc<dyn Clock>,
        settings: PollSettings,
        policy: StatePolicy,
    ) -> Self {
        Self {
            backend,
            clock,
            settings,
            policy,
        }
    }

    /// One sample; query failures read as `Unknown`.
    fn sample(&self, handle: &JobHandle) -> JobState {
        match self.backend.describe(handle.job_id()) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(job_id = handle.job_id(), error = %e, "describe failed; treating state as Unknown");
                JobState::Unknown
            }
        }
    }

    /// Poll until the policy calls a state terminal or the max duration
    /// passes. Unbounded when no max duration is configured.
    pub fn poll(&self, handle: &JobHandle, events: &EventEmitter) -> PollResult {
        let clock = self.clock.as_ref();
        let deadline = PollDeadline::start(clock, self.settings.max_duration);
        let mut previous: Option<JobState> = None;
        let mut polls: u32 = 0;

        loop {
            let state = self.sample(handle);
            polls += 1;

            if previous.as_ref() != Some(&state) {
                tracing::info!(
                    job_name = handle.job_name(),
                    job_id = handle.job_id(),
                    state = %state,
                    from = previous.as_ref().map(|s| s.name()).unwrap_or("-"),
                    "job state"
                );
            }
            events.emit(handle, Phase::Poll, state.clone(), None);

            let disposition = self.policy.disposition(&state);
            if disposition.is_terminal() {
                events.emit(
                    handle,
                    Phase::Finished,
                    state.clone(),
                    Some(json!({
                        "disposition": disposition.as_str(),
                        "polls": polls,
                    })),
                );
                return PollResult {
                    final_state: state,
                    disposition,
                    polls,
                    timed_out: false,
                };
            }

            if deadline.is_expired(clock) {
                let elapsed = deadline.elapsed(clock).as_secs();
                tracing::error!(
                    job_id = handle.job_id(),
                    state = %state,
                    elapsed_seconds = elapsed,
                    "max duration exceeded before a terminal state"
                );
                events.emit(
                    handle,
                    Phase::Finished,
                    state.clone(),
                    Some(json!({
                        "disposition": Disposition::Failure.as_str(),
                        "reason": "max_duration_exceeded",
                        "elapsed_seconds": elapsed,
                        "polls": polls,
                    })),
                );
                return PollResult {
                    final_state: state,
                    disposition: Disposition::Failure,
                    polls,
                    timed_out: true,
                };
            }

            previous = Some(state);
            let pause = match deadline.remaining(clock) {
                Some(left) => left.min(self.settings.interval),
                None => self.settings.interval,
            };
            self.clock.sleep(pause);
        }
    }
}
