//! Scripted job backend

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use launch_protocol::JobState;

use crate::backend::{BackendError, JobBackend, SubmitOutcome, SubmitSpec};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Submit(SubmitSpec),
    List { job_name: String, states: Vec<JobState> },
    Describe(String),
}

/// A scripted describe answer
#[derive(Debug, Clone)]
enum Report {
    State(JobState),
    Error(String),
}

#[derive(Debug, Default)]
struct MockState {
    submit_exit_code: i32,
    submit_log: String,
    submit_error: Option<String>,
    listed_ids: Vec<String>,
    list_error: Option<String>,
    /// Per job id; the last answer repeats once the queue drains
    progressions: HashMap<String, VecDeque<Report>>,
    last_report: HashMap<String, Report>,
    calls: Vec<BackendCall>,
}

/// Configurable backend for tests
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Submit succeeds, list finds nothing, describe reports Unknown.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Exit code returned by submit
    pub fn with_submit_exit_code(self, code: i32) -> Self {
        self.lock().submit_exit_code = code;
        self
    }

    /// Log text returned by submit
    pub fn with_submit_log(self, log: impl Into<String>) -> Self {
        self.lock().submit_log = log.into();
        self
    }

    /// Make submit fail before reaching the backend
    pub fn with_submit_error(self, message: impl Into<String>) -> Self {
        self.lock().submit_error = Some(message.into());
        self
    }

    /// Ids returned by list, in order
    pub fn with_listed_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().listed_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Make list fail
    pub fn with_list_error(self, message: impl Into<String>) -> Self {
        self.lock().list_error = Some(message.into());
        self
    }

    /// Queue raw state reports for a job id, one per describe call
    pub fn with_states(self, job_id: &str, states: &[&str]) -> Self {
        {
            let mut state = self.lock();
            let queue = state.progressions.entry(job_id.to_string()).or_default();
            queue.extend(states.iter().map(|raw| Report::State(JobState::parse(raw))));
        }
        self
    }

    /// Queue one failing describe call for a job id
    pub fn with_describe_error(self, job_id: &str, message: impl Into<String>) -> Self {
        {
            let mut state = self.lock();
            let queue = state.progressions.entry(job_id.to_string()).or_default();
            queue.push_back(Report::Error(message.into()));
        }
        self
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn describe_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Describe(_)))
            .count()
    }

    /// Specs passed to submit
    pub fn submitted(&self) -> Vec<SubmitSpec> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Submit(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect()
    }
}

impl JobBackend for MockBackend {
    fn submit(&self, spec: &SubmitSpec) -> Result<SubmitOutcome, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Submit(spec.clone()));
        if let Some(message) = &state.submit_error {
            return Err(BackendError::Other(message.clone()));
        }
        Ok(SubmitOutcome::new(state.submit_exit_code, state.submit_log.clone()))
    }

    fn list(&self, job_name: &str, states: &[JobState]) -> Result<Vec<String>, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::List {
            job_name: job_name.to_string(),
            states: states.to_vec(),
        });
        if let Some(message) = &state.list_error {
            return Err(BackendError::Other(message.clone()));
        }
        Ok(state.listed_ids.clone())
    }

    fn describe(&self, job_id: &str) -> Result<JobState, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Describe(job_id.to_string()));

        let next = state
            .progressions
            .get_mut(job_id)
            .and_then(|queue| queue.pop_front());
        let report = match next {
            Some(report) => {
                state.last_report.insert(job_id.to_string(), report.clone());
                report
            }
            None => state
                .last_report
                .get(job_id)
                .cloned()
                .unwrap_or(Report::State(JobState::Unknown)),
        };

        match report {
            Report::State(job_state) => Ok(job_state),
            Report::Error(message) => Err(BackendError::Other(message)),
        }
    }
}
