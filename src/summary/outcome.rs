//! Launch status and stable exit codes

use serde::{Deserialize, Serialize};

/// Overall result of one launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStatus {
    /// Job reached a success state
    Success,
    /// Job reached a failure state, or the max duration passed
    Failed,
    /// No job id could be resolved for the derived name
    NotFound,
    /// Required configuration missing or invalid
    Misconfigured,
}

impl LaunchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, LaunchStatus::Success)
    }
}

/// Stable exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Terminal success
    Success = 0,
    /// Terminal failure or unresolved job id
    Failure = 1,
    /// Missing required configuration
    Config = 2,
}

impl ExitCode {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Exit code for a job that could not be resolved: the submit call's
    /// own code when it failed, otherwise a plain failure.
    pub fn for_unresolved(submit_exit_code: i32) -> i32 {
        if submit_exit_code != 0 {
            submit_exit_code
        } else {
            ExitCode::Failure.as_i32()
        }
    }
}
