//! Launch report (launch_summary.json)

use chrono::{DateTime, Utc};
use launch_protocol::JobState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use super::outcome::{ExitCode, LaunchStatus};

pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

pub const SUMMARY_SCHEMA_ID: &str = "dataflow-launcher/launch_summary@1";

/// What happened during one launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReport {
    pub schema_version: u32,
    pub schema_id: String,
    pub created_at: DateTime<Utc>,

    /// Empty when the launch never got far enough to derive one
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_name: String,

    /// Resolved backend id, if resolution succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    /// Last observed state, if polling started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_state: Option<JobState>,

    pub status: LaunchStatus,
    pub exit_code: i32,

    /// Exit code of the submit call
    pub submit_exit_code: i32,

    /// Number of describe samples taken
    pub polls: u32,

    /// Polling stopped because the max duration passed
    #[serde(default)]
    pub timed_out: bool,

    pub events_published: usize,
    pub events_failed: usize,

    pub duration_ms: u64,

    pub human_summary: String,
}

impl LaunchReport {
    /// Report for a launch that stopped at configuration
    pub fn misconfigured(error: &str) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            schema_id: SUMMARY_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            job_name: String::new(),
            job_id: None,
            final_state: None,
            status: LaunchStatus::Misconfigured,
            exit_code: ExitCode::Config.as_i32(),
            submit_exit_code: 0,
            polls: 0,
            timed_out: false,
            events_published: 0,
            events_failed: 0,
            duration_ms: 0,
            human_summary: format!("not launched: {}", error),
        }
    }

    /// Report for a launch whose job id never resolved
    pub fn not_found(job_name: String, submit_exit_code: i32, exit_code: i32, duration_ms: u64) -> Self {
        let human_summary = format!(
            "no job named {} found (submit exited {})",
            job_name, submit_exit_code
        );
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            schema_id: SUMMARY_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            job_name,
            job_id: None,
            final_state: None,
            status: LaunchStatus::NotFound,
            exit_code,
            submit_exit_code,
            polls: 0,
            timed_out: false,
            events_published: 0,
            events_failed: 0,
            duration_ms,
            human_summary,
        }
    }

    /// Report for a launch that was polled to an end
    #[allow(clippy::too_many_arguments)]
    pub fn polled(
        job_name: String,
        job_id: String,
        final_state: JobState,
        status: LaunchStatus,
        exit_code: i32,
        submit_exit_code: i32,
        polls: u32,
        timed_out: bool,
        duration_ms: u64,
    ) -> Self {
        let human_summary = if timed_out {
            format!(
                "{} ({}) still {} after {} polls; max duration exceeded",
                job_name, job_id, final_state, polls
            )
        } else {
            format!(
                "{} ({}) finished {} after {} polls: {}",
                job_name,
                job_id,
                final_state,
                polls,
                if status.is_success() { "success" } else { "failure" }
            )
        };
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            schema_id: SUMMARY_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            job_name,
            job_id: Some(job_id),
            final_state: Some(final_state),
            status,
            exit_code,
            submit_exit_code,
            polls,
            timed_out,
            events_published: 0,
            events_failed: 0,
            duration_ms,
            human_summary,
        }
    }

    /// Record event delivery counts
    pub fn with_event_counts(mut self, published: usize, failed: usize) -> Self {
        self.events_published = published;
        self.events_failed = failed;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }
}
