//! Job request and handle
//!
//! A [`JobRequest`] is built once per invocation. Its derived job name
//! embeds a UTC timestamp with seconds granularity, so every launch
//! attempt gets a fresh, sortable name and a rerun never collides with the
//! previous attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LaunchConfig;

/// Timestamp layout used in job names (lexically sortable).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One launch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub environment: String,
    pub job_name_base: String,
    /// Formatted with [`TIMESTAMP_FORMAT`]
    pub timestamp: String,
    /// Forwarded verbatim after the standard parameters
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl JobRequest {
    pub fn new(
        environment: impl Into<String>,
        job_name_base: impl Into<String>,
        extra_args: Vec<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            environment: environment.into(),
            job_name_base: job_name_base.into(),
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            extra_args,
        }
    }

    /// Request for the configured job, stamped at `at`.
    pub fn from_config(config: &LaunchConfig, at: DateTime<Utc>) -> Self {
        Self::new(
            config.environment.clone(),
            config.job_name_base.clone(),
            config.extra_args.clone(),
            at,
        )
    }

    /// `{environment}-{jobNameBase}-{timestamp}`
    pub fn job_name(&self) -> String {
        format!("{}-{}-{}", self.environment, self.job_name_base, self.timestamp)
    }
}

/// A submitted job whose backend id has been resolved. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    job_name: String,
    job_id: String,
}

impl JobHandle {
    pub(crate) fn new(job_name: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            job_id: job_id.into(),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

/// Split a space-delimited argument string, dropping empty pieces.
pub fn parse_extra_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}
