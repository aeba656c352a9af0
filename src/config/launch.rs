//! Typed, immutable launch configuration extracted from the merged layers.

use serde_json::Value;
use std::time::Duration;

use super::effective::{ConfigError, EffectiveConfig};
use crate::job::parse_extra_args;
use crate::policy::StatePolicy;

/// Required keys as (config path, environment variable).
pub const REQUIRED_KEYS: &[(&str, &str)] = &[
    ("project", "PROJECT_ID"),
    ("region", "REGION"),
    ("environment", "ENVIRONMENT"),
    ("job_name", "JOB_NAME"),
    ("staging_location", "STAGING_LOCATION"),
    ("temp_location", "TEMP_LOCATION"),
    ("artifact_source", "ARTIFACT_SOURCE"),
];

/// Poll loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Fixed delay between samples
    pub interval: Duration,
    /// Give up after this long; `None` relies on the host's task timeout
    pub max_duration: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_duration: None,
        }
    }
}

/// External commands used by the process-backed job backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub submit_command: Vec<String>,
    pub query_program: String,
    pub publish_program: String,
}

/// Everything a launch needs, resolved once at process entry
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub project: String,
    pub region: String,
    pub environment: String,
    pub job_name_base: String,
    pub staging_location: String,
    pub temp_location: String,
    pub artifact_source: String,
    pub extra_args: Vec<String>,
    /// Event sink topic; events are only logged when absent
    pub topic: Option<String>,
    pub poll: PollSettings,
    pub backend: BackendSettings,
    pub policy: StatePolicy,
}

impl LaunchConfig {
    /// Extract and validate. All missing required keys are reported together.
    pub fn from_effective(effective: &EffectiveConfig) -> Result<Self, ConfigError> {
        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|(path, _)| effective.get_str(path).is_none())
            .map(|(_, var)| var.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired(missing));
        }

        let required = |path: &str| -> String {
            effective.get_str(path).unwrap_or_default().trim().to_string()
        };

        let interval_seconds = match effective.get("poll.interval_seconds") {
            None | Some(Value::Null) => 30,
            Some(value) => value.as_u64().ok_or_else(|| {
                ConfigError::ValidationError(
                    "poll.interval_seconds must be a positive whole number".to_string(),
                )
            })?,
        };
        if interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "poll.interval_seconds must be greater than 0".to_string(),
            ));
        }

        let max_duration = match effective.get("poll.max_duration_seconds") {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_u64() {
                Some(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::ValidationError(
                        "poll.max_duration_seconds must be a positive whole number".to_string(),
                    ))
                }
            },
        };

        let submit_command = string_list(effective.get("backend.submit_command"))
            .map_err(|msg| ConfigError::ValidationError(format!("backend.submit_command {}", msg)))?;
        if submit_command.is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.submit_command must not be empty".to_string(),
            ));
        }

        let extra_args = string_list(effective.get("pipeline_args"))
            .map_err(|msg| ConfigError::ValidationError(format!("pipeline_args {}", msg)))?;

        let policy = StatePolicy::from_value(effective.get("policy"))
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        Ok(Self {
            project: required("project"),
            region: required("region"),
            environment: required("environment"),
            job_name_base: required("job_name"),
            staging_location: required("staging_location"),
            temp_location: required("temp_location"),
            artifact_source: required("artifact_source"),
            extra_args,
            topic: effective.get_str("sink.topic").map(|s| s.trim().to_string()),
            poll: PollSettings {
                interval: Duration::from_secs(interval_seconds),
                max_duration,
            },
            backend: BackendSettings {
                submit_command,
                query_program: effective
                    .get_str("backend.query_program")
                    .unwrap_or("gcloud")
                    .to_string(),
                publish_program: effective
                    .get_str("sink.publish_program")
                    .unwrap_or("gcloud")
                    .to_string(),
            },
            policy,
        })
    }
}

/// Accepts an array of strings or one space-delimited string.
fn string_list(value: Option<&Value>) -> Result<Vec<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(parse_extra_args(s)),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "must contain only strings".to_string())
            })
            .collect(),
        Some(_) => Err("must be a string or an array of strings".to_string()),
    }
}
