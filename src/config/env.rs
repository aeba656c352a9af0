//! Environment snapshot (layer 3)
//!
//! Environment variables are read exactly once, at process entry, into an
//! [`EnvSnapshot`]. Nothing downstream touches `std::env`.

use serde_json::Value;
use std::collections::BTreeMap;

use super::effective::ConfigError;
use super::merge::set_path;
use crate::job::parse_extra_args;

/// Variable naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "LAUNCHER_CONFIG";

/// How an environment value is converted into the config tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    Text,
    Seconds,
    /// Space-delimited list
    Args,
}

/// Environment variable → config path bindings.
pub const ENV_BINDINGS: &[(&str, &str, EnvKind)] = &[
    ("PROJECT_ID", "project", EnvKind::Text),
    ("REGION", "region", EnvKind::Text),
    ("ENVIRONMENT", "environment", EnvKind::Text),
    ("JOB_NAME", "job_name", EnvKind::Text),
    ("STAGING_LOCATION", "staging_location", EnvKind::Text),
    ("TEMP_LOCATION", "temp_location", EnvKind::Text),
    ("ARTIFACT_SOURCE", "artifact_source", EnvKind::Text),
    ("PIPELINE_ARGS", "pipeline_args", EnvKind::Args),
    ("PUBSUB_TOPIC", "sink.topic", EnvKind::Text),
    ("POLL_INTERVAL_SECONDS", "poll.interval_seconds", EnvKind::Seconds),
    ("MAX_DURATION_SECONDS", "poll.max_duration_seconds", EnvKind::Seconds),
];

/// Immutable copy of the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a snapshot from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of a variable; empty values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Convert the bound variables into a config layer.
    ///
    /// Returns `None` when no bound variable is set.
    pub fn to_layer(&self) -> Result<Option<Value>, ConfigError> {
        let mut layer = Value::Object(serde_json::Map::new());
        let mut any = false;

        for (name, path, kind) in ENV_BINDINGS {
            let raw = match self.get(name) {
                Some(raw) => raw,
                None => continue,
            };
            let value = match kind {
                EnvKind::Text => Value::String(raw.trim().to_string()),
                EnvKind::Seconds => {
                    let secs: u64 = raw.trim().parse().map_err(|_| {
                        ConfigError::ValidationError(format!(
                            "{} must be a whole number of seconds, got '{}'",
                            name, raw
                        ))
                    })?;
                    Value::from(secs)
                }
                EnvKind::Args => Value::Array(
                    parse_extra_args(raw).into_iter().map(Value::String).collect(),
                ),
            };
            set_path(&mut layer, path, value);
            any = true;
        }

        Ok(any.then_some(layer))
    }
}
