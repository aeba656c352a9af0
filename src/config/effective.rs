//! Effective configuration with provenance
//!
//! Captures the merged configuration plus where each layer came from. The
//! printable form redacts secret-looking keys; the in-memory value keeps
//! them because the submit command needs the artifact source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::env::EnvSnapshot;
use super::merge::merge_layers;

/// Schema identifier for the printable form
pub const SCHEMA_ID: &str = "dataflow-launcher/effective_config@1";

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Env,
    Cli,
}

/// A contributing config layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (file layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (file layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged configuration
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object (not redacted)
    pub config: Value,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Keys whose values never leave the process in printable output
const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "private_key",
    "api_key",
    "credential",
    "artifact_source",
];

#[derive(Serialize)]
struct Printable<'a> {
    schema_id: &'static str,
    created_at: &'a DateTime<Utc>,
    config: Value,
    sources: &'a [ConfigSource],
    redactions: Vec<String>,
}

impl EffectiveConfig {
    /// Build the effective config from all layers
    pub fn build(
        config_path: Option<&Path>,
        env: &EnvSnapshot,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // An explicitly named file must exist
        if let Some(path) = config_path {
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(layer) = env.to_layer()? {
            layers.push(layer);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Env,
                path: None,
                digest: None,
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        Ok(Self {
            created_at: Utc::now(),
            config: merge_layers(layers),
            sources,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Copy of the config with secrets replaced, plus the redacted paths
    pub fn redacted(&self) -> (Value, Vec<String>) {
        let mut value = self.config.clone();
        let mut redactions = Vec::new();
        Self::redact_recursive(&mut value, String::new(), &mut redactions);
        (value, redactions)
    }

    fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let current_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));

                    if is_secret && !val.is_object() && !val.is_array() {
                        *val = Value::String("[REDACTED]".to_string());
                        redactions.push(current_path);
                    } else {
                        Self::redact_recursive(val, current_path, redactions);
                    }
                }
            }
            Value::Array(arr) => {
                for (i, val) in arr.iter_mut().enumerate() {
                    Self::redact_recursive(val, format!("{}[{}]", path, i), redactions);
                }
            }
            _ => {}
        }
    }

    /// Printable JSON (secrets redacted)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let (config, redactions) = self.redacted();
        serde_json::to_string_pretty(&Printable {
            schema_id: SCHEMA_ID,
            created_at: &self.created_at,
            config,
            sources: &self.sources,
            redactions,
        })
    }

    /// Get a config value by dot-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    /// Get a non-empty string value
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("missing required configuration: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}
