//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Seconds between state samples (default: 30)
    pub poll_interval_seconds: u64,

    /// Command that launches the pipeline; standard parameters and extra
    /// args are appended to it
    pub submit_command: Vec<String>,

    /// CLI used for list/describe queries (default: "gcloud")
    pub query_program: String,

    /// CLI used to publish status events (default: "gcloud")
    pub publish_program: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
            submit_command: vec![
                "java".to_string(),
                "-jar".to_string(),
                "pipeline.jar".to_string(),
                "--runner=DataflowRunner".to_string(),
            ],
            query_program: "gcloud".to_string(),
            publish_program: "gcloud".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "poll": {
                "interval_seconds": self.poll_interval_seconds
            },
            "backend": {
                "submit_command": self.submit_command,
                "query_program": self.query_program
            },
            "sink": {
                "publish_program": self.publish_program
            },
            "policy": {}
        })
    }
}
