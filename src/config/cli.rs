//! Command-line layer (highest precedence)

use serde_json::{json, Map, Value};

/// Flags given to `launch-job run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub interval_seconds: Option<u64>,
    pub max_duration_seconds: Option<u64>,
    pub topic: Option<String>,
    /// Trailing args; replace `PIPELINE_ARGS` when non-empty
    pub pipeline_args: Vec<String>,
}

impl CliOverrides {
    /// Returns `None` when no flag was given.
    pub fn to_layer(&self) -> Option<Value> {
        let mut poll = Map::new();
        if let Some(secs) = self.interval_seconds {
            poll.insert("interval_seconds".into(), json!(secs));
        }
        if let Some(secs) = self.max_duration_seconds {
            poll.insert("max_duration_seconds".into(), json!(secs));
        }

        let mut root = Map::new();
        if !poll.is_empty() {
            root.insert("poll".into(), Value::Object(poll));
        }
        if let Some(ref topic) = self.topic {
            root.insert("sink".into(), json!({ "topic": topic }));
        }
        if !self.pipeline_args.is_empty() {
            root.insert("pipeline_args".into(), json!(self.pipeline_args));
        }

        (!root.is_empty()).then_some(Value::Object(root))
    }
}
