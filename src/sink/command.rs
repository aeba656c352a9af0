//! Pub/sub sink driven by the publish CLI

use std::process::{Command, Stdio};

use launch_protocol::StatusEvent;

use super::{EventSink, SinkError};

/// Publishes each event with `<program> pubsub topics publish <topic>`.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    topic: String,
    project: String,
}

impl CommandSink {
    pub fn new(program: impl Into<String>, topic: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            topic: topic.into(),
            project: project.into(),
        }
    }

    /// Argv for one publish
    pub fn publish_args(&self, event: &StatusEvent) -> Result<Vec<String>, SinkError> {
        let attributes = event
            .attributes()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(",");

        Ok(vec![
            "pubsub".to_string(),
            "topics".to_string(),
            "publish".to_string(),
            self.topic.clone(),
            format!("--project={}", self.project),
            format!("--message={}", event.to_json()?),
            format!("--attribute={}", attributes),
        ])
    }
}

impl EventSink for CommandSink {
    fn publish(&self, event: &StatusEvent) -> Result<(), SinkError> {
        let args = self.publish_args(event)?;
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| SinkError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SinkError::Rejected {
                code: output.status.code().unwrap_or(1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
