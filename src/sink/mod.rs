//! Event sink
//!
//! Status events are fire-and-forget. The launcher only ever publishes
//! through [`publish_best_effort`], which logs a failed publish and moves
//! on; a sink outage never changes the outcome of a launch.

mod command;
mod memory;

pub use command::CommandSink;
pub use memory::MemorySink;

use launch_protocol::StatusEvent;
use std::io;
use std::sync::Arc;

use crate::config::LaunchConfig;

/// Sink errors
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("publish rejected ({code}): {stderr}")]
    Rejected { code: i32, stderr: String },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for status events
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &StatusEvent) -> Result<(), SinkError>;
}

/// Writes events to the log instead of an external topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&self, event: &StatusEvent) -> Result<(), SinkError> {
        tracing::info!(
            phase = %event.phase,
            state = %event.state,
            job_name = %event.job_name,
            job_id = %event.job_id,
            environment = %event.environment,
            message = ?event.message,
            "status event"
        );
        Ok(())
    }
}

/// Sink for a launch: the configured topic, or the log when none is set.
pub fn sink_for(config: &LaunchConfig) -> Arc<dyn EventSink> {
    match &config.topic {
        Some(topic) => Arc::new(CommandSink::new(
            config.backend.publish_program.clone(),
            topic.clone(),
            config.project.clone(),
        )),
        None => Arc::new(LogSink),
    }
}

/// Publish, suppressing any failure. Returns whether the publish succeeded.
pub fn publish_best_effort(sink: &dyn EventSink, event: &StatusEvent) -> bool {
    match sink.publish(event) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                phase = %event.phase,
                state = %event.state,
                job_name = %event.job_name,
                error = %e,
                "failed to publish status event"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EffectiveConfig, EnvSnapshot};
    use launch_protocol::{JobState, Phase};
    use serde_json::json;

    fn config_with_sink(sink: serde_json::Value) -> LaunchConfig {
        let env = EnvSnapshot::from_pairs([
            ("PROJECT_ID", "proj"),
            ("REGION", "r"),
            ("ENVIRONMENT", "dev"),
            ("JOB_NAME", "a"),
            ("STAGING_LOCATION", "gs://b/s"),
            ("TEMP_LOCATION", "gs://b/t"),
            ("ARTIFACT_SOURCE", "gs://b/p.jar"),
        ]);
        let effective = EffectiveConfig::build(None, &env, Some(json!({ "sink": sink }))).unwrap();
        LaunchConfig::from_effective(&effective).unwrap()
    }

    #[test]
    fn test_best_effort_swallows_errors() {
        let sink = MemorySink::failing();
        let event = StatusEvent::new("dev", "dev-a-1", "id", Phase::Poll, JobState::Running);
        assert!(!publish_best_effort(&sink, &event));
        assert!(sink.events().is_empty());
        assert_eq!(sink.attempts(), 1);
    }

    #[test]
    fn test_best_effort_success() {
        let sink = MemorySink::new();
        let event = StatusEvent::new("dev", "dev-a-1", "id", Phase::Poll, JobState::Running);
        assert!(publish_best_effort(&sink, &event));
        assert_eq!(sink.events(), vec![event]);
    }

    #[test]
    fn test_topic_selects_command_sink() {
        let config = config_with_sink(json!({
            "topic": "job-status",
            "publish_program": "/nonexistent/launcher-publish",
        }));
        let event = StatusEvent::new("dev", "dev-a-1", "id", Phase::Poll, JobState::Running);

        let err = sink_for(&config).publish(&event).unwrap_err();
        match err {
            SinkError::Spawn { program, .. } => assert_eq!(program, "/nonexistent/launcher-publish"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_topic_selects_log_sink() {
        let config = config_with_sink(json!({ "publish_program": "/nonexistent/launcher-publish" }));
        assert!(config.topic.is_none());
        let event = StatusEvent::new("dev", "dev-a-1", "id", Phase::Poll, JobState::Running);

        assert!(sink_for(&config).publish(&event).is_ok());
    }

    #[test]
    fn test_log_sink_accepts_everything() {
        let event = StatusEvent::new("dev", "dev-a-1", "id", Phase::Finished, JobState::Done);
        assert!(LogSink.publish(&event).is_ok());
    }
}
