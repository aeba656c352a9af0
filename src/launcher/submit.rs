//! Submitter: launch the pipeline under the derived job name.

use std::sync::Arc;

use crate::backend::{JobBackend, SubmitOutcome, SubmitSpec};
use crate::config::LaunchConfig;
use crate::job::JobRequest;

/// Exit code recorded when the submit command could not run at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

pub struct Submitter {
    backend: Arc<dyn JobBackend>,
    project: String,
    region: String,
    staging_location: String,
    temp_location: String,
}

impl Submitter {
    pub fn new(backend: Arc<dyn JobBackend>, config: &LaunchConfig) -> Self {
        Self {
            backend,
            project: config.project.clone(),
            region: config.region.clone(),
            staging_location: config.staging_location.clone(),
            temp_location: config.temp_location.clone(),
        }
    }

    pub fn spec_for(&self, request: &JobRequest) -> SubmitSpec {
        SubmitSpec {
            project: self.project.clone(),
            region: self.region.clone(),
            staging_location: self.staging_location.clone(),
            temp_location: self.temp_location.clone(),
            job_name: request.job_name(),
            extra_args: request.extra_args.clone(),
        }
    }

    /// Submit once. Never fails: a non-zero or missing exit is returned in
    /// the outcome, because the backend may still have accepted the job.
    pub fn submit(&self, request: &JobRequest) -> SubmitOutcome {
        let spec = self.spec_for(request);
        tracing::info!(job_name = %spec.job_name, args = spec.extra_args.len(), "submitting job");

        match self.backend.submit(&spec) {
            Ok(outcome) => {
                if outcome.succeeded() {
                    tracing::info!(job_name = %spec.job_name, "submit call returned 0");
                } else {
                    tracing::warn!(
                        job_name = %spec.job_name,
                        exit_code = outcome.exit_code,
                        "submit call failed; checking whether the job was accepted anyway"
                    );
                }
                tracing::debug!(job_name = %spec.job_name, log = %outcome.log, "submit output");
                outcome
            }
            Err(e) => {
                tracing::warn!(job_name = %spec.job_name, error = %e, "submit call could not run");
                SubmitOutcome::new(SPAWN_FAILURE_EXIT_CODE, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EffectiveConfig, EnvSnapshot};
    use crate::mock::MockBackend;
    use chrono::{TimeZone, Utc};

    fn config() -> LaunchConfig {
        let env = EnvSnapshot::from_pairs([
            ("PROJECT_ID", "proj"),
            ("REGION", "us-central1"),
            ("ENVIRONMENT", "dev"),
            ("JOB_NAME", "ingest"),
            ("STAGING_LOCATION", "gs://b/staging"),
            ("TEMP_LOCATION", "gs://b/temp"),
            ("ARTIFACT_SOURCE", "gs://b/pipeline.jar"),
        ]);
        let effective = EffectiveConfig::build(None, &env, None).unwrap();
        LaunchConfig::from_effective(&effective).unwrap()
    }

    fn request(config: &LaunchConfig) -> JobRequest {
        JobRequest::from_config(config, Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
    }

    #[test]
    fn test_submit_keeps_exit_code_and_log() {
        let config = config();
        let backend = Arc::new(
            MockBackend::new()
                .with_submit_exit_code(1)
                .with_submit_log("Submitted job: 2024-05-06_07_08_09-42\nERROR: timed out waiting"),
        );
        let submitter = Submitter::new(backend.clone(), &config);

        let outcome = submitter.submit(&request(&config));

        assert_eq!(outcome.exit_code, 1);
        assert!(!outcome.succeeded());
        assert!(outcome.log.contains("2024-05-06_07_08_09-42"));
        assert_eq!(backend.submitted()[0].job_name, "dev-ingest-20240506-070809");
    }

    #[test]
    fn test_spawn_error_becomes_outcome() {
        let config = config();
        let backend = Arc::new(MockBackend::new().with_submit_error("java: not found"));
        let submitter = Submitter::new(backend, &config);

        let outcome = submitter.submit(&request(&config));

        assert_eq!(outcome.exit_code, SPAWN_FAILURE_EXIT_CODE);
        assert!(outcome.log.contains("java: not found"));
    }
}
