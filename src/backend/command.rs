//! Process-backed job backend
//!
//! Submit runs the configured pipeline command; list and describe go
//! through the query CLI. Each call spawns a fresh process and blocks on it.

use launch_protocol::JobState;
use std::process::{Command, ExitStatus, Output, Stdio};

use super::{BackendError, JobBackend, SubmitOutcome, SubmitSpec};
use crate::config::{BackendSettings, LaunchConfig};

/// Variable the artifact source is exported under for the submit process.
pub const ARTIFACT_SOURCE_VAR: &str = "ARTIFACT_SOURCE";

/// Production backend driving external CLIs
#[derive(Debug, Clone)]
pub struct CommandBackend {
    project: String,
    region: String,
    artifact_source: String,
    settings: BackendSettings,
}

impl CommandBackend {
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        artifact_source: impl Into<String>,
        settings: BackendSettings,
    ) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
            artifact_source: artifact_source.into(),
            settings,
        }
    }

    pub fn from_config(config: &LaunchConfig) -> Self {
        Self::new(
            config.project.clone(),
            config.region.clone(),
            config.artifact_source.clone(),
            config.backend.clone(),
        )
    }

    /// Program and argv for the submit call
    pub fn submit_argv(&self, spec: &SubmitSpec) -> (String, Vec<String>) {
        let mut command = self.settings.submit_command.clone();
        let program = if command.is_empty() {
            String::new()
        } else {
            command.remove(0)
        };
        command.extend(spec.pipeline_args());
        (program, command)
    }

    /// Argv for the list query
    pub fn list_args(&self, job_name: &str, states: &[JobState]) -> Vec<String> {
        let state_clause = states
            .iter()
            .map(|s| format!("STATE={}", s.name()))
            .collect::<Vec<_>>()
            .join(" OR ");
        let filter = if state_clause.is_empty() {
            format!("name={}", job_name)
        } else {
            format!("name={} AND ({})", job_name, state_clause)
        };

        vec![
            "dataflow".to_string(),
            "jobs".to_string(),
            "list".to_string(),
            format!("--project={}", self.project),
            format!("--region={}", self.region),
            format!("--filter={}", filter),
            "--format=value(JOB_ID)".to_string(),
        ]
    }

    /// Argv for the describe query
    pub fn describe_args(&self, job_id: &str) -> Vec<String> {
        vec![
            "dataflow".to_string(),
            "jobs".to_string(),
            "describe".to_string(),
            job_id.to_string(),
            format!("--project={}", self.project),
            format!("--region={}", self.region),
            "--format=value(currentState)".to_string(),
        ]
    }

    fn query(&self, args: &[String]) -> Result<String, BackendError> {
        let program = &self.settings.query_program;
        let output = run(Command::new(program).args(args), program)?;
        if !output.status.success() {
            return Err(BackendError::CommandFailed {
                program: program.clone(),
                code: exit_code(&output.status),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl JobBackend for CommandBackend {
    fn submit(&self, spec: &SubmitSpec) -> Result<SubmitOutcome, BackendError> {
        let (program, args) = self.submit_argv(spec);
        if program.is_empty() {
            return Err(BackendError::Other("submit command is empty".to_string()));
        }

        let output = run(
            Command::new(&program)
                .args(&args)
                .env(ARTIFACT_SOURCE_VAR, &self.artifact_source),
            &program,
        )?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(SubmitOutcome::new(exit_code(&output.status), log))
    }

    fn list(&self, job_name: &str, states: &[JobState]) -> Result<Vec<String>, BackendError> {
        let stdout = self.query(&self.list_args(job_name, states))?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn describe(&self, job_id: &str) -> Result<JobState, BackendError> {
        let stdout = self.query(&self.describe_args(job_id))?;
        Ok(JobState::parse(&stdout))
    }
}

fn run(command: &mut Command, program: &str) -> Result<Output, BackendError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| BackendError::Spawn {
            program: program.to_string(),
            source,
        })
}

/// Exit code, or 128+signal for a signalled process
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
