//! `launch-job` CLI
//!
//! Entry point for submitting a pipeline and following it to completion.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use dataflow_launcher::config::{CliOverrides, CONFIG_PATH_VAR};
use dataflow_launcher::observability::{self, LogFormat, LOG_FORMAT_VAR};
use dataflow_launcher::sink::sink_for;
use dataflow_launcher::{
    CommandBackend, EffectiveConfig, EnvSnapshot, ExitCode, JobBackend, JobRequest, LaunchConfig,
    LaunchError, LaunchReport, Launcher, SystemClock,
};
use launch_protocol::KNOWN_STATES;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "launch-job")]
#[command(about = "Submit a pipeline job and follow it to a terminal state", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit, resolve and poll one job
    Run {
        /// Path to a TOML config file (default: $LAUNCHER_CONFIG)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Seconds between status polls
        #[arg(long)]
        interval: Option<u64>,

        /// Give up polling after this many seconds
        #[arg(long)]
        max_duration: Option<u64>,

        /// Topic for status events
        #[arg(long)]
        topic: Option<String>,

        /// Write launch_summary.json to this path
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Print the launch report as JSON
        #[arg(long)]
        json: bool,

        /// Extra pipeline arguments (after --); replaces PIPELINE_ARGS
        #[arg(last = true)]
        pipeline_args: Vec<String>,
    },

    /// Show the current state of a job
    Status {
        /// Backend job id
        job_id: String,

        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// List job ids matching a job name
    Jobs {
        /// Full job name
        name: String,

        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let env = EnvSnapshot::capture();
    observability::init_logging(LogFormat::from_setting(env.get(LOG_FORMAT_VAR)));

    let code = match cli.command {
        Commands::Run {
            config,
            interval,
            max_duration,
            topic,
            summary,
            json,
            pipeline_args,
        } => {
            let overrides = CliOverrides {
                interval_seconds: interval,
                max_duration_seconds: max_duration,
                topic,
                pipeline_args,
            };
            run_launch(&env, config, overrides.to_layer(), summary.as_deref(), json)
        }
        Commands::Status { job_id, config, json } => run_status(&env, config, &job_id, json),
        Commands::Jobs { name, config, json } => run_jobs(&env, config, &name, json),
        Commands::Config { config, json } => run_config(&env, config, json),
    };

    process::exit(code);
}

fn config_path(env: &EnvSnapshot, flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| env.get(CONFIG_PATH_VAR).map(PathBuf::from))
}

fn load(
    env: &EnvSnapshot,
    flag: Option<PathBuf>,
    overrides: Option<Value>,
) -> Result<(EffectiveConfig, LaunchConfig), LaunchError> {
    let path = config_path(env, flag);
    let effective = EffectiveConfig::build(path.as_deref(), env, overrides)?;
    let config = LaunchConfig::from_effective(&effective)?;
    Ok((effective, config))
}

fn fail(e: &LaunchError) -> i32 {
    tracing::error!(error = %e, "launch-job failed");
    eprintln!("Error: {}", e);
    e.exit_code()
}

fn run_launch(
    env: &EnvSnapshot,
    flag: Option<PathBuf>,
    overrides: Option<Value>,
    summary_path: Option<&Path>,
    json_output: bool,
) -> i32 {
    let config = match load(env, flag, overrides) {
        Ok((_, config)) => config,
        Err(e) => {
            if let Some(path) = summary_path {
                write_summary(&LaunchReport::misconfigured(&e.to_string()), path);
            }
            return fail(&e);
        }
    };
    let span = observability::command_span("run", &config.environment);
    let _guard = span.enter();

    let backend: Arc<dyn JobBackend> = Arc::new(CommandBackend::from_config(&config));
    let launcher = Launcher::new(&config, backend, sink_for(&config), Arc::new(SystemClock));
    let request = JobRequest::from_config(&config, Utc::now());

    let report = launcher.run(&request);

    if let Some(path) = summary_path {
        write_summary(&report, path);
    }

    if json_output {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => return fail(&LaunchError::from(e)),
        }
    } else {
        println!("{}", report.human_summary);
    }

    report.exit_code
}

fn write_summary(report: &LaunchReport, path: &Path) {
    if let Err(e) = report.write_to_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not write launch summary");
    }
}

fn run_status(env: &EnvSnapshot, flag: Option<PathBuf>, job_id: &str, json_output: bool) -> i32 {
    let config = match load(env, flag, None) {
        Ok((_, config)) => config,
        Err(e) => return fail(&e),
    };
    let backend = CommandBackend::from_config(&config);

    let state = match backend.describe(job_id) {
        Ok(state) => state,
        Err(e) => return fail(&LaunchError::from(e)),
    };
    let disposition = config.policy.disposition(&state);

    if json_output {
        let out = json!({
            "job_id": job_id,
            "state": state,
            "disposition": disposition.as_str(),
            "terminal": disposition.is_terminal(),
        });
        println!("{}", out);
    } else {
        println!("{}  {}  ({})", job_id, state, disposition);
    }
    ExitCode::Success.as_i32()
}

fn run_jobs(env: &EnvSnapshot, flag: Option<PathBuf>, name: &str, json_output: bool) -> i32 {
    let config = match load(env, flag, None) {
        Ok((_, config)) => config,
        Err(e) => return fail(&e),
    };
    let backend = CommandBackend::from_config(&config);

    let ids = match backend.list(name, &KNOWN_STATES) {
        Ok(ids) => ids,
        Err(e) => return fail(&LaunchError::from(e)),
    };

    if json_output {
        println!("{}", json!({ "job_name": name, "job_ids": ids }));
    } else if ids.is_empty() {
        println!("No jobs named {}", name);
    } else {
        for id in &ids {
            println!("{}", id);
        }
    }

    if ids.is_empty() {
        ExitCode::Failure.as_i32()
    } else {
        ExitCode::Success.as_i32()
    }
}

fn run_config(env: &EnvSnapshot, flag: Option<PathBuf>, json_output: bool) -> i32 {
    let path = config_path(env, flag);
    let effective = match EffectiveConfig::build(path.as_deref(), env, None) {
        Ok(effective) => effective,
        Err(e) => return fail(&LaunchError::from(e)),
    };

    let printed = if json_output {
        effective.to_json()
    } else {
        for source in &effective.sources {
            let origin = format!("{:?}", source.origin).to_lowercase();
            match (&source.path, &source.digest) {
                (Some(path), Some(digest)) => println!("# {} {} sha256:{}", origin, path, digest),
                _ => println!("# {}", origin),
            }
        }
        serde_json::to_string_pretty(&effective.redacted().0)
    };
    match printed {
        Ok(text) => println!("{}", text),
        Err(e) => return fail(&LaunchError::from(e)),
    }

    match LaunchConfig::from_effective(&effective) {
        Ok(_) => ExitCode::Success.as_i32(),
        Err(e) => fail(&LaunchError::from(e)),
    }
}
