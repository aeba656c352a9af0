//! Logging setup.
//!
//! Structured `tracing` output on stderr so stdout carries only command
//! output. `RUST_LOG` controls levels (default `info`).

use std::io;
use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Selects the log format
pub const LOG_FORMAT_VAR: &str = "LAUNCHER_LOG_FORMAT";

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines
    Json,
    /// Human-readable single lines
    #[default]
    Text,
}

impl LogFormat {
    /// `json` (any case) selects JSON; anything else is text.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Initializes the logging subsystem. Later calls are no-ops.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(io::stderr))
                    .init();
            }
            LogFormat::Text => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_target(false).with_writer(io::stderr))
                    .init();
            }
        }
    });
}

/// Span for one CLI command.
#[must_use]
pub fn command_span(command: &str, environment: &str) -> Span {
    tracing::info_span!("launch_job", command = command, environment = environment)
}
