//! Launch outcome and summary
//!
//! Stable exit codes plus the `launch_summary.json` report written at the
//! end of a run.

mod outcome;
mod report;

pub use outcome::{ExitCode, LaunchStatus};
pub use report::{LaunchReport, SUMMARY_SCHEMA_ID, SUMMARY_SCHEMA_VERSION};
