//! Dataflow launcher
//!
//! Submits a pipeline under a timestamped job name, resolves the backend job
//! id, polls the job to a terminal state, and publishes status events along
//! the way. The process exit code reports the outcome.

pub mod backend;
pub mod clock;
pub mod config;
pub mod job;
pub mod launcher;
pub mod mock;
pub mod observability;
pub mod policy;
pub mod sink;
pub mod summary;

pub use backend::{BackendError, CommandBackend, JobBackend, SubmitOutcome, SubmitSpec};
pub use clock::{Clock, FakeClock, PollDeadline, SystemClock};
pub use config::{ConfigError, EffectiveConfig, EnvSnapshot, LaunchConfig, PollSettings};
pub use job::{JobHandle, JobRequest};
pub use launcher::{JobNotFound, LaunchError, Launcher, PollResult};
pub use policy::StatePolicy;
pub use sink::{EventSink, LogSink, MemorySink, SinkError};
pub use summary::{ExitCode, LaunchReport, LaunchStatus};

pub use launch_protocol::{Disposition, JobState, Phase, StatusEvent};
