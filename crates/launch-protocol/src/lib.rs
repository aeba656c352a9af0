//! Launch Protocol Types
//!
//! Shared vocabulary between the launcher, its job backend and the event
//! sink: backend job states, what a state means for the poll loop, and the
//! status events published along the way.

pub mod event;
pub mod state;

pub use event::{Phase, StatusEvent};
pub use state::{Disposition, InvalidDisposition, JobState, KNOWN_STATES};

/// Routing attribute names attached to every published event.
pub mod attributes {
    pub const ENVIRONMENT: &str = "environment";
    pub const STATE: &str = "state";
    pub const JOB_NAME: &str = "jobName";
}
