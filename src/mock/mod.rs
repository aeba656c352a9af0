//! In-process test doubles
//!
//! [`MockBackend`] scripts submit/list/describe answers and records every
//! call, so the full launch lifecycle runs without any external process.

mod backend;

pub use backend::{BackendCall, MockBackend};
