//! Layered launcher configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config` / `LAUNCHER_CONFIG`)
//! 3. Environment snapshot (captured once at process entry)
//! 4. CLI flags
//!
//! The merged value is turned into an immutable [`LaunchConfig`] that is
//! passed explicitly to every component.

mod cli;
mod defaults;
mod effective;
mod env;
mod launch;
mod merge;

pub use cli::CliOverrides;
pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use env::{EnvKind, EnvSnapshot, CONFIG_PATH_VAR, ENV_BINDINGS};
pub use launch::{BackendSettings, LaunchConfig, PollSettings, REQUIRED_KEYS};
pub use merge::{deep_merge, merge_layers};
