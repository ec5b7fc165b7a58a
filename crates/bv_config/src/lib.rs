//! Parsing of `bv.toml` project descriptors and entry-point specification
//! strings (`name(args...)`).
//!
//! This is ambient plumbing for whatever external driver embeds
//! `bv_elaborate` (a CLI, a build tool, …): the elaborator itself never reads
//! a file or a configuration value. Trimmed to the handful of fields a BV
//! project needs — no device targets, pins, or constraints, since BV has no
//! physical-device concept.

#![warn(missing_docs)]

pub mod entry_point;
pub mod error;
pub mod loader;
pub mod types;

pub use entry_point::{parse_entry_point, ConfigArg};
pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::ProjectConfig;
