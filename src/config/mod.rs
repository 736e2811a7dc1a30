// src/config/mod.rs

//! Configuration: where the hosts, playbooks and copy paths come from.
//!
//! - [`model`] defines the TOML shape and its defaults.
//! - [`validate`] turns a `RawConfig` into a checked `Config`.
//! - [`loader`] reads files and picks the default location.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{AnsibleSection, Config, CopySection, RawConfig, RunnerSection, VagrantSection};
