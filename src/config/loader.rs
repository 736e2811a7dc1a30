// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{Config, RawConfig};
use crate::errors::Result;

/// Load a configuration file and return the raw `RawConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = load_from_path(&path)?;
    let config = Config::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a CLI invocation.
///
/// - An explicitly given path must exist.
/// - Without one, [`default_config_path`] is used if present, otherwise the
///   built-in defaults apply.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return load_and_validate(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(path = %path.display(), "loading default config file");
        load_and_validate(path)
    } else {
        debug!("no config file found; using built-in defaults");
        Config::try_from(RawConfig::default())
    }
}

/// `Provisioner.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Provisioner.toml")
}
