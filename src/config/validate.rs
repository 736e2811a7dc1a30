// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{Config, CopySection, RawConfig};
use crate::errors::{ProvisionError, Result};

impl TryFrom<RawConfig> for Config {
    type Error = ProvisionError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let copy = expand_copy_roots(raw.copy)?;
        Ok(Config::new_unchecked(
            raw.runner.grace_period.into(),
            raw.vagrant,
            raw.ansible,
            copy,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_runner(cfg)?;
    validate_vagrant(cfg)?;
    validate_ansible(cfg)?;
    validate_copy(cfg)?;
    Ok(())
}

fn validate_runner(cfg: &RawConfig) -> Result<()> {
    if cfg.runner.grace_period.0.is_zero() {
        return Err(ProvisionError::ConfigError(
            "[runner].grace_period must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_vagrant(cfg: &RawConfig) -> Result<()> {
    if let Some(idx) = cfg.vagrant.hosts.iter().position(|h| h.trim().is_empty()) {
        return Err(ProvisionError::ConfigError(format!(
            "[vagrant].hosts[{idx}] is empty"
        )));
    }
    if cfg.vagrant.ssh_config.as_os_str().is_empty() {
        return Err(ProvisionError::ConfigError(
            "[vagrant].ssh_config must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_ansible(cfg: &RawConfig) -> Result<()> {
    match cfg.ansible.command.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(ProvisionError::ConfigError(
            "[ansible].command must name a program".to_string(),
        )),
    }
}

fn validate_copy(cfg: &RawConfig) -> Result<()> {
    for (key, paths) in [("clean", &cfg.copy.clean), ("paths", &cfg.copy.paths)] {
        for path in paths {
            if !is_plain_relative(path) {
                return Err(ProvisionError::ConfigError(format!(
                    "[copy].{key} entry '{}' must be a relative path without '..'",
                    path.display()
                )));
            }
        }
    }
    Ok(())
}

fn is_plain_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn expand_copy_roots(mut copy: CopySection) -> Result<CopySection> {
    copy.src_root = expand_home(&copy.src_root)?;
    copy.dest_root = expand_home(&copy.dest_root)?;
    Ok(copy)
}

/// Expand a leading `~` against `$HOME`. Other paths are returned as-is.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = std::env::var_os("HOME").ok_or_else(|| {
        ProvisionError::ConfigError("failed to get user home directory: $HOME is not set".to_string())
    })?;
    Ok(PathBuf::from(home).join(rest))
}
