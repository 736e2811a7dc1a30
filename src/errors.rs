// src/errors.rs

//! Crate-wide error type.
//!
//! Every variant that concerns an external command carries the
//! [`CommandSpec`] so the operator can see which stage failed without
//! re-running the whole workflow.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::exec::CommandSpec;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: CommandSpec,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} (pid {pid}) exited unsuccessfully: {status}")]
    Exit {
        command: CommandSpec,
        pid: u32,
        status: ExitStatus,
    },

    #[error("failed to wait for {command}: {source}")]
    Wait {
        command: CommandSpec,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output pipe: {0}")]
    Pipe(#[source] std::io::Error),

    #[error("failed to subscribe to termination signals: {0}")]
    Signals(#[source] std::io::Error),

    #[error("expected file was not generated: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("copy source {}: {source}", path.display())]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProvisionError {
    /// The command this error is about, if it concerns one.
    pub fn command(&self) -> Option<&CommandSpec> {
        match self {
            ProvisionError::Spawn { command, .. }
            | ProvisionError::Exit { command, .. }
            | ProvisionError::Wait { command, .. } => Some(command),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProvisionError>;
