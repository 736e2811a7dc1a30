// src/exec/backend.rs

//! Pluggable command-runner abstraction.
//!
//! Pipelines and workflows talk to a `CommandRunner` instead of the
//! concrete [`SupervisedRunner`]. This keeps the fail-fast sequencing
//! testable with a fake runner and lets `--dry-run` swap in
//! [`DryRunRunner`].

use std::future::Future;
use std::os::unix::process::ExitStatusExt;
use std::pin::Pin;
use std::process::ExitStatus;

use tracing::info;

use crate::errors::Result;

use super::command::CommandSpec;
use super::runner::{ProcessHandle, RunReport, SupervisedRunner};

/// Trait abstracting how a single stage is executed.
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion and report the outcome.
    fn execute<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + Send + 'a>>;

    /// Whether this runner really starts processes. Workflows use it to skip
    /// checks on files a real command would have produced.
    fn spawns_processes(&self) -> bool {
        true
    }
}

impl CommandRunner for SupervisedRunner {
    fn execute<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + Send + 'a>> {
        Box::pin(self.run(spec))
    }
}

/// Logs every command instead of running it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn execute<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + Send + 'a>> {
        Box::pin(async move {
            if spec.get_env().is_empty() {
                info!(command = %spec, "dry-run: would run");
            } else {
                info!(command = %spec, env = ?spec.get_env(), "dry-run: would run");
            }
            Ok(RunReport {
                handle: ProcessHandle { pid: 0, pgid: 0 },
                status: ExitStatus::from_raw(0),
                forwarded: None,
                force_killed: false,
                lines: 0,
            })
        })
    }

    fn spawns_processes(&self) -> bool {
        false
    }
}
