// src/exec/runner.rs

//! Supervised execution of a single external command.

use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::net::unix::pipe;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{ProvisionError, Result};

use super::command::CommandSpec;
use super::pipe_logger::{LineSink, PipeLogger, TracingSink};
use super::signals::{OsSignals, SignalSource};

/// How long a child gets to exit after a forwarded signal before its whole
/// process group is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(20);

/// Pid and process-group id of a started command. The child is started as
/// its own group leader, so both are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub pgid: u32,
}

/// What happened during a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub handle: ProcessHandle,
    pub status: ExitStatus,
    /// Signal forwarded to the process group, if the operator interrupted.
    pub forwarded: Option<Signal>,
    /// Whether the grace period ran out and the group was SIGKILLed.
    pub force_killed: bool,
    /// Number of output lines logged.
    pub lines: usize,
}

type Waiter = JoinHandle<io::Result<ExitStatus>>;

/// Runs one command at a time, streaming its output and tying its lifetime
/// to the termination signals this program receives.
///
/// ```no_run
/// # async fn demo() -> provisioner::errors::Result<()> {
/// use provisioner::exec::{CommandSpec, SupervisedRunner};
///
/// let runner = SupervisedRunner::new();
/// runner.run(&CommandSpec::new("vagrant").args(["up", "vm01"])).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SupervisedRunner {
    grace_period: Duration,
    signals: Arc<dyn SignalSource>,
    sink: Arc<dyn LineSink>,
}

impl Default for SupervisedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SupervisedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisedRunner")
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}

impl SupervisedRunner {
    /// OS signals, tracing output, 20 second grace period.
    pub fn new() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            signals: Arc::new(OsSignals),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_signal_source(mut self, signals: Arc<dyn SignalSource>) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Run `spec` to completion.
    ///
    /// Returns only after the child has been reaped and all of its output
    /// has been handed to the sink. A termination signal received meanwhile
    /// is forwarded to the child's process group; if the group is still
    /// alive after the grace period it is killed with SIGKILL.
    pub async fn run(&self, spec: &CommandSpec) -> Result<RunReport> {
        info!(command = %spec, "run command");

        // Subscribe before spawning so an early Ctrl-C is forwarded instead
        // of taking down this process with the child still running.
        let mut subscription = self.signals.subscribe().map_err(ProvisionError::Signals)?;

        let (reader, writer) = io::pipe().map_err(ProvisionError::Pipe)?;
        let stderr_writer = writer.try_clone().map_err(ProvisionError::Pipe)?;
        let receiver =
            pipe::Receiver::from_owned_fd(OwnedFd::from(reader)).map_err(ProvisionError::Pipe)?;

        let mut cmd = spec.to_command();
        cmd.process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::from(writer))
            .stderr(Stdio::from(stderr_writer));
        let spawned = cmd.spawn();
        // `cmd` still owns our copies of the write end; the logger only sees
        // EOF once they are closed.
        drop(cmd);

        let mut child = spawned.map_err(|source| ProvisionError::Spawn {
            command: spec.clone(),
            source,
        })?;

        let Some(pid) = child.id() else {
            let source = io::Error::other("child exited before its pid was read");
            let _ = child.wait().await;
            return Err(ProvisionError::Wait {
                command: spec.clone(),
                source,
            });
        };
        let handle = ProcessHandle { pid, pgid: pid };
        debug!(program = spec.program(), pid, "process started in its own group");

        let (closed_tx, closed_rx) = watch::channel(false);
        let logger = PipeLogger::new(spec.program(), pid, Arc::clone(&self.sink));
        let logger_task = tokio::spawn(logger.stream(receiver, closed_rx));

        let mut waiter: Waiter = tokio::spawn(async move {
            let status = child.wait().await;
            let _ = closed_tx.send(true);
            status
        });

        let mut forwarded = None;
        let mut force_killed = false;

        let joined = tokio::select! {
            joined = &mut waiter => joined,
            Some(sig) = subscription.recv() => {
                forwarded = Some(sig);
                let (joined, killed) = self.escalate(spec, handle, sig, &mut waiter).await;
                force_killed = killed;
                joined
            }
        };
        drop(subscription);

        let lines = match logger_task.await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(program = spec.program(), pid, error = %e, "output logger task failed");
                0
            }
        };

        let status = joined
            .map_err(io::Error::other)
            .and_then(|status| status)
            .map_err(|source| ProvisionError::Wait {
                command: spec.clone(),
                source,
            })?;

        info!(
            program = spec.program(),
            pid,
            exit_code = status.code(),
            signal = status.signal(),
            success = status.success(),
            "process exited"
        );

        if status.success() {
            Ok(RunReport {
                handle,
                status,
                forwarded,
                force_killed,
                lines,
            })
        } else {
            Err(ProvisionError::Exit {
                command: spec.clone(),
                pid,
                status,
            })
        }
    }

    /// Forward `sig` to the group, wait out the grace period, then SIGKILL.
    ///
    /// Always returns the waiter's result, i.e. only once the child is reaped.
    async fn escalate(
        &self,
        spec: &CommandSpec,
        handle: ProcessHandle,
        sig: Signal,
        waiter: &mut Waiter,
    ) -> (std::result::Result<io::Result<ExitStatus>, tokio::task::JoinError>, bool) {
        let group = Pid::from_raw(handle.pgid as i32);

        info!(signal = sig.as_str(), pgid = handle.pgid, program = spec.program(), "forwarding signal to process group");
        if let Err(e) = killpg(group, sig) {
            warn!(signal = sig.as_str(), pgid = handle.pgid, error = %e, "failed to forward signal");
        }

        match timeout(self.grace_period, &mut *waiter).await {
            Ok(joined) => {
                info!(pid = handle.pid, "process exited after forwarded signal");
                (joined, false)
            }
            Err(_) => {
                warn!(
                    pgid = handle.pgid,
                    grace_period = ?self.grace_period,
                    "grace period elapsed; killing process group"
                );
                if let Err(e) = killpg(group, Signal::SIGKILL) {
                    warn!(pgid = handle.pgid, error = %e, "failed to kill process group");
                }
                // Reaping still has to be confirmed before returning.
                ((&mut *waiter).await, true)
            }
        }
    }
}
