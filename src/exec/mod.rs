// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] holds the immutable [`CommandSpec`] descriptor.
//! - [`pipe_logger`] turns a child's combined output into log lines.
//! - [`signals`] provides scoped subscriptions to SIGHUP/SIGINT/SIGTERM.
//! - [`runner`] runs one command under supervision: own process group,
//!   streamed output, signal forwarding with grace period and forced kill.
//! - [`backend`] provides the `CommandRunner` trait used by pipelines, with
//!   the real runner and a dry-run implementation.

pub mod backend;
pub mod command;
pub mod pipe_logger;
pub mod runner;
pub mod signals;

pub use backend::{CommandRunner, DryRunRunner};
pub use command::CommandSpec;
pub use pipe_logger::{LineSink, OutputLine, PipeLogger, TracingSink};
pub use runner::{ProcessHandle, RunReport, SupervisedRunner, DEFAULT_GRACE_PERIOD};
pub use signals::{OsSignals, SignalSource, Subscription};
