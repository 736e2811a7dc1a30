// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod types;
pub mod workflow;

use std::time::Duration;

use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, Config};
use crate::errors::{ProvisionError, Result};
use crate::exec::{CommandRunner, CommandSpec, DryRunRunner, SupervisedRunner};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the runner (supervised, or dry-run)
/// - the workflow selected on the command line
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let grace_period: Duration = args
        .grace_period
        .map(Duration::from)
        .unwrap_or(cfg.grace_period);
    debug!(?grace_period, dry_run = args.dry_run, "configuration resolved");

    if args.dry_run {
        info!("dry-run: commands are logged, not executed");
        dispatch(&DryRunRunner, &cfg, &args.command).await
    } else {
        let runner = SupervisedRunner::new().with_grace_period(grace_period);
        dispatch(&runner, &cfg, &args.command).await
    }
}

/// Run the workflow for `command` through `runner`.
pub async fn dispatch<R>(runner: &R, cfg: &Config, command: &Command) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    match command {
        Command::Copy => workflow::copy_tree(runner, &cfg.copy).await,
        Command::VagrantUp => workflow::vagrant_up(runner, &cfg.vagrant).await,
        Command::VagrantDestroy => workflow::vagrant_destroy(runner).await,
        Command::SetupVagrantK8s => workflow::setup_vagrant_k8s(runner, cfg).await,
        Command::Exec { command } => {
            let (program, args) = command.split_first().ok_or_else(|| {
                ProvisionError::ConfigError("exec needs a program to run".to_string())
            })?;
            let spec = CommandSpec::new(program.as_str()).args(args.iter().map(String::as_str));
            runner.execute(&spec).await?;
            Ok(())
        }
    }
}
