// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::HumanDuration;

/// Command-line arguments for `provisioner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "provisioner",
    version,
    about = "Bring up a vagrant + ansible kubernetes cluster, one supervised command at a time.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Provisioner.toml` in the current working directory if it
    /// exists, built-in defaults otherwise.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROVISIONER_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log the commands that would run, but don't run any of them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Time a command gets to exit after a forwarded signal (e.g. `20s`)
    /// before its process group is killed. Overrides the config file.
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_grace_period)]
    pub grace_period: Option<HumanDuration>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Copy the configured files from the source checkout.
    Copy,

    /// `vagrant up` every host, one at a time.
    VagrantUp,

    /// Remove the vagrant VMs (`vagrant destroy --force --graceful`).
    #[command(name = "vagrant-rm", alias = "vagrant-destroy")]
    VagrantDestroy,

    /// Set up kubernetes: VMs, ssh config, then every playbook.
    SetupVagrantK8s,

    /// Run a single command under supervision.
    Exec {
        /// Program followed by its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_grace_period(s: &str) -> Result<HumanDuration, String> {
    let grace: HumanDuration = s.parse()?;
    if grace.0.is_zero() {
        return Err("grace period must be greater than zero".to_string());
    }
    Ok(grace)
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_exec_with_hyphenated_args() {
        let args = CliArgs::try_parse_from(["provisioner", "exec", "ls", "-la", "/tmp"]).unwrap();
        match args.command {
            Command::Exec { command } => assert_eq!(command, vec!["ls", "-la", "/tmp"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "provisioner",
            "setup-vagrant-k8s",
            "--dry-run",
            "--grace-period",
            "5s",
        ])
        .unwrap();
        assert!(args.dry_run);
        assert_eq!(args.grace_period, Some(HumanDuration(Duration::from_secs(5))));
        assert!(matches!(args.command, Command::SetupVagrantK8s));
    }

    #[test]
    fn vagrant_rm_has_destroy_alias() {
        for name in ["vagrant-rm", "vagrant-destroy"] {
            let args = CliArgs::try_parse_from(["provisioner", name]).unwrap();
            assert!(matches!(args.command, Command::VagrantDestroy));
        }
    }

    #[test]
    fn zero_grace_period_is_rejected() {
        for zero in ["0s", "0ms", "0h"] {
            let err = CliArgs::try_parse_from(["provisioner", "--grace-period", zero, "vagrant-up"])
                .unwrap_err();
            assert!(err.to_string().contains("greater than zero"), "{err}");
        }
        assert!(
            CliArgs::try_parse_from(["provisioner", "--grace-period", "soon", "vagrant-up"]).is_err()
        );
    }

    #[test]
    fn exec_requires_a_program() {
        assert!(CliArgs::try_parse_from(["provisioner", "exec"]).is_err());
    }
}
