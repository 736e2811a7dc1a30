// src/workflow/vagrant.rs

//! VM manager stages.

use std::path::Path;

use tracing::{debug, info};

use crate::config::VagrantSection;
use crate::errors::{ProvisionError, Result};
use crate::exec::{CommandRunner, CommandSpec};
use crate::pipeline::Pipeline;

/// One `vagrant up <host>` per host, in list order.
///
/// Starting several machines in a single `vagrant up` fails now and then,
/// so every host gets its own stage.
pub fn up_stages(hosts: &[String]) -> Vec<CommandSpec> {
    hosts
        .iter()
        .map(|host| CommandSpec::new("vagrant").arg("up").arg(host.as_str()))
        .collect()
}

pub fn destroy_stage() -> CommandSpec {
    CommandSpec::new("vagrant").args(["destroy", "--force", "--graceful"])
}

/// `vagrant ssh-config` redirected into `path` through the shell.
pub fn ssh_config_stage(path: &Path) -> CommandSpec {
    CommandSpec::new("bash")
        .arg("-c")
        .arg(format!("vagrant ssh-config > {}", path.display()))
}

pub async fn vagrant_up<R>(runner: &R, vagrant: &VagrantSection) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    Pipeline::new("vagrant-up", up_stages(&vagrant.hosts))
        .run(runner)
        .await?;
    Ok(())
}

pub async fn vagrant_destroy<R>(runner: &R) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    Pipeline::new("vagrant-destroy", vec![destroy_stage()])
        .run(runner)
        .await?;
    Ok(())
}

/// Write the ssh config and make sure it exists before anything uses it.
pub async fn write_ssh_config<R>(runner: &R, vagrant: &VagrantSection) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    Pipeline::new("ssh-config", vec![ssh_config_stage(&vagrant.ssh_config)])
        .run(runner)
        .await?;

    if !runner.spawns_processes() {
        debug!(path = %vagrant.ssh_config.display(), "dry-run: skipping ssh config check");
        return Ok(());
    }
    if !vagrant.ssh_config.is_file() {
        return Err(ProvisionError::MissingFile(vagrant.ssh_config.clone()));
    }

    info!(path = %vagrant.ssh_config.display(), "ssh config written");
    Ok(())
}
