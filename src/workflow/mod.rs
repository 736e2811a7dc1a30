// src/workflow/mod.rs

//! Provisioning workflows built on the pipeline.
//!
//! Each workflow turns part of the [`Config`] into ordered command lists and
//! chains pipelines with `?`, so the fail-fast rule holds across pipelines
//! as well as within one.

pub mod ansible;
pub mod copy;
pub mod vagrant;

use tracing::info;

use crate::config::Config;
use crate::errors::Result;
use crate::exec::CommandRunner;

pub use ansible::{playbook_stages, run_playbooks};
pub use copy::{clean_stages, copy_targets, copy_tree, sync_stages, CopyTarget};
pub use vagrant::{destroy_stage, ssh_config_stage, up_stages, vagrant_destroy, vagrant_up, write_ssh_config};

/// Bring up every VM, write the ssh config, then apply every playbook.
pub async fn setup_vagrant_k8s<R>(runner: &R, cfg: &Config) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    vagrant_up(runner, &cfg.vagrant).await?;
    write_ssh_config(runner, &cfg.vagrant).await?;
    run_playbooks(runner, &cfg.ansible, &cfg.vagrant.ssh_config).await?;

    info!("cluster setup finished");
    Ok(())
}
