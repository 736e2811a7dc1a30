// src/workflow/copy.rs

//! Sync a fixed set of paths from one checkout into another.
//!
//! Runs as two pipelines: first the configured `clean` paths are removed
//! from the destination, then every path is synced with `rsync -a`. In
//! between, every source is checked to exist and destination parent
//! directories are created (after the removal, so they are not deleted
//! again).

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::CopySection;
use crate::errors::{ProvisionError, Result};
use crate::exec::{CommandRunner, CommandSpec};
use crate::pipeline::Pipeline;

/// One source/destination pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTarget {
    pub src: PathBuf,
    pub dest: PathBuf,
}

pub fn copy_targets(copy: &CopySection) -> Vec<CopyTarget> {
    copy.paths
        .iter()
        .map(|rel| CopyTarget {
            src: copy.src_root.join(rel),
            dest: copy.dest_root.join(rel),
        })
        .collect()
}

/// `rm -rfv` for every configured clean path under `dest_root`.
pub fn clean_stages(copy: &CopySection) -> Vec<CommandSpec> {
    copy.clean
        .iter()
        .map(|rel| {
            CommandSpec::new("rm")
                .arg("-rfv")
                .arg(copy.dest_root.join(rel).display().to_string())
        })
        .collect()
}

/// Check every source, optionally create destination parents, and build the
/// `rsync` stages.
///
/// Directory sources get a trailing `/` so rsync copies their contents into
/// `dest` instead of creating `dest/<name>`.
pub fn sync_stages(targets: &[CopyTarget], create_parents: bool) -> Result<Vec<CommandSpec>> {
    let mut stages = Vec::with_capacity(targets.len());

    for target in targets {
        let meta = fs::metadata(&target.src).map_err(|source| ProvisionError::SourceMissing {
            path: target.src.clone(),
            source,
        })?;

        if create_parents {
            if let Some(parent) = target.dest.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut src = target.src.display().to_string();
        if meta.is_dir() && !src.ends_with('/') {
            src.push('/');
        }

        debug!(src = %src, dest = %target.dest.display(), "copy target");
        stages.push(
            CommandSpec::new("rsync")
                .arg("-a")
                .arg(src)
                .arg(target.dest.display().to_string()),
        );
    }

    Ok(stages)
}

pub async fn copy_tree<R>(runner: &R, copy: &CopySection) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    info!(
        src_root = %copy.src_root.display(),
        dest_root = %copy.dest_root.display(),
        paths = copy.paths.len(),
        "copying configuration tree"
    );

    Pipeline::new("copy-clean", clean_stages(copy))
        .run(runner)
        .await?;

    let targets = copy_targets(copy);
    let stages = sync_stages(&targets, runner.spawns_processes())?;

    Pipeline::new("copy-sync", stages).run(runner).await?;
    Ok(())
}
