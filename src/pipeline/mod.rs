// src/pipeline/mod.rs

//! Fail-fast sequential pipeline of external commands.
//!
//! Stages run strictly one after another: a stage starts only after the
//! previous one has been reaped and its output fully logged. The first
//! failing stage ends the pipeline and its error is returned unchanged.
//!
//! Stages never run in parallel. The VM manager is known to fail
//! intermittently when too many machines are started at once.

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::{CommandRunner, CommandSpec, RunReport};

/// Named, ordered list of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    name: String,
    stages: Vec<CommandSpec>,
}

/// Reports of every stage of a fully successful pipeline, in run order.
#[derive(Debug, Default, Clone)]
pub struct PipelineReport {
    pub stages: Vec<RunReport>,
}

impl PipelineReport {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>, stages: Vec<CommandSpec>) -> Self {
        Self {
            name: name.into(),
            stages,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[CommandSpec] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn run<R>(&self, runner: &R) -> Result<PipelineReport>
    where
        R: CommandRunner + ?Sized,
    {
        run_stages(&self.name, runner, &self.stages).await
    }
}

/// Run `stages` in order through `runner`, stopping at the first failure.
pub async fn run_pipeline<R>(runner: &R, stages: &[CommandSpec]) -> Result<PipelineReport>
where
    R: CommandRunner + ?Sized,
{
    run_stages("pipeline", runner, stages).await
}

async fn run_stages<R>(name: &str, runner: &R, stages: &[CommandSpec]) -> Result<PipelineReport>
where
    R: CommandRunner + ?Sized,
{
    let total = stages.len();
    if total == 0 {
        debug!(pipeline = name, "no stages; nothing to run");
        return Ok(PipelineReport::default());
    }

    info!(pipeline = name, total, "pipeline started");
    let mut report = PipelineReport {
        stages: Vec::with_capacity(total),
    };

    for (idx, stage) in stages.iter().enumerate() {
        debug!(pipeline = name, stage = idx + 1, total, command = %stage, "starting stage");
        match runner.execute(stage).await {
            Ok(stage_report) => report.stages.push(stage_report),
            Err(err) => {
                warn!(
                    pipeline = name,
                    stage = idx + 1,
                    total,
                    error = %err,
                    "stage failed; aborting pipeline"
                );
                return Err(err);
            }
        }
    }

    info!(pipeline = name, total, "pipeline finished");
    Ok(report)
}
