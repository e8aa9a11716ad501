//! Batch execution engine
//!
//! This module handles:
//! - Running single commands with captured output ([`executor`])
//! - Splitting a selection into parallel and serial batches ([`partition`])
//! - Scheduling both batches with halt-on-error and keep-order ([`scheduler`])
//! - Live progress rendering ([`progress`])
//! - Aggregating sinks into the final log ([`aggregate`])

pub mod aggregate;
pub mod executor;
pub mod partition;
pub mod progress;
pub mod scheduler;
pub mod workdir;


pub use aggregate::{
    Aggregator, RunMetadata, RunOutcome, RunReport, RunSummary, INTERRUPTED_EXIT_CODE,
};
pub use executor::Executor;
pub use partition::{partition, split_point, Batches};
pub use progress::{BatchKind, ProgressReporter, RenderConfig};
pub use scheduler::{ScheduleOutcome, Scheduler, SchedulerState};
pub use workdir::{Released, WorkDir};

use crate::core::commands::CommandList;
use crate::core::config::RunConfig;
use crate::core::error::Result;
use std::io::Write;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How a call to [`run_batch`] ended
#[derive(Debug)]
pub enum BatchOutcome {
    /// The selection was printed and nothing was executed
    DryRun,
    Finished(RunReport),
}

impl BatchOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DryRun => 0,
            Self::Finished(report) => report.exit_code(),
        }
    }
}

/// Select, schedule and aggregate one run of `commands`
///
/// Configuration and working-directory problems are returned as errors
/// before any command starts; everything after that point is folded into
/// the returned report.
pub async fn run_batch<W: Write, E: Write>(
    commands: &CommandList,
    source_name: &str,
    config: &RunConfig,
    reporter: &mut ProgressReporter<W, E>,
    cancel: CancellationToken,
) -> Result<BatchOutcome> {
    config.validate()?;
    let selection = commands.select(config.range.as_ref())?;

    reporter.loaded(source_name, &selection);
    let batches = partition(&selection.commands, config.serial_from);
    reporter.plan(&batches, config.jobs);

    if config.dry_run {
        reporter.dry_run(&selection);
        return Ok(BatchOutcome::DryRun);
    }

    let work_dir = WorkDir::create()?;
    reporter.work_dir(work_dir.path());
    info!(
        "Running {} command(s): {} parallel, {} serial, {} job(s)",
        batches.len(),
        batches.parallel.len(),
        batches.serial.len(),
        config.jobs
    );

    let started = Instant::now();
    let executor = Executor::new(work_dir.path(), config.timeout);
    let outcome = Scheduler::new(executor, config, reporter, cancel)
        .run(batches)
        .await;

    let aggregator = Aggregator::new(RunMetadata::new(&selection, config), config);
    let report = aggregator.finalize(outcome, work_dir, started);
    reporter.released(&report.released);
    reporter.summary(&report);

    Ok(BatchOutcome::Finished(report))
}
