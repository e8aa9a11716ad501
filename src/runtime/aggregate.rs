//! Final aggregation of a run
//!
//! Sorts the collected results back into index order, concatenates the
//! per-command sinks into the output log, appends the run summary and
//! releases the working directory. Failing to write the log or to remove the
//! directory degrades to a warning: the computed outcome stays valid.

use crate::core::commands::{CommandRange, Selection};
use crate::core::config::RunConfig;
use crate::core::types::ExecutionResult;
use crate::runtime::scheduler::ScheduleOutcome;
use crate::runtime::workdir::{Released, WorkDir};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Process exit code used when a run is cancelled
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

const BANNER_WIDTH: usize = 70;

/// Process-level result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    Success,
    Failure,
    Interrupted,
}

impl RunOutcome {
    /// Interruption wins over any partial results
    pub fn from_results(results: &[ExecutionResult], interrupted: bool) -> Self {
        if interrupted {
            Self::Interrupted
        } else if results.iter().all(ExecutionResult::succeeded) {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Interrupted => INTERRUPTED_EXIT_CODE,
        }
    }
}

/// Aggregate counts for a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_in_file: usize,
    pub selected: usize,
    pub executed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn from_results(
        results: &[ExecutionResult],
        total_in_file: usize,
        selected: usize,
        elapsed: Duration,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.succeeded()).count();
        Self {
            total_in_file,
            selected,
            executed: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            elapsed,
        }
    }
}

/// Facts about the run recorded in the log header
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub total_in_file: usize,
    pub selected: usize,
    pub jobs: usize,
    pub range: Option<CommandRange>,
    pub serial_from: Option<usize>,
}

impl RunMetadata {
    pub fn new(selection: &Selection, config: &RunConfig) -> Self {
        Self {
            total_in_file: selection.total_in_file,
            selected: selection.len(),
            jobs: config.jobs,
            range: selection.range.as_ref().map(|r| r.requested),
            serial_from: config.serial_from,
        }
    }
}

/// Everything known once a run has been finalized
#[derive(Debug)]
pub struct RunReport {
    /// Results sorted by command index
    pub results: Vec<ExecutionResult>,
    pub summary: RunSummary,
    pub outcome: RunOutcome,
    pub halted: bool,
    pub output_path: PathBuf,
    pub log_written: bool,
    pub released: Released,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

pub struct Aggregator {
    metadata: RunMetadata,
    output_path: PathBuf,
    keep_temp: bool,
}

impl Aggregator {
    pub fn new(metadata: RunMetadata, config: &RunConfig) -> Self {
        Self {
            metadata,
            output_path: config.output_path.clone(),
            keep_temp: config.keep_temp,
        }
    }

    /// Sort, write the aggregated log and release the working directory
    pub fn finalize(&self, outcome: ScheduleOutcome, work_dir: WorkDir, started: Instant) -> RunReport {
        let mut results = outcome.results;
        results.sort_by_key(|r| r.index);

        let summary = RunSummary::from_results(
            &results,
            self.metadata.total_in_file,
            self.metadata.selected,
            started.elapsed(),
        );
        let run_outcome = RunOutcome::from_results(&results, outcome.interrupted);

        let log_written = match self.write_log_file(&results, &summary, run_outcome, outcome.halted) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "Error writing log file {}: {}",
                    self.output_path.display(),
                    err
                );
                false
            }
        };

        let released = work_dir.release(self.keep_temp);

        RunReport {
            results,
            summary,
            outcome: run_outcome,
            halted: outcome.halted,
            output_path: self.output_path.clone(),
            log_written,
            released,
        }
    }

    fn write_log_file(
        &self,
        results: &[ExecutionResult],
        summary: &RunSummary,
        outcome: RunOutcome,
        halted: bool,
    ) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.output_path)?);
        self.write_log(&mut out, results, summary, outcome, halted)?;
        out.flush()
    }

    /// Render the aggregated log; `results` must already be index-ordered
    pub fn write_log<W: Write>(
        &self,
        out: &mut W,
        results: &[ExecutionResult],
        summary: &RunSummary,
        outcome: RunOutcome,
        halted: bool,
    ) -> io::Result<()> {
        let banner = "#".repeat(BANNER_WIDTH);

        writeln!(out, "{}", banner)?;
        writeln!(out, "# Parallel Execution Log")?;
        writeln!(
            out,
            "# Generated: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out, "# Total Commands: {}", self.metadata.selected)?;
        writeln!(out, "# Parallel Jobs: {}", self.metadata.jobs)?;
        if let Some(range) = &self.metadata.range {
            writeln!(out, "# Command range: {}", range)?;
        }
        if let Some(position) = self.metadata.serial_from {
            writeln!(out, "# Serial execution from command: {}", position)?;
        }
        writeln!(out, "{}\n", banner)?;

        for result in results {
            match File::open(&result.log_path) {
                Ok(mut sink) => {
                    io::copy(&mut sink, &mut *out)?;
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    debug!("No sink for command #{}", result.number());
                }
                Err(err) => return Err(err),
            }
        }

        writeln!(out, "\n{}", banner)?;
        writeln!(out, "# Execution Summary")?;
        writeln!(out, "{}", banner)?;
        if self.metadata.range.is_some() {
            writeln!(out, "Total commands in file: {}", summary.total_in_file)?;
            writeln!(out, "Commands in range: {}", summary.selected)?;
        } else {
            writeln!(out, "Total commands: {}", summary.selected)?;
        }
        writeln!(out, "Executed: {}", summary.executed)?;
        writeln!(out, "Successful: {}", summary.succeeded)?;
        writeln!(out, "Failed: {}", summary.failed)?;
        writeln!(
            out,
            "Elapsed time: {:.2} seconds",
            summary.elapsed.as_secs_f64()
        )?;
        if outcome == RunOutcome::Interrupted {
            writeln!(out, "Status: INTERRUPTED")?;
        } else if halted {
            writeln!(out, "Status: HALTED")?;
        }
        writeln!(out, "{}", banner)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::CommandList;
    use crate::core::types::Command;
    use tempfile::tempdir;

    fn result_with_sink(dir: &std::path::Path, index: usize, exit_code: i32) -> ExecutionResult {
        let path = dir.join(format!("cmd_{:06}.log", index));
        std::fs::write(&path, format!("section {}\n", index + 1)).unwrap();
        ExecutionResult::completed(&Command::new(index, format!("cmd {}", index)), exit_code, path)
    }

    fn metadata(range: Option<&str>, selected: usize, total: usize) -> RunMetadata {
        RunMetadata {
            total_in_file: total,
            selected,
            jobs: 2,
            range: range.map(|r| r.parse().unwrap()),
            serial_from: None,
        }
    }

    #[test]
    fn test_outcome_exit_code_law() {
        let dir = tempdir().unwrap();
        let ok = result_with_sink(dir.path(), 0, 0);
        let bad = result_with_sink(dir.path(), 1, 2);

        assert_eq!(RunOutcome::from_results(&[ok.clone()], false).exit_code(), 0);
        assert_eq!(RunOutcome::from_results(&[], false).exit_code(), 0);
        assert_eq!(
            RunOutcome::from_results(&[ok.clone(), bad.clone()], false).exit_code(),
            1
        );
        assert_eq!(RunOutcome::from_results(&[ok], true).exit_code(), 130);
        assert_eq!(RunOutcome::from_results(&[bad], true), RunOutcome::Interrupted);
    }

    #[test]
    fn test_summary_counts() {
        let dir = tempdir().unwrap();
        let results = vec![
            result_with_sink(dir.path(), 0, 0),
            result_with_sink(dir.path(), 1, 1),
            result_with_sink(dir.path(), 2, 0),
        ];
        let summary = RunSummary::from_results(&results, 10, 4, Duration::from_millis(1500));
        assert_eq!(summary.executed, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.selected, 4);
        assert_eq!(summary.total_in_file, 10);
    }

    #[test]
    fn test_finalize_sorts_and_releases() {
        let scratch = tempdir().unwrap();
        let work_dir = WorkDir::create_in(scratch.path()).unwrap();
        let work_path = work_dir.path().to_path_buf();
        let output_path = scratch.path().join("out.log");

        let results = vec![
            result_with_sink(&work_path, 2, 0),
            result_with_sink(&work_path, 0, 0),
            result_with_sink(&work_path, 1, 5),
        ];
        let config = RunConfig::builder()
            .jobs(2)
            .output_path(&output_path)
            .build()
            .unwrap();
        let aggregator = Aggregator::new(metadata(None, 3, 3), &config);

        let report = aggregator.finalize(
            ScheduleOutcome {
                results,
                halted: false,
                interrupted: false,
            },
            work_dir,
            Instant::now(),
        );

        let order: Vec<usize> = report.results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(report.outcome, RunOutcome::Failure);
        assert!(report.log_written);
        assert!(matches!(report.released, Released::Removed));
        assert!(!work_path.exists());

        let log = std::fs::read_to_string(&output_path).unwrap();
        let first = log.find("section 1").unwrap();
        let second = log.find("section 2").unwrap();
        let third = log.find("section 3").unwrap();
        assert!(first < second && second < third);
        assert!(log.contains("# Parallel Execution Log"));
        assert!(log.contains("# Total Commands: 3\n# Parallel Jobs: 2\n"));
        assert!(log.contains("Total commands: 3\nExecuted: 3\nSuccessful: 2\nFailed: 1\n"));
        assert!(!log.contains("Status:"));
    }

    #[test]
    fn test_range_metadata_in_header_and_summary() {
        let list = CommandList::parse(&(1..=10).map(|i| format!("echo {}\n", i)).collect::<String>());
        let selection = list.select(Some(&":2".parse().unwrap())).unwrap();
        let config = RunConfig::builder()
            .jobs(3)
            .serial_from(Some(2))
            .build()
            .unwrap();
        let aggregator = Aggregator::new(RunMetadata::new(&selection, &config), &config);

        let summary = RunSummary::from_results(&[], 10, 2, Duration::ZERO);
        let mut out = Vec::new();
        aggregator
            .write_log(&mut out, &[], &summary, RunOutcome::Interrupted, false)
            .unwrap();
        let log = String::from_utf8(out).unwrap();

        assert!(log.contains("# Command range: :2\n"));
        assert!(log.contains("# Serial execution from command: 2\n"));
        assert!(log.contains("Total commands in file: 10\nCommands in range: 2\n"));
        assert!(log.contains("Status: INTERRUPTED\n"));
    }

    #[test]
    fn test_unwritable_output_is_a_warning() {
        let scratch = tempdir().unwrap();
        let work_dir = WorkDir::create_in(scratch.path()).unwrap();
        let config = RunConfig::builder()
            .output_path(scratch.path().join("missing/dir/out.log"))
            .keep_temp(true)
            .build()
            .unwrap();
        let aggregator = Aggregator::new(metadata(None, 0, 0), &config);

        let report = aggregator.finalize(ScheduleOutcome::default(), work_dir, Instant::now());

        assert!(!report.log_written);
        assert_eq!(report.outcome, RunOutcome::Success);
        assert!(matches!(report.released, Released::Kept(_)));
    }

    #[test]
    fn test_missing_sink_is_skipped() {
        let scratch = tempdir().unwrap();
        let aggregator = Aggregator::new(metadata(None, 1, 1), &RunConfig::default());
        let ghost = ExecutionResult::completed(
            &Command::new(0, "true"),
            0,
            scratch.path().join("cmd_000000.log"),
        );
        let summary = RunSummary::from_results(std::slice::from_ref(&ghost), 1, 1, Duration::ZERO);

        let mut out = Vec::new();
        aggregator
            .write_log(&mut out, &[ghost], &summary, RunOutcome::Success, true)
            .unwrap();
        let log = String::from_utf8(out).unwrap();
        assert!(log.contains("Executed: 1\n"));
        assert!(log.contains("Status: HALTED\n"));
    }
}
