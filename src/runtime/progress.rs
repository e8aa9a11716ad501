//! Live progress rendering
//!
//! This module handles:
//! - One status line per finished command, as soon as it is known
//! - Run banners (load, plan, batch headers, halt and interrupt notices)
//! - The console summary printed after aggregation
//!
//! Rendering never influences scheduling; the reporter only observes.
//! Halt, interrupt and cleanup warnings go to a separate notice stream
//! (stderr for the CLI) so piped progress output stays clean.

use crate::core::commands::Selection;
use crate::core::types::ExecutionResult;
use crate::runtime::aggregate::{RunOutcome, RunReport};
use crate::runtime::partition::Batches;
use crate::runtime::workdir::Released;
use colored::{Color, Colorize};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Explicit rendering options handed to the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub color: bool,
}

impl RenderConfig {
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Color only when allowed and stdout is a terminal
    pub fn detect(color_allowed: bool) -> Self {
        Self {
            color: color_allowed && io::stdout().is_terminal(),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Which half of the run a batch header announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Parallel,
    Serial,
}

/// Writes progress lines to `out` and run notices to `notices`
pub struct ProgressReporter<W: Write, E: Write = io::Stderr> {
    out: W,
    notices: E,
    verbosity: u8,
    render: RenderConfig,
}

impl ProgressReporter<io::Stdout, io::Stderr> {
    pub fn stdout(verbosity: u8, render: RenderConfig) -> Self {
        Self::new(io::stdout(), io::stderr(), verbosity, render)
    }
}

impl<W: Write, E: Write> ProgressReporter<W, E> {
    pub fn new(out: W, notices: E, verbosity: u8, render: RenderConfig) -> Self {
        Self {
            out,
            notices,
            verbosity,
            render,
        }
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Progress writer and notice writer, in that order
    pub fn into_parts(self) -> (W, E) {
        (self.out, self.notices)
    }

    fn emit(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{}", line) {
            debug!("Dropped progress output: {}", err);
        }
    }

    fn notify(&mut self, line: &str) {
        if let Err(err) = writeln!(self.notices, "{}", line) {
            debug!("Dropped notice: {}", err);
        }
    }

    /// Render one finished command
    pub fn report(&mut self, result: &ExecutionResult) {
        let failed = !result.succeeded();
        if self.verbosity == 0 && !failed {
            return;
        }

        let status = if failed {
            self.render.paint("FAILED", Color::Red)
        } else {
            self.render.paint("SUCCESS", Color::Green)
        };
        self.emit(&format!(
            "{} [#{}] [Exit: {}] {}",
            status,
            result.number(),
            result.exit_code,
            result.command
        ));

        if let Some(error) = &result.error {
            let label = if self.verbosity == 0 {
                "Error:".to_string()
            } else {
                self.render.paint("Error:", Color::Yellow)
            };
            self.emit(&format!("  {} {}", label, error));
        }

        if self.verbosity >= 2 {
            let label = self.render.paint("Log:", Color::Cyan);
            self.emit(&format!("  {} {}", label, result.log_path.display()));
        }
    }

    /// Announce how many commands were loaded and which were selected
    pub fn loaded(&mut self, source: &str, selection: &Selection) {
        if self.verbosity == 0 {
            return;
        }
        let count = selection.total_in_file;
        self.emit(&self.render.bold(&format!(
            "Loaded {} command(s) from '{}'",
            count, source
        )));
        if let Some(range) = &selection.range {
            self.emit(&self.render.paint(
                &format!(
                    "Executing range {}:{} ({} command(s))",
                    range.start,
                    range.end,
                    selection.len()
                ),
                Color::Cyan,
            ));
        }
    }

    /// Describe the parallel/serial split before anything runs
    pub fn plan(&mut self, batches: &Batches<'_>, jobs: usize) {
        if self.verbosity == 0 {
            return;
        }
        if batches.parallel.is_empty() {
            self.emit(&self.render.bold("Executing all commands serially\n"));
        } else if batches.is_mixed() {
            let split = batches.parallel.len();
            self.emit(&self.render.bold(&format!(
                "Executing commands 1-{} in parallel ({} jobs)",
                split, jobs
            )));
            self.emit(&self.render.bold(&format!(
                "Executing commands {}-{} serially\n",
                split + 1,
                batches.len()
            )));
        } else {
            self.emit(&self.render.bold(&format!(
                "Executing with {} parallel job(s)\n",
                jobs
            )));
        }
    }

    pub fn dry_run(&mut self, selection: &Selection) {
        self.emit("DRY RUN - Commands to be executed:");
        for command in &selection.commands {
            self.emit(&format!("  {}. {}", command.number(), command.text));
        }
    }

    pub fn work_dir(&mut self, path: &Path) {
        if self.verbosity >= 2 {
            let label = self.render.paint("Using temporary directory:", Color::Cyan);
            self.emit(&format!("{} {}\n", label, path.display()));
        }
    }

    pub fn batch_header(&mut self, kind: BatchKind, count: usize) {
        if self.verbosity == 0 {
            return;
        }
        let (lead, name) = match kind {
            BatchKind::Parallel => ("", "parallel"),
            BatchKind::Serial => ("\n", "serial"),
        };
        let header = self.render.paint(
            &format!("=== Executing {} batch ({} commands) ===", name, count),
            Color::Cyan,
        );
        self.emit(&format!("{}{}\n", lead, header));
    }

    pub fn halting(&mut self) {
        let notice = self.render.paint("Halting execution due to error", Color::Red);
        self.notify(&format!("\n{}", notice));
    }

    pub fn interrupted(&mut self) {
        let notice = self.render.paint("Interrupted by user", Color::Yellow);
        self.notify(&format!("\n\n{}", notice));
    }

    /// Report what happened to the working directory
    pub fn released(&mut self, released: &Released) {
        match released {
            Released::Removed => {
                if self.verbosity >= 2 {
                    let status = self.render.paint("SUCCESS", Color::Green);
                    self.emit(&format!("{} Cleaned up temporary directory", status));
                }
            }
            Released::Kept(path) => {
                if self.verbosity >= 1 {
                    let status = self.render.paint("INFO", Color::Cyan);
                    self.emit(&format!("{} Temporary files kept in: {}", status, path.display()));
                }
            }
            Released::Failed(path, err) => {
                warn!("Could not remove temporary directory {}: {}", path.display(), err);
                let label = self.render.paint("Warning:", Color::Yellow);
                self.notify(&format!(
                    "{} Could not remove temporary directory: {}",
                    label, err
                ));
            }
        }
    }

    /// Console summary, printed at every verbosity
    pub fn summary(&mut self, report: &RunReport) {
        let summary = &report.summary;
        let rule = "=".repeat(60);

        self.emit(&format!("\n{}", rule));
        self.emit(&self.render.bold("Execution Summary:"));
        self.emit(&format!("  Total commands: {}", summary.selected));
        self.emit(&format!("  Executed: {}", summary.executed));
        self.emit(&format!(
            "  {} {}",
            self.render.paint("Successful:", Color::Green),
            summary.succeeded
        ));
        if summary.failed > 0 {
            self.emit(&format!(
                "  {} {}",
                self.render.paint("Failed:", Color::Red),
                summary.failed
            ));
        } else {
            self.emit(&format!("  Failed: {}", summary.failed));
        }
        self.emit(&format!(
            "  Elapsed time: {:.2} seconds",
            summary.elapsed.as_secs_f64()
        ));
        if self.verbosity >= 1 {
            self.emit(&format!("  Log file: {}", report.output_path.display()));
        }
        match report.outcome {
            RunOutcome::Interrupted => {
                let status = self.render.paint("INTERRUPTED", Color::Yellow);
                self.emit(&format!("  Status: {}", status));
            }
            _ if report.halted => {
                let status = self.render.paint("HALTED", Color::Red);
                self.emit(&format!("  Status: {}", status));
            }
            _ => {}
        }
        self.emit(&rule);
    }
}
