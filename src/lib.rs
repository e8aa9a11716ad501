//! # parallel-exec
//!
//! Run a file of shell commands on a bounded worker pool. A configurable
//! prefix of the commands runs concurrently and the rest run one at a time.
//! Each command's merged stdout and stderr is captured in its own sink, and
//! the sinks are concatenated in command order into a single log ending with
//! a run summary.
//!
//! ```rust,no_run
//! use parallel_exec::core::{CommandList, RunConfig};
//! use parallel_exec::runtime::{run_batch, ProgressReporter, RenderConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> parallel_exec::core::Result<()> {
//! let commands = CommandList::load("commands.txt")?;
//! let config = RunConfig::builder().jobs(8).serial_from(Some(5)).build()?;
//! let mut reporter = ProgressReporter::stdout(1, RenderConfig::detect(true));
//!
//! let outcome = run_batch(
//!     &commands,
//!     "commands.txt",
//!     &config,
//!     &mut reporter,
//!     CancellationToken::new(),
//! )
//! .await?;
//! std::process::exit(outcome.exit_code());
//! # }
//! ```

pub mod core;
pub mod runtime;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::core::{
    Command, CommandList, CommandRange, Error, ExecutionResult, Result, RunConfig, Selection,
};
pub use crate::runtime::{
    run_batch, BatchOutcome, Executor, ProgressReporter, RenderConfig, RunOutcome, RunReport,
    RunSummary, Scheduler,
};
