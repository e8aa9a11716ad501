use crate::cli::config::Config;
use crate::cli::error::{CliError, Result};
use crate::core::{default_jobs, CommandList, CommandRange, RunConfig};
use crate::runtime::{run_batch, ProgressReporter, RenderConfig};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const AFTER_HELP: &str = "\
Examples:
  parallel-exec commands.txt -j 16
  parallel-exec commands.txt --range 5:10 -vv --keep-temp
  parallel-exec commands.txt -s 5 -j 4 --halt-on-error
  parallel-exec commands.txt --dry-run

Command file format: one command per line; blank lines and lines starting
with '#' are ignored.

Exit codes: 0 if all commands succeeded, 1 if any failed, 130 if interrupted.";

/// Execute commands from a file in parallel (GNU parallel-like)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = AFTER_HELP)]
pub struct Cli {
    /// File containing commands to execute (one per line)
    #[arg(value_name = "COMMAND_FILE", required_unless_present = "completions")]
    pub command_file: Option<PathBuf>,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Increase verbosity (can be used multiple times: -v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only show failures and summary)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print commands without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Print results in the order commands were submitted
    #[arg(long)]
    pub keep_order: bool,

    /// Stop execution if any command fails
    #[arg(long)]
    pub halt_on_error: bool,

    /// Output log file for all commands (default: parallel_execution.log)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Keep temporary files after execution
    #[arg(long)]
    pub keep_temp: bool,

    /// Execute commands serially starting from command number N (1-based)
    #[arg(short, long, value_name = "N")]
    pub serial_from: Option<usize>,

    /// Execute only commands in range START:END (1-based, inclusive). Examples: 5:10, :5, 10:
    #[arg(long, value_name = "START:END", allow_hyphen_values = true)]
    pub range: Option<String>,

    /// Kill commands that run longer than SECS seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Read defaults from this config file instead of the platform default
    #[arg(long, value_name = "PATH", env = "PARALLEL_EXEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Execute the run described by the arguments and return the exit code
    pub async fn execute(self) -> Result<i32> {
        if let Some(shell) = self.completions {
            generate_completion(shell);
            return Ok(0);
        }

        let file_config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => Config::load_default()?,
        };
        let settings = file_config.merge_with_cli_args(&self);
        let run_config = self.run_config(&settings)?;
        debug!("Resolved run configuration: {:?}", run_config);

        let command_file = self
            .command_file
            .ok_or_else(|| CliError::invalid_input("a command file is required"))?;
        let commands = CommandList::load(&command_file)?;

        let mut reporter =
            ProgressReporter::stdout(settings.verbosity, RenderConfig::detect(settings.color));
        let cancel = CancellationToken::new();
        let watcher = spawn_interrupt_watcher(cancel.clone());

        let outcome = run_batch(
            &commands,
            &command_file.display().to_string(),
            &run_config,
            &mut reporter,
            cancel,
        )
        .await;
        watcher.abort();

        Ok(outcome?.exit_code())
    }

    /// Build the validated run configuration from merged settings
    pub fn run_config(&self, settings: &Config) -> Result<RunConfig> {
        let range = self
            .range
            .as_deref()
            .map(str::parse::<CommandRange>)
            .transpose()?;

        let config = RunConfig::builder()
            .jobs(settings.jobs.unwrap_or_else(default_jobs))
            .serial_from(self.serial_from)
            .range(range)
            .halt_on_error(settings.halt_on_error)
            .keep_order(settings.keep_order)
            .dry_run(self.dry_run)
            .verbosity(settings.verbosity)
            .output_path(settings.output.clone())
            .keep_temp(settings.keep_temp)
            .timeout(settings.timeout_secs.map(Duration::from_secs))
            .build()?;
        Ok(config)
    }
}

/// Cancel the run on Ctrl-C
fn spawn_interrupt_watcher(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal");
            cancel.cancel();
        }
    })
}

/// Generate shell completion script
fn generate_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
