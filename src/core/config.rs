use crate::core::commands::CommandRange;
use crate::core::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default destination of the aggregated log
pub const DEFAULT_OUTPUT_PATH: &str = "parallel_execution.log";

/// Default progress verbosity: one line per finished command
pub const DEFAULT_VERBOSITY: u8 = 1;

/// Worker pool size used when none is configured
pub fn default_jobs() -> usize {
    num_cpus::get().max(1)
}

/// Options for one batch run
///
/// Construct through [`RunConfig::builder`] so that job count and
/// serial-from position are validated before anything executes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Size of the worker pool for the parallel batch
    pub jobs: usize,
    /// 1-based position within the selection where serial execution begins
    pub serial_from: Option<usize>,
    pub range: Option<CommandRange>,
    pub halt_on_error: bool,
    /// Report parallel results live in submission order
    pub keep_order: bool,
    pub dry_run: bool,
    /// 0 = failures only, 1 = every result, 2+ = also log locations
    pub verbosity: u8,
    pub output_path: PathBuf,
    pub keep_temp: bool,
    /// Per-command limit; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            serial_from: None,
            range: None,
            halt_on_error: false,
            keep_order: false,
            dry_run: false,
            verbosity: DEFAULT_VERBOSITY,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            keep_temp: false,
            timeout: None,
        }
    }
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }

    /// Check the invariants the scheduler relies on
    pub fn validate(&self) -> Result<()> {
        if self.jobs < 1 {
            return Err(Error::configuration("Number of jobs must be at least 1"));
        }
        if self.serial_from == Some(0) {
            return Err(Error::configuration(
                "Serial command number must be at least 1",
            ));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::configuration("Timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Fluent builder for [`RunConfig`]
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    pub fn serial_from(mut self, position: Option<usize>) -> Self {
        self.config.serial_from = position;
        self
    }

    pub fn range(mut self, range: Option<CommandRange>) -> Self {
        self.config.range = range;
        self
    }

    pub fn halt_on_error(mut self, enabled: bool) -> Self {
        self.config.halt_on_error = enabled;
        self
    }

    pub fn keep_order(mut self, enabled: bool) -> Self {
        self.config.keep_order = enabled;
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.config.dry_run = enabled;
        self
    }

    pub fn verbosity(mut self, level: u8) -> Self {
        self.config.verbosity = level;
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn keep_temp(mut self, enabled: bool) -> Self {
        self.config.keep_temp = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<RunConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
