use serde::Serialize;
use std::path::PathBuf;

/// Exit code recorded when a command could not be run to completion
///
/// Used for spawn failures and timeouts; the accompanying
/// [`ExecutionResult::error`] explains which.
pub const EXECUTION_ERROR_CODE: i32 = -1;

/// A single shell command selected for execution
///
/// `index` is the 0-based position in the full command file, so numbering
/// stays stable when only a sub-range is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub index: usize,
    pub text: String,
}

impl Command {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// 1-based number used in every operator-facing report
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Outcome of running one [`Command`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub index: usize,
    pub exit_code: i32,
    pub command: String,
    /// Sink holding the command's header, merged output and footer
    pub log_path: PathBuf,
    /// Set only for internal execution failures
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Result for a command whose process ran and exited
    pub fn completed(command: &Command, exit_code: i32, log_path: PathBuf) -> Self {
        Self {
            index: command.index,
            exit_code,
            command: command.text.clone(),
            log_path,
            error: None,
        }
    }

    /// Result for a command that could not be run or did not finish in time
    pub fn execution_error(command: &Command, error: impl Into<String>, log_path: PathBuf) -> Self {
        Self {
            index: command.index,
            exit_code: EXECUTION_ERROR_CODE,
            command: command.text.clone(),
            log_path,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn number(&self) -> usize {
        self.index + 1
    }
}
