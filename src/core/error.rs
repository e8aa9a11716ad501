use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before or around a batch run
///
/// Per-command failures are never represented here: a command that exits
/// non-zero, times out or cannot be spawned is recorded in its
/// [`ExecutionResult`](crate::core::ExecutionResult) and the run continues.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    #[error("{0}")]
    EmptySelection(String),

    #[error("Could not read command file '{}': {source}", path.display())]
    CommandFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create working directory: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Async task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid range error
    pub fn invalid_range<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Create an empty selection error
    pub fn empty_selection<S: Into<String>>(msg: S) -> Self {
        Self::EmptySelection(msg.into())
    }

    /// Whether the error was caused by operator input rather than the environment
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::InvalidRange(_)
                | Self::EmptySelection(_)
                | Self::CommandFile { .. }
        )
    }
}

/// Convenient result type for the scheduler core
pub type Result<T> = std::result::Result<T, Error>;
