use thiserror::Error;

/// Error type for the parallel-exec command line front end
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Run(#[from] crate::core::error::Error),

    #[error("Config file error: {0}")]
    ConfigFile(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create a config file error
    pub fn config_file<S: Into<String>>(msg: S) -> Self {
        Self::ConfigFile(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Process exit code for an error that stopped the run before it started
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        use crate::core::error::Error as RunError;

        match self {
            Self::Run(RunError::InvalidRange(msg)) => {
                format!(
                    "Invalid range format: {}\nUse format: START:END (e.g., 5:10, :5, 10:)",
                    msg
                )
            }
            Self::Run(RunError::CommandFile { path, .. }) => {
                format!("Command file '{}' not found or unreadable", path.display())
            }
            Self::Run(RunError::WorkDir(err)) => {
                format!(
                    "Could not create a temporary directory: {}. Check TMPDIR and free disk space.",
                    err
                )
            }
            Self::ConfigFile(msg) => {
                format!("{}. Fix the file or pass --config with another path.", msg)
            }
            _ => self.to_string(),
        }
    }
}

/// Convenient result type for the command line front end
pub type Result<T> = std::result::Result<T, CliError>;

/// Trait for converting errors to user-friendly messages
pub trait UserFriendlyError {
    fn user_message(&self) -> String;
}

impl UserFriendlyError for CliError {
    fn user_message(&self) -> String {
        self.user_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error as RunError;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_error_creation_helpers() {
        match CliError::config_file("bad toml") {
            CliError::ConfigFile(msg) => assert_eq!(msg, "bad toml"),
            other => panic!("Expected ConfigFile error, got {:?}", other),
        }

        match CliError::invalid_input("missing command file") {
            CliError::InvalidInput(msg) => assert_eq!(msg, "missing command file"),
            other => panic!("Expected InvalidInput error, got {:?}", other),
        }
    }

    #[test]
    fn test_run_errors_display_transparently() {
        let err: CliError = RunError::configuration("Number of jobs must be at least 1").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Number of jobs must be at least 1"
        );
        assert_eq!(err.user_message(), err.to_string());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_user_friendly_error_messages() {
        let range: CliError = RunError::invalid_range("Range start must be at least 1").into();
        let message = range.user_message();
        assert!(message.contains("Range start must be at least 1"));
        assert!(message.contains("START:END"));

        let missing: CliError = RunError::CommandFile {
            path: PathBuf::from("commands.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }
        .into();
        assert!(missing.user_message().contains("'commands.txt'"));

        let workdir: CliError =
            RunError::WorkDir(io::Error::new(io::ErrorKind::PermissionDenied, "denied")).into();
        assert!(workdir.user_message().contains("TMPDIR"));

        let config = CliError::config_file("Failed to parse config file");
        assert!(config.user_message().contains("--config"));
    }

    #[test]
    fn test_user_friendly_error_trait() {
        let error = CliError::invalid_input("no command file given");
        let user_friendly: &dyn UserFriendlyError = &error;
        assert_eq!(user_friendly.user_message(), error.user_message());
        assert_eq!(error.user_message(), "Invalid input: no command file given");
    }

    #[test]
    fn test_error_type_conversions() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let cli_error: CliError = io_error.into();
        assert!(matches!(cli_error, CliError::Io(_)));
    }
}
