use crate::cli::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent defaults for parallel-exec, read from `config.toml`
///
/// Every field can be overridden on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Worker pool size; falls back to the number of logical CPUs
    pub jobs: Option<usize>,

    /// Aggregated log destination
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Progress verbosity (0 quiet, 1 normal, 2+ verbose)
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    /// Enable colored output when stdout is a terminal
    #[serde(default = "default_true")]
    pub color: bool,

    #[serde(default)]
    pub keep_order: bool,

    #[serde(default)]
    pub halt_on_error: bool,

    #[serde(default)]
    pub keep_temp: bool,

    /// Per-command timeout in seconds; unset means wait indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: None,
            output: default_output(),
            verbosity: default_verbosity(),
            color: default_true(),
            keep_order: false,
            halt_on_error: false,
            keep_temp: false,
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from file, with fallback to defaults when absent
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CliError::config_file(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            CliError::config_file(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        crate::cli::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Merge with command-line arguments, giving priority to CLI args
    pub fn merge_with_cli_args(mut self, cli_args: &crate::cli::app::Cli) -> Self {
        if let Some(jobs) = cli_args.jobs {
            self.jobs = Some(jobs);
        }
        if let Some(ref output) = cli_args.output {
            self.output = output.clone();
        }
        if cli_args.quiet {
            self.verbosity = 0;
        } else if cli_args.verbose > 0 {
            self.verbosity = self.verbosity.saturating_add(cli_args.verbose);
        }
        if cli_args.no_color {
            self.color = false;
        }
        if cli_args.keep_order {
            self.keep_order = true;
        }
        if cli_args.halt_on_error {
            self.halt_on_error = true;
        }
        if cli_args.keep_temp {
            self.keep_temp = true;
        }
        if let Some(timeout) = cli_args.timeout {
            self.timeout_secs = Some(timeout);
        }

        self
    }
}

// Helper functions for default values
fn default_output() -> PathBuf {
    PathBuf::from(crate::core::config::DEFAULT_OUTPUT_PATH)
}

fn default_verbosity() -> u8 {
    crate::core::config::DEFAULT_VERBOSITY
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::app::Cli;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.jobs, None);
        assert_eq!(config.verbosity, 1);
        assert_eq!(config.output, PathBuf::from("parallel_execution.log"));
        assert!(config.color);
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested/config.toml");

        let config = Config {
            jobs: Some(12),
            halt_on_error: true,
            timeout_secs: Some(600),
            ..Config::default()
        };
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load_from_file(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(!temp_dir.path().join("absent.toml").exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "jobs = 3\nkeep_order = true\n").unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.jobs, Some(3));
        assert!(config.keep_order);
        assert_eq!(config.verbosity, 1);
        assert!(config.color);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "jobs = \"many\"").unwrap();

        let err = Config::load_from_file(&config_path).unwrap_err();
        assert!(matches!(err, CliError::ConfigFile(_)));
    }

    #[test]
    fn test_cli_args_override_file() {
        let file = Config {
            jobs: Some(2),
            verbosity: 1,
            timeout_secs: Some(10),
            ..Config::default()
        };
        let cli = Cli::try_parse_from([
            "parallel-exec",
            "cmds.txt",
            "-j",
            "16",
            "-vv",
            "--no-color",
            "--halt-on-error",
            "-o",
            "custom.log",
        ])
        .unwrap();

        let merged = file.merge_with_cli_args(&cli);
        assert_eq!(merged.jobs, Some(16));
        assert_eq!(merged.verbosity, 3);
        assert!(!merged.color);
        assert!(merged.halt_on_error);
        assert_eq!(merged.output, PathBuf::from("custom.log"));
        assert_eq!(merged.timeout_secs, Some(10));
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let cli = Cli::try_parse_from(["parallel-exec", "cmds.txt", "-q", "-v"]).unwrap();
        let merged = Config::default().merge_with_cli_args(&cli);
        assert_eq!(merged.verbosity, 0);
    }
}
