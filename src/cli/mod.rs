//! Command line front end for parallel-exec
//! ## Usage
//!
//! ```bash
//! # Run all commands with one job per CPU
//! parallel-exec commands.txt
//!
//! # First four commands in parallel, the rest one at a time
//! parallel-exec commands.txt -s 5 -j 4
//!
//! # Only commands 45-50, verbose, keep the per-command logs
//! parallel-exec commands.txt --range 45:50 -vv --keep-temp
//! ```

pub mod app;
pub mod config;
pub mod error;

pub use app::Cli;
pub use error::{CliError, Result, UserFriendlyError};

/// Version information for the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Platform directory holding `config.toml`
pub fn default_config_dir() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("", "", "parallel-exec")
        .map(|dirs| dirs.config_dir().to_path_buf())
}
