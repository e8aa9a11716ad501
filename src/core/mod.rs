//! Core types shared by the scheduler and the CLI
//!
//! This module handles:
//! - The command and result data model
//! - Command file loading and range selection
//! - Run configuration and its validation
//! - The library error type

pub mod commands;
pub mod config;
pub mod error;
pub mod types;

pub use commands::{CommandList, CommandRange, SelectedRange, Selection};
pub use config::{default_jobs, RunConfig, RunConfigBuilder, DEFAULT_OUTPUT_PATH};
pub use error::{Error, Result};
pub use types::{Command, ExecutionResult, EXECUTION_ERROR_CODE};
