//! CLI module
//!
//! Command-line interface for running projection jobs.
//!
//! # Commands
//!
//! - `run` - Run a job from a config file and/or flags
//! - `validate` - Check a job config without touching storage
//! - `inspect` - Print the records of a partitioned output

mod commands;
mod runner;

pub use commands::{Cli, Commands, JobArgs, OutputFormat};
pub use runner::{failure_message, Runner};
