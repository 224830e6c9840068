//! CLI module for cvtune
//!
//! Argument parsing, logging setup and the command handlers.

mod args;
mod commands;
mod logging;

pub use args::{parse_args, Cli, Command, InfoArgs, OutputFormat, RunArgs, ValidateArgs};
pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};
