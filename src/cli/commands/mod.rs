//! CLI command implementations

mod info;
mod run;
mod validate;


use std::path::Path;

use crate::cli::{Cli, Command, LogLevel};
use crate::config::TuneSpec;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
        Command::Run(args) => run::run_tune(args, log_level),
    }
}

fn load_spec(path: &Path) -> Result<TuneSpec, String> {
    TuneSpec::from_path(path).map_err(|e| format!("Spec error [{}]: {e}", e.code()))
}
