//! cvtune CLI
//!
//! Runs cross-validated hyperparameter searches described by YAML specs.
//!
//! # Usage
//!
//! ```bash
//! # Check a spec
//! cvtune validate knn.yaml
//!
//! # Show its parameter space and search plan
//! cvtune info knn.yaml
//!
//! # Run it, overriding the dataset and keeping the full history
//! cvtune run knn.yaml --data cells.json --output history.json
//! ```

use std::process::ExitCode;

use clap::Parser;
use cvtune::cli::{init_tracing, run_command, Cli, LogLevel};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
