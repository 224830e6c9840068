//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cvtune: cross-validated hyperparameter search
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "cvtune")]
#[command(version)]
#[command(about = "Cross-validated grid and Bayesian hyperparameter search from YAML specs")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Parse and validate a tuning spec
    Validate(ValidateArgs),

    /// Show the parameter space and search plan of a tuning spec
    Info(InfoArgs),

    /// Run the search described by a tuning spec
    Run(RunArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML tuning spec
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML tuning spec
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Path to YAML tuning spec
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// JSON dataset; overrides `data.path` in the spec
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Write the full search history as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of best configurations to show
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}. Valid formats: table, json")),
        }
    }
}

/// Parse arguments from an iterator (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
