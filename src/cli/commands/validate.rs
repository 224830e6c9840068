//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, ValidateArgs};
use crate::config::{validate_spec, TuneSpec};

/// One-line description of the columns a spec uses
pub fn format_data_info(spec: &TuneSpec) -> String {
    let mut line = format!("  Features: {}  Outcome: {}", spec.data.features.join(", "), spec.data.outcome);
    if let Some(path) = &spec.data.path {
        line.push_str(&format!("  Data: {}", path.display()));
    }
    line
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating spec: {}", args.spec.display()));

    let spec = super::load_spec(&args.spec)?;
    validate_spec(&spec).map_err(|e| format!("Validation failed [{}]: {e}", e.code()))?;

    log(level, LogLevel::Normal, "Spec is valid");
    log(level, LogLevel::Verbose, &format_data_info(&spec));
    Ok(())
}
