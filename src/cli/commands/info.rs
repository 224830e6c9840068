//! Info command implementation

use crate::cli::logging::log;
use crate::cli::{InfoArgs, LogLevel, OutputFormat};
use crate::config::{SearchSpec, TuneSpec};

/// Human-readable search plan
pub fn format_search_plan(spec: &TuneSpec) -> String {
    match &spec.search {
        SearchSpec::Grid { configs: Some(configs), .. } => {
            format!("grid over {} explicit configurations", configs.len())
        }
        SearchSpec::Grid { design, levels, size, .. } => match design {
            crate::config::GridDesign::Regular => format!("regular grid, {levels} levels per parameter"),
            other => format!("{other:?} grid of {size} points"),
        },
        SearchSpec::Bayes { n_initial, initial, iterations, no_improve, acquisition, kernel, .. } => {
            let start = match initial {
                Some(configs) => format!("{} explicit initial configurations", configs.len()),
                None => format!("{n_initial} initial points"),
            };
            format!(
                "bayesian search: {start}, up to {iterations} iterations, stop after {no_improve} without \
                 improvement, {} with {kernel:?} kernel",
                acquisition.name()
            )
        }
    }
}

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = super::load_spec(&args.spec)?;

    match args.format {
        OutputFormat::Table => {
            let space = spec.hyperparameter_space().map_err(|e| format!("Spec error [{}]: {e}", e.code()))?;
            log(level, LogLevel::Normal, "Tuning spec:");
            println!();
            println!("Model: {}", spec.model.name());
            println!(
                "Folds: {}-fold x {} repeat(s), seed {}{}",
                spec.folds.v,
                spec.folds.repeats,
                spec.folds.seed,
                spec.folds.strata.as_ref().map(|s| format!(", stratified by {s}")).unwrap_or_default()
            );
            println!("Objective: {} {}", spec.objective.direction, spec.objective.metric);
            println!("Search: {}", format_search_plan(&spec));
            println!("Parameters:");
            for param in space.iter() {
                println!("  {param}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&spec).map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}
