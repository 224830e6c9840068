//! Run command implementation

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::cli::logging::log;
use crate::cli::{LogLevel, OutputFormat, RunArgs};
use crate::config::{run_spec, TuneSpec};
use crate::data::Dataset;
use crate::tune::{
    collect_metrics, collect_notes, show_best, CancelToken, Configuration, MetricSummary, MetricsTable, NoteRecord,
    SearchHistory, SearchState,
};

/// Machine-readable result of a run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub state: Option<SearchState>,
    pub n_configurations: usize,
    pub n_evaluations: usize,
    pub best: Option<Configuration>,
    pub top: Vec<MetricSummary>,
    pub metrics: MetricsTable,
    pub notes: Vec<NoteRecord>,
}

impl RunReport {
    pub fn from_history(history: &SearchHistory, spec: &TuneSpec, top: usize) -> Result<Self, String> {
        let objective = &spec.objective;
        let top = show_best(history, &objective.metric, objective.direction, top.max(1))
            .map_err(|e| format!("Selection failed [{}]: {e}", e.code()))?;
        Ok(Self {
            state: history.final_state(),
            n_configurations: history.n_configurations(),
            n_evaluations: history.len(),
            best: top.first().map(|s| s.config.clone()),
            top,
            metrics: collect_metrics(history, true),
            notes: collect_notes(history),
        })
    }
}

/// Dataset path: the command-line override, else `data.path` resolved
/// against the spec's directory.
pub fn resolve_data_path(spec_path: &Path, spec: &TuneSpec, cli_data: Option<&Path>) -> Result<PathBuf, String> {
    if let Some(path) = cli_data {
        return Ok(path.to_path_buf());
    }
    let path = spec.data.path.as_ref().ok_or("No dataset: set data.path in the spec or pass --data")?;
    if path.is_absolute() {
        return Ok(path.clone());
    }
    let base = spec_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(path))
}

/// Progress message for the user. With JSON output stdout carries only the
/// report, so messages go to the `tracing` subscriber on stderr instead.
fn status(format: OutputFormat, level: LogLevel, required: LogLevel, msg: &str) {
    match (format, required) {
        (OutputFormat::Table, _) => log(level, required, msg),
        (OutputFormat::Json, LogLevel::Verbose) => debug!("{msg}"),
        (OutputFormat::Json, _) => info!("{msg}"),
    }
}

/// Text written to stdout for a finished run, if any
pub fn render_report(
    report: &RunReport,
    spec: &TuneSpec,
    format: OutputFormat,
    level: LogLevel,
) -> Result<Option<String>, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map(Some)
            .map_err(|e| format!("JSON serialization error: {e}")),
        OutputFormat::Table if level == LogLevel::Quiet => Ok(None),
        OutputFormat::Table => Ok(Some(format_report(report, spec))),
    }
}

pub fn run_tune(args: RunArgs, level: LogLevel) -> Result<(), String> {
    let spec = super::load_spec(&args.spec)?;
    let data_path = resolve_data_path(&args.spec, &spec, args.data.as_deref())?;
    status(args.format, level, LogLevel::Verbose, &format!("Loading data: {}", data_path.display()));
    let data = Dataset::from_path(&data_path).map_err(|e| format!("Data error [{}]: {e}", e.code()))?;

    let history = run_spec(&spec, &data, CancelToken::new()).map_err(|e| format!("Tuning failed [{}]: {e}", e.code()))?;

    if let Some(output) = &args.output {
        let json = history.to_json().map_err(|e| e.to_string())?;
        std::fs::write(output, json).map_err(|e| format!("Failed to write {}: {e}", output.display()))?;
        status(args.format, level, LogLevel::Normal, &format!("History written to {}", output.display()));
    }

    let report = RunReport::from_history(&history, &spec, args.top)?;
    if let Some(text) = render_report(&report, &spec, args.format, level)? {
        println!("{text}");
    }
    Ok(())
}

fn format_report(report: &RunReport, spec: &TuneSpec) -> String {
    let mut out = format!("{}\n\n", report.metrics.to_table());
    out.push_str(&format!(
        "Evaluated {} configurations ({} cells){}",
        report.n_configurations,
        report.n_evaluations,
        report.state.map(|s| format!(", finished {s:?}")).unwrap_or_default()
    ));
    if !report.notes.is_empty() {
        out.push_str(&format!("\n{} cells failed; first: {}", report.notes.len(), report.notes[0].message));
    }
    if let (Some(best), Some(summary)) = (&report.best, report.top.first()) {
        out.push_str(&format!(
            "\nBest {} ({}): {:.6} with {}",
            spec.objective.metric, spec.objective.direction, summary.mean, best
        ));
    }
    out
}
