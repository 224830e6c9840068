//! Error types for tuning runs.
//!
//! Fatal problems surface as [`TuneError`] before or after a search. Failures of
//! a single fit/score cell are [`CellError`] values recorded in the search
//! history and never propagated.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for tuning operations.
pub type Result<T> = std::result::Result<T, TuneError>;

/// Errors that abort a tuning run.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("Invalid fold count v = {v} for {n_rows} rows\n  → v must be >= 2 and <= the number of rows")]
    InvalidFolds { v: usize, n_rows: usize },

    #[error("Stratum '{class}' has {count} rows, fewer than v = {v}\n  → Reduce v or merge small classes")]
    StrataTooSmall { class: String, count: usize, v: usize },

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Empty search grid\n  → Supply at least one configuration")]
    EmptyGrid,

    #[error("Empty search space")]
    EmptySpace,

    #[error("Invalid range for '{name}': low = {low}, high = {high}\n  → low must be strictly below high")]
    InvalidRange { name: String, low: f64, high: f64 },

    #[error("Invalid domain for '{name}': {message}")]
    InvalidDomain { name: String, message: String },

    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Invalid parameter value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Invalid configuration value for '{field}': {message}")]
    Config { field: String, message: String },

    #[error("Invalid data: {0}")]
    Data(String),

    #[error("Metric not found in results: {0}")]
    MetricNotFound(String),

    #[error("No usable configuration: every configuration failed on every fold")]
    NoUsableConfiguration,

    #[error("All {n_cells} evaluations failed; first failure: {first_note}\n  → Inspect the learner or run with --verbose")]
    AllFailed { n_cells: usize, first_note: String },

    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl TuneError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Whether the error comes from an invalid declaration rather than from
    /// running the search.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFolds { .. }
                | Self::StrataTooSmall { .. }
                | Self::UnknownColumn(_)
                | Self::EmptyGrid
                | Self::EmptySpace
                | Self::InvalidRange { .. }
                | Self::InvalidDomain { .. }
                | Self::DuplicateParameter(_)
                | Self::ParameterNotFound(_)
                | Self::InvalidValue(..)
                | Self::Config { .. }
        )
    }

    /// Stable error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFolds { .. } => "E001",
            Self::StrataTooSmall { .. } => "E002",
            Self::UnknownColumn(_) => "E003",
            Self::EmptyGrid => "E010",
            Self::EmptySpace => "E011",
            Self::InvalidRange { .. } => "E012",
            Self::InvalidDomain { .. } => "E013",
            Self::DuplicateParameter(_) => "E014",
            Self::ParameterNotFound(_) => "E015",
            Self::InvalidValue(..) => "E016",
            Self::Config { .. } => "E020",
            Self::Data(_) => "E030",
            Self::MetricNotFound(_) => "E040",
            Self::NoUsableConfiguration => "E041",
            Self::AllFailed { .. } => "E042",
            Self::Io { .. } => "E050",
            Self::Parse { .. } => "E051",
        }
    }
}

/// Failure of a single (configuration, fold) cell.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "stage", content = "message", rename_all = "snake_case")]
pub enum CellError {
    #[error("fit failed: {0}")]
    Fit(String),

    #[error("scoring failed: {0}")]
    Score(String),

    #[error("learner panicked: {0}")]
    Panicked(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl CellError {
    /// Short name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fit(_) => "fit",
            Self::Score(_) => "score",
            Self::Panicked(_) => "panic",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Convert a caught panic payload into a cell error.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}
