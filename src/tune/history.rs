//! Append-only record of every evaluated (configuration, fold) cell

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::objective::{Metrics, Objective};
use super::types::Configuration;
use crate::error::{CellError, Result, TuneError};

/// Outcome of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellStatus {
    Completed { metrics: Metrics },
    Failed { error: CellError },
}

/// One (configuration, fold) evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub config_id: usize,
    pub config: Configuration,
    pub fold_id: usize,
    pub fold_label: String,
    /// 0 for grid cells and the initial design, then the sequential iteration
    pub iteration: usize,
    /// Position in the history; assigned on append
    pub seq: u64,
    pub status: CellStatus,
    /// Opaque value returned by the learner's extractor
    pub artifact: Option<serde_json::Value>,
    pub elapsed: Duration,
}

impl EvaluationResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, CellStatus::Failed { .. })
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.status {
            CellStatus::Completed { metrics } => Some(metrics),
            CellStatus::Failed { .. } => None,
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics()?.get(name).copied()
    }

    pub fn error(&self) -> Option<&CellError> {
        match &self.status {
            CellStatus::Failed { error } => Some(error),
            CellStatus::Completed { .. } => None,
        }
    }
}

/// States of the sequential search driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Initializing,
    Proposing,
    Evaluating,
    Converged,
    BudgetExhausted,
    Cancelled,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchState::Converged | SearchState::BudgetExhausted | SearchState::Cancelled)
    }
}

/// Append-only log of evaluation results.
///
/// Configurations get dense ids in the order they are registered; results
/// are appended one batch at a time in canonical (configuration, fold)
/// order and stamped with a monotonic sequence number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHistory {
    objective: Option<Objective>,
    configs: Vec<Configuration>,
    records: Vec<EvaluationResult>,
    next_seq: u64,
    iterations: usize,
    cancelled: bool,
    state: Option<SearchState>,
}

impl SearchHistory {
    pub(crate) fn new(objective: Objective) -> Self {
        Self { objective: Some(objective), ..Self::default() }
    }

    /// Register a configuration and return its id
    pub(crate) fn register(&mut self, config: Configuration) -> usize {
        self.configs.push(config);
        self.configs.len() - 1
    }

    /// Append one batch of results produced by `iteration`.
    pub(crate) fn append(&mut self, iteration: usize, mut batch: Vec<EvaluationResult>) {
        batch.sort_by_key(|r| (r.config_id, r.fold_id));
        for mut record in batch {
            record.iteration = iteration;
            record.seq = self.next_seq;
            self.next_seq += 1;
            self.records.push(record);
        }
        self.iterations = self.iterations.max(iteration);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn set_state(&mut self, state: SearchState) {
        self.state = Some(state);
    }

    /// Objective the search optimised
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// All results in append order
    pub fn records(&self) -> &[EvaluationResult] {
        &self.records
    }

    /// Registered configurations, indexed by id
    pub fn configurations(&self) -> &[Configuration] {
        &self.configs
    }

    pub fn configuration(&self, id: usize) -> Option<&Configuration> {
        self.configs.get(id)
    }

    pub fn n_configurations(&self) -> usize {
        self.configs.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest iteration number recorded
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Terminal state of a sequential search
    pub fn final_state(&self) -> Option<SearchState> {
        self.state
    }

    /// Failed cells
    pub fn failures(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.records.iter().filter(|r| r.is_failed())
    }

    /// Whether any cell completed successfully
    pub fn has_usable(&self) -> bool {
        self.records.iter().any(|r| !r.is_failed())
    }

    /// Ids of configurations with at least one completed fold
    pub fn usable_config_ids(&self) -> Vec<usize> {
        let mut usable = vec![false; self.configs.len()];
        for record in self.records.iter().filter(|r| !r.is_failed()) {
            usable[record.config_id] = true;
        }
        (0..self.configs.len()).filter(|&id| usable[id]).collect()
    }

    /// Ids of evaluated configurations whose every fold failed
    pub fn unusable_config_ids(&self) -> Vec<usize> {
        let usable = self.usable_config_ids();
        let mut evaluated = vec![false; self.configs.len()];
        for record in &self.records {
            evaluated[record.config_id] = true;
        }
        (0..self.configs.len())
            .filter(|id| evaluated[*id] && !usable.contains(id))
            .collect()
    }

    /// Results of one configuration
    pub fn config_records(&self, config_id: usize) -> impl Iterator<Item = &EvaluationResult> {
        self.records.iter().filter(move |r| r.config_id == config_id)
    }

    /// Mean of `metric` over a configuration's completed folds
    pub fn mean_metric(&self, config_id: usize, metric: &str) -> Option<f64> {
        let values: Vec<f64> = self.config_records(config_id).filter_map(|r| r.metric(metric)).collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Configuration with the best mean objective; ties go to the lowest id.
    pub(crate) fn best_mean(&self, objective: &Objective) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for id in 0..self.configs.len() {
            let Some(mean) = self.mean_metric(id, &objective.metric).filter(|m| !m.is_nan()) else {
                continue;
            };
            match best {
                Some((_, incumbent)) if !objective.direction.is_better(mean, incumbent) => {}
                _ => best = Some((id, mean)),
            }
        }
        best
    }

    /// Error for a history with no usable cell, if that is the case.
    pub(crate) fn all_failed_error(&self) -> Option<TuneError> {
        if self.records.is_empty() || self.has_usable() {
            return None;
        }
        let first_note = self
            .records
            .iter()
            .find_map(|r| r.error().map(ToString::to_string))
            .unwrap_or_default();
        Some(TuneError::AllFailed { n_cells: self.records.len(), first_note })
    }

    /// Serialise the history as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TuneError::Data(format!("serialising history: {e}")))
    }
}
