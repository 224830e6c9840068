//! Evaluation of one configuration (or sub-model group) on one fold

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, warn};

use super::learner::Learner;
use crate::data::Dataset;
use crate::error::CellError;
use crate::resample::Fold;
use crate::tune::history::{CellStatus, EvaluationResult};
use crate::tune::types::Configuration;

/// Metrics (or failure) and artifact of one scored configuration
type Outcome = (CellStatus, Option<serde_json::Value>);

/// Runs fit and score for (configuration, fold) cells.
///
/// Every learner error, panic or timeout becomes a failed
/// [`EvaluationResult`]; nothing escapes `evaluate`.
pub struct CandidateEvaluator<'a, L: Learner> {
    learner: Arc<L>,
    data: &'a Dataset,
    timeout: Option<Duration>,
    save_extracts: bool,
}

impl<'a, L: Learner> CandidateEvaluator<'a, L> {
    pub fn new(learner: Arc<L>, data: &'a Dataset) -> Self {
        Self { learner, data, timeout: None, save_extracts: true }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_save_extracts(mut self, save: bool) -> Self {
        self.save_extracts = save;
        self
    }

    /// Fit on the fold's analysis rows and score on its assessment rows.
    pub fn evaluate(&self, config_id: usize, config: &Configuration, fold: &Fold) -> EvaluationResult {
        let members = [(config_id, config.clone())];
        let mut results = self.evaluate_group(&members, fold);
        match results.pop() {
            Some(result) => result,
            None => failed_result(config_id, config, fold, CellError::Fit("no result".into())),
        }
    }

    /// Evaluate configurations that differ only in the learner's sub-model
    /// parameter with a single fit.
    ///
    /// The model is fitted with the first member's configuration and every
    /// member is scored from it. Results come back in member order. The
    /// timeout budget is one limit per member, so a group of N gets N times
    /// the limit of a single cell.
    pub fn evaluate_group(&self, members: &[(usize, Configuration)], fold: &Fold) -> Vec<EvaluationResult> {
        if members.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let analysis = self.data.subset(fold.analysis());
        let assessment = self.data.subset(fold.assessment());
        let configs: Vec<Configuration> = members.iter().map(|(_, c)| c.clone()).collect();

        let outcomes = match self.timeout {
            None => run_cell(self.learner.as_ref(), &analysis, &assessment, &configs, self.save_extracts),
            Some(limit) => self.run_with_timeout(analysis, assessment, configs, limit),
        };
        let elapsed = started.elapsed();

        members
            .iter()
            .zip(outcomes)
            .map(|((config_id, config), (status, artifact))| {
                match &status {
                    CellStatus::Completed { metrics } => {
                        debug!(config_id, fold = %fold.label, config = %config, ?metrics, "cell completed");
                    }
                    CellStatus::Failed { error } => {
                        warn!(config_id, fold = %fold.label, config = %config, %error, "cell failed");
                    }
                }
                EvaluationResult {
                    config_id: *config_id,
                    config: config.clone(),
                    fold_id: fold.id,
                    fold_label: fold.label.clone(),
                    iteration: 0,
                    seq: 0,
                    status,
                    artifact,
                    elapsed,
                }
            })
            .collect()
    }

    /// Run the cell on a worker thread and wait at most `limit` per
    /// configuration for it. A worker that overruns is left to finish on its
    /// own; its result is dropped.
    fn run_with_timeout(
        &self,
        analysis: Dataset,
        assessment: Dataset,
        configs: Vec<Configuration>,
        limit: Duration,
    ) -> Vec<Outcome> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let learner = Arc::clone(&self.learner);
        let save_extracts = self.save_extracts;
        let n = configs.len();

        let spawned = std::thread::Builder::new().name("cvtune-cell".into()).spawn(move || {
            let outcomes = run_cell(learner.as_ref(), &analysis, &assessment, &configs, save_extracts);
            // The receiver is gone if the cell already timed out.
            let _ = tx.send(outcomes);
        });
        if let Err(e) = spawned {
            return vec![(failed(CellError::Fit(format!("could not start worker: {e}"))), None); n];
        }

        let budget = limit.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX));
        match rx.recv_timeout(budget) {
            Ok(outcomes) => outcomes,
            Err(RecvTimeoutError::Timeout) => vec![(failed(CellError::Timeout(budget)), None); n],
            Err(RecvTimeoutError::Disconnected) => {
                vec![(failed(CellError::Panicked("worker exited without a result".into())), None); n]
            }
        }
    }
}

fn failed(error: CellError) -> CellStatus {
    CellStatus::Failed { error }
}

fn failed_result(config_id: usize, config: &Configuration, fold: &Fold, error: CellError) -> EvaluationResult {
    EvaluationResult {
        config_id,
        config: config.clone(),
        fold_id: fold.id,
        fold_label: fold.label.clone(),
        iteration: 0,
        seq: 0,
        status: failed(error),
        artifact: None,
        elapsed: Duration::ZERO,
    }
}

/// Run a learner call, turning a panic into [`CellError::Panicked`].
fn guarded<T>(f: impl FnOnce() -> Result<T, CellError>) -> Result<T, CellError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(CellError::from_panic(payload)))
}

/// Fit once with the first configuration, then score (and extract) every
/// configuration from that fit.
fn run_cell<L: Learner>(
    learner: &L,
    analysis: &Dataset,
    assessment: &Dataset,
    configs: &[Configuration],
    save_extracts: bool,
) -> Vec<Outcome> {
    let Some(fit_config) = configs.first() else {
        return Vec::new();
    };

    let fitted = match guarded(|| learner.fit(analysis, fit_config)) {
        Ok(fitted) => fitted,
        Err(error) => return vec![(failed(error), None); configs.len()],
    };

    configs
        .iter()
        .map(|config| {
            let status = match guarded(|| learner.score(&fitted, assessment, config)) {
                Ok(metrics) => CellStatus::Completed { metrics },
                Err(error) => failed(error),
            };
            let artifact = if save_extracts {
                guarded(|| Ok(learner.extract(&fitted, config))).ok().flatten()
            } else {
                None
            };
            (status, artifact)
        })
        .collect()
}
