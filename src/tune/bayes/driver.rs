//! Sequential model-based search loop

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::acquisition::Acquisition;
use super::gp::{GaussianProcess, Kernel};
use crate::data::Dataset;
use crate::error::{Result, TuneError};
use crate::resample::Fold;
use crate::tune::control::TuneControl;
use crate::tune::evaluator::{CandidateEvaluator, Learner};
use crate::tune::grid::{grid_latin_hypercube, latin_hypercube_points};
use crate::tune::grid_search::check_folds;
use crate::tune::history::{EvaluationResult, SearchHistory, SearchState};
use crate::tune::objective::Objective;
use crate::tune::types::{Configuration, HyperparameterSpace};

/// Why a configuration was proposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProposalKind {
    Acquisition,
    Uncertainty,
    Random,
}

/// Bayesian search driver.
///
/// Starts from an initial design, then proposes one configuration per
/// iteration by maximising an acquisition function over a Gaussian-process
/// surrogate of the mean objective. Stops when `no_improve` consecutive
/// iterations fail to beat the incumbent (converged) or when `iterations`
/// have run (budget exhausted).
///
/// # Toyota Way: Kaizen
///
/// Each iteration refits the surrogate on everything observed so far, so
/// every proposal benefits from every previous evaluation.
pub struct BayesSearch<L: Learner> {
    learner: Arc<L>,
    space: HyperparameterSpace,
    objective: Objective,
    control: TuneControl,
    initial: Option<Vec<Configuration>>,
    n_initial: usize,
    iterations: usize,
    no_improve: usize,
    uncertain: Option<usize>,
    n_candidates: usize,
    acquisition: Acquisition,
    kernel: Kernel,
}

impl<L: Learner> BayesSearch<L> {
    pub fn new(learner: Arc<L>, space: HyperparameterSpace, objective: Objective) -> Self {
        Self {
            learner,
            space,
            objective,
            control: TuneControl::default(),
            initial: None,
            n_initial: 5,
            iterations: 10,
            no_improve: 10,
            uncertain: None,
            n_candidates: 500,
            acquisition: Acquisition::default(),
            kernel: Kernel::default(),
        }
    }

    pub fn with_control(mut self, control: TuneControl) -> Self {
        self.control = control;
        self
    }

    /// Size of the Latin hypercube initial design
    pub fn n_initial(mut self, n: usize) -> Self {
        self.n_initial = n;
        self
    }

    /// Explicit initial configurations instead of a Latin hypercube.
    /// Missing qualitative parameters take their default.
    pub fn with_initial(mut self, configs: Vec<Configuration>) -> Self {
        self.initial = Some(configs.iter().map(|c| self.space.complete(c)).collect());
        self
    }

    /// Maximum number of sequential iterations
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Consecutive non-improving iterations before stopping
    pub fn no_improve(mut self, n: usize) -> Self {
        self.no_improve = n;
        self
    }

    /// Consecutive non-improving iterations before proposing the most
    /// uncertain candidate
    pub fn uncertain(mut self, n: usize) -> Self {
        self.uncertain = Some(n);
        self
    }

    /// Candidates scored per proposal
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = n;
        self
    }

    pub fn acquisition(mut self, acquisition: Acquisition) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    fn check_settings(&self) -> Result<()> {
        if self.space.is_empty() {
            return Err(TuneError::EmptySpace);
        }
        match &self.initial {
            Some(configs) if configs.is_empty() => return Err(TuneError::EmptyGrid),
            Some(configs) => {
                for config in configs {
                    self.space.validate(config)?;
                }
            }
            None if self.n_initial == 0 => {
                return Err(TuneError::Config { field: "n_initial".into(), message: "must be at least 1".into() })
            }
            None => {}
        }
        if self.no_improve == 0 {
            return Err(TuneError::Config { field: "no_improve".into(), message: "must be at least 1".into() });
        }
        if self.n_candidates == 0 {
            return Err(TuneError::Config { field: "n_candidates".into(), message: "must be at least 1".into() });
        }
        Ok(())
    }

    /// Run the search and return the full history.
    ///
    /// Fails with [`TuneError::AllFailed`] if every cell of the initial
    /// design fails. A cancelled search returns the partial history with
    /// [`SearchState::Cancelled`].
    pub fn run(&self, data: &Dataset, folds: &[Fold]) -> Result<SearchHistory> {
        check_folds(data, folds)?;
        self.check_settings()?;

        let mut rng = StdRng::seed_from_u64(self.control.seed);
        let mut history = SearchHistory::new(self.objective.clone());
        history.set_state(SearchState::Initializing);

        let evaluator = CandidateEvaluator::new(Arc::clone(&self.learner), data)
            .with_timeout(self.control.timeout)
            .with_save_extracts(self.control.save_extracts);

        let initial = match &self.initial {
            Some(configs) => configs.clone(),
            None => grid_latin_hypercube(&self.space, self.n_initial, &mut rng)?,
        };
        info!(
            initial = initial.len(),
            iterations = self.iterations,
            acquisition = self.acquisition.name(),
            objective = %self.objective,
            "starting Bayesian search"
        );

        if self.control.cancel.is_cancelled() {
            return Ok(cancelled(history));
        }
        let members: Vec<(usize, Configuration)> =
            initial.into_iter().map(|c| (history.register(c.clone()), c)).collect();
        let batch = self.evaluate_batch(&evaluator, &members, folds);
        history.append(0, batch);
        if let Some(err) = history.all_failed_error() {
            return Err(err);
        }

        let mut best = history.best_mean(&self.objective).map(|(_, mean)| mean);
        info!(iteration = 0, best = ?best, metric = %self.objective.metric, "initial design evaluated");

        if self.iterations == 0 {
            history.set_state(SearchState::BudgetExhausted);
            return Ok(history);
        }

        let mut since_improvement = 0usize;
        let mut since_uncertain = 0usize;
        for iter in 1..=self.iterations {
            if self.control.cancel.is_cancelled() {
                info!(iteration = iter, "Bayesian search cancelled");
                return Ok(cancelled(history));
            }

            history.set_state(SearchState::Proposing);
            let explore = self.uncertain.is_some_and(|n| since_uncertain >= n);
            let Some((config, kind)) = self.propose(&history, iter, explore, &mut rng) else {
                info!(iteration = iter, "no unevaluated candidates remain");
                history.set_state(SearchState::Converged);
                return Ok(history);
            };
            if kind == ProposalKind::Uncertainty {
                since_uncertain = 0;
            }
            if self.control.verbose {
                info!(iteration = iter, ?kind, %config, "proposed configuration");
            }

            history.set_state(SearchState::Evaluating);
            let config_id = history.register(config.clone());
            let batch = self.evaluate_batch(&evaluator, &[(config_id, config.clone())], folds);
            history.append(iter, batch);

            let observed = history.mean_metric(config_id, &self.objective.metric).filter(|m| !m.is_nan());
            let improved = match (observed, best) {
                (Some(value), Some(incumbent)) => self.objective.direction.is_better(value, incumbent),
                (Some(_), None) => true,
                (None, _) => false,
            };
            if improved {
                best = observed;
                since_improvement = 0;
                since_uncertain = 0;
                info!(iteration = iter, best = ?best, %config, "new best configuration");
            } else {
                since_improvement += 1;
                since_uncertain += 1;
                match observed {
                    Some(value) => info!(iteration = iter, value, best = ?best, "no improvement"),
                    None => warn!(iteration = iter, %config, "iteration produced no usable result"),
                }
            }

            if since_improvement >= self.no_improve {
                info!(iteration = iter, no_improve = self.no_improve, "search converged");
                history.set_state(SearchState::Converged);
                return Ok(history);
            }
        }

        history.set_state(SearchState::BudgetExhausted);
        Ok(history)
    }

    /// Evaluate every member on every fold. Cells of one batch may run in
    /// parallel; the batch itself is the unit the driver waits on.
    fn evaluate_batch(
        &self,
        evaluator: &CandidateEvaluator<'_, L>,
        members: &[(usize, Configuration)],
        folds: &[Fold],
    ) -> Vec<EvaluationResult> {
        let cells: Vec<(&(usize, Configuration), &Fold)> =
            members.iter().flat_map(|m| folds.iter().map(move |f| (m, f))).collect();
        let run = |&((id, config), fold): &(&(usize, Configuration), &Fold)| evaluator.evaluate(*id, config, fold);
        if self.control.parallel {
            cells.par_iter().map(run).collect()
        } else {
            cells.iter().map(run).collect()
        }
    }

    /// Pick the next configuration to evaluate, or `None` when every
    /// candidate has already been evaluated.
    fn propose(
        &self,
        history: &SearchHistory,
        iter: usize,
        explore: bool,
        rng: &mut StdRng,
    ) -> Option<(Configuration, ProposalKind)> {
        let candidates = self.candidates(history, rng);
        if candidates.is_empty() {
            return None;
        }

        let gp = match self.fit_surrogate(history) {
            Ok(gp) => gp,
            Err(message) => {
                warn!(iteration = iter, %message, "surrogate fit failed; proposing a random candidate");
                let pick = rng.random_range(0..candidates.len());
                return candidates.into_iter().nth(pick).map(|(c, _)| (c, ProposalKind::Random));
            }
        };
        debug!(iteration = iter, length_scale = gp.length_scale(), "surrogate fitted");

        let best = history
            .best_mean(&self.objective)
            .map(|(_, mean)| mean * self.objective.direction.sign())
            .unwrap_or(0.0);
        let (kind, scores): (ProposalKind, Vec<f64>) = if explore {
            (ProposalKind::Uncertainty, candidates.iter().map(|(_, x)| gp.predict(x).1).collect())
        } else {
            let scores = candidates
                .iter()
                .map(|(_, x)| {
                    let (mean, sd) = gp.predict(x);
                    self.acquisition.score(mean, sd, best, iter)
                })
                .collect();
            (ProposalKind::Acquisition, scores)
        };

        // First maximiser wins so proposals are reproducible.
        let mut pick = 0;
        for (i, score) in scores.iter().enumerate() {
            if score.total_cmp(&scores[pick]).is_gt() {
                pick = i;
            }
        }
        candidates.into_iter().nth(pick).map(|(c, _)| (c, kind))
    }

    /// Fresh Latin hypercube candidates that have not been evaluated yet,
    /// paired with their surrogate encoding.
    fn candidates(&self, history: &SearchHistory, rng: &mut StdRng) -> Vec<(Configuration, Vec<f64>)> {
        let mut seen: HashSet<String> = history.configurations().iter().map(Configuration::key).collect();
        let points = match latin_hypercube_points(&self.space, self.n_candidates, rng) {
            Ok(points) => points,
            Err(_) => return Vec::new(),
        };
        points
            .iter()
            .map(|p| self.space.from_unit(p))
            .filter(|c| seen.insert(c.key()))
            .filter_map(|c| self.space.encode(&c).ok().map(|x| (c, x)))
            .collect()
    }

    /// Fit the surrogate on (encoding, signed mean objective) of every
    /// usable configuration with a finite mean.
    fn fit_surrogate(&self, history: &SearchHistory) -> std::result::Result<GaussianProcess, String> {
        let sign = self.objective.direction.sign();
        let mut x = Vec::new();
        let mut y = Vec::new();
        for id in history.usable_config_ids() {
            let mean = history.mean_metric(id, &self.objective.metric).filter(|m| m.is_finite());
            let (Some(config), Some(mean)) = (history.configuration(id), mean) else {
                continue;
            };
            let encoded = self.space.encode(config).map_err(|e| e.to_string())?;
            x.push(encoded);
            y.push(sign * mean);
        }
        GaussianProcess::fit(&x, &y, self.kernel).map_err(|e| e.to_string())
    }
}

fn cancelled(mut history: SearchHistory) -> SearchHistory {
    history.mark_cancelled();
    history.set_state(SearchState::Cancelled);
    history
}
