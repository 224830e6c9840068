//! Exhaustive evaluation of a fixed grid of configurations

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use super::control::TuneControl;
use super::evaluator::{CandidateEvaluator, Learner};
use super::history::{EvaluationResult, SearchHistory};
use super::objective::Objective;
use super::types::{Configuration, HyperparameterSpace};
use crate::data::Dataset;
use crate::error::{Result, TuneError};
use crate::resample::Fold;

/// Grid search driver.
///
/// Every configuration of the grid is evaluated on every fold. Cells are
/// independent and run on the rayon pool when `control.parallel` is set;
/// results are gathered and appended to the history in (configuration,
/// fold) order regardless of completion order.
pub struct GridSearch<L: Learner> {
    learner: Arc<L>,
    space: HyperparameterSpace,
    grid: Vec<Configuration>,
    objective: Objective,
    control: TuneControl,
}

impl<L: Learner> GridSearch<L> {
    /// Validate the grid against the space. Qualitative parameters a
    /// configuration leaves out take their default.
    pub fn new(
        learner: Arc<L>,
        space: HyperparameterSpace,
        grid: Vec<Configuration>,
        objective: Objective,
    ) -> Result<Self> {
        if grid.is_empty() {
            return Err(TuneError::EmptyGrid);
        }
        let grid: Vec<Configuration> = grid.iter().map(|c| space.complete(c)).collect();
        for config in &grid {
            space.validate(config)?;
        }
        Ok(Self { learner, space, grid, objective, control: TuneControl::default() })
    }

    pub fn with_control(mut self, control: TuneControl) -> Self {
        self.control = control;
        self
    }

    pub fn space(&self) -> &HyperparameterSpace {
        &self.space
    }

    pub fn grid(&self) -> &[Configuration] {
        &self.grid
    }

    /// Evaluate the grid and return the full history.
    ///
    /// Returns [`TuneError::AllFailed`] when no cell succeeded, unless the
    /// search was cancelled.
    pub fn run(&self, data: &Dataset, folds: &[Fold]) -> Result<SearchHistory> {
        check_folds(data, folds)?;

        let mut history = SearchHistory::new(self.objective.clone());
        let members: Vec<(usize, Configuration)> =
            self.grid.iter().map(|c| (history.register(c.clone()), c.clone())).collect();

        let submodel = if self.control.submodels { self.learner.submodel_parameter() } else { None };
        let groups = group_by_submodel(members, submodel);
        info!(
            configs = self.grid.len(),
            folds = folds.len(),
            groups = groups.len(),
            objective = %self.objective,
            "starting grid search"
        );

        let evaluator = CandidateEvaluator::new(Arc::clone(&self.learner), data)
            .with_timeout(self.control.timeout)
            .with_save_extracts(self.control.save_extracts);
        let tasks: Vec<(&[(usize, Configuration)], &Fold)> =
            groups.iter().flat_map(|g| folds.iter().map(move |f| (g.as_slice(), f))).collect();

        let cancel = &self.control.cancel;
        let run_task = |&(group, fold): &(&[(usize, Configuration)], &Fold)| -> Option<Vec<EvaluationResult>> {
            if cancel.is_cancelled() {
                return None;
            }
            Some(evaluator.evaluate_group(group, fold))
        };
        let outputs: Vec<Option<Vec<EvaluationResult>>> = if self.control.parallel {
            tasks.par_iter().map(run_task).collect()
        } else {
            tasks.iter().map(run_task).collect()
        };

        let skipped = outputs.iter().filter(|o| o.is_none()).count();
        let batch: Vec<EvaluationResult> = outputs.into_iter().flatten().flatten().collect();
        history.append(0, batch);

        if skipped > 0 {
            warn!(skipped, "grid search cancelled; returning partial history");
            history.mark_cancelled();
        }
        self.log_summary(&history);

        if !history.is_cancelled() {
            if let Some(err) = history.all_failed_error() {
                return Err(err);
            }
        }
        Ok(history)
    }

    fn log_summary(&self, history: &SearchHistory) {
        if self.control.verbose {
            for (id, config) in history.configurations().iter().enumerate() {
                match history.mean_metric(id, &self.objective.metric) {
                    Some(mean) => info!(config_id = id, %config, mean, metric = %self.objective.metric, "configuration evaluated"),
                    None => info!(config_id = id, %config, "configuration has no usable folds"),
                }
            }
        }
        let failures = history.failures().count();
        if failures > 0 {
            warn!(failures, cells = history.len(), "some cells failed");
        }
        if let Some((id, mean)) = history.best_mean(&self.objective) {
            info!(config_id = id, mean, metric = %self.objective.metric, "grid search best");
        }
    }
}

/// Folds must be non-empty and index rows that exist.
pub(crate) fn check_folds(data: &Dataset, folds: &[Fold]) -> Result<()> {
    if folds.is_empty() {
        return Err(TuneError::InvalidFolds { v: 0, n_rows: data.n_rows() });
    }
    let n_rows = data.n_rows();
    for fold in folds {
        if fold.analysis().iter().chain(fold.assessment()).any(|&row| row >= n_rows) {
            return Err(TuneError::Data(format!("fold {} references rows beyond {n_rows}", fold.label)));
        }
    }
    Ok(())
}

/// Split members into groups that can share one fit: configurations equal in
/// everything except the sub-model parameter. Without a sub-model parameter
/// every member is its own group. Groups keep first-appearance order.
fn group_by_submodel(
    members: Vec<(usize, Configuration)>,
    submodel: Option<&str>,
) -> Vec<Vec<(usize, Configuration)>> {
    let Some(param) = submodel else {
        return members.into_iter().map(|m| vec![m]).collect();
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<(usize, Configuration)>> = Vec::new();
    for member in members {
        let key = member.1.key_excluding(Some(param));
        match index.get(&key) {
            Some(&g) => groups[g].push(member),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![member]);
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::error::CellError;
    use crate::resample::VFold;
    use crate::tune::control::CancelToken;
    use crate::tune::evaluator::FnLearner;
    use crate::tune::objective::Metrics;
    use crate::tune::types::{ParameterDomain, ParameterValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn data() -> Dataset {
        Dataset::new(vec![Column::numeric("y", (0..40).map(|i| (i % 7) as f64).collect())]).unwrap()
    }

    fn space() -> HyperparameterSpace {
        HyperparameterSpace::new()
            .with("k", ParameterDomain::integer(1, 10))
            .unwrap()
            .with("shift", ParameterDomain::double(0.0, 1.0))
            .unwrap()
    }

    fn config(k: i64, shift: f64) -> Configuration {
        Configuration::new()
            .with("k", ParameterValue::Int(k))
            .with("shift", ParameterValue::Float(shift))
    }

    /// Loss = |k - 4| + shift, independent of the data
    fn loss_learner() -> impl Learner {
        FnLearner::new(
            |_: &Dataset, _: &Configuration| Ok(()),
            |_: &(), _: &Dataset, config: &Configuration| {
                let k = config.float("k").unwrap_or(0.0);
                let shift = config.float("shift").unwrap_or(0.0);
                Ok(Metrics::from([("loss".to_string(), (k - 4.0).abs() + shift)]))
            },
        )
    }

    #[test]
    fn test_rejects_empty_grid_and_invalid_configs() {
        let learner = Arc::new(loss_learner());
        assert!(matches!(
            GridSearch::new(Arc::clone(&learner), space(), vec![], Objective::minimize("loss")),
            Err(TuneError::EmptyGrid)
        ));
        assert!(matches!(
            GridSearch::new(Arc::clone(&learner), space(), vec![config(11, 0.0)], Objective::minimize("loss")),
            Err(TuneError::InvalidValue(..))
        ));
        let partial = vec![Configuration::new().with("k", ParameterValue::Int(2))];
        assert!(matches!(
            GridSearch::new(learner, space(), partial, Objective::minimize("loss")),
            Err(TuneError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_empty_folds() {
        let search =
            GridSearch::new(Arc::new(loss_learner()), space(), vec![config(1, 0.0)], Objective::minimize("loss"))
                .unwrap();
        assert!(matches!(search.run(&data(), &[]), Err(TuneError::InvalidFolds { .. })));
    }

    #[test]
    fn test_history_is_in_canonical_order() {
        let data = data();
        let folds = VFold::new(4).split(&data).unwrap();
        let grid = vec![config(1, 0.5), config(4, 0.0), config(8, 0.2)];
        let history = GridSearch::new(Arc::new(loss_learner()), space(), grid, Objective::minimize("loss"))
            .unwrap()
            .run(&data, &folds)
            .unwrap();

        assert_eq!(history.len(), 12);
        let order: Vec<(usize, usize)> = history.records().iter().map(|r| (r.config_id, r.fold_id)).collect();
        let expected: Vec<(usize, usize)> = (0..3).flat_map(|c| (0..4).map(move |f| (c, f))).collect();
        assert_eq!(order, expected);
        assert!(history.records().iter().all(|r| r.iteration == 0));
        assert_eq!(history.best_mean(&Objective::minimize("loss")), Some((1, 0.0)));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let data = data();
        let folds = VFold::new(5).split(&data).unwrap();
        let grid: Vec<Configuration> = (1..=10).map(|k| config(k, 0.1)).collect();
        let run = |parallel: bool| {
            GridSearch::new(Arc::new(loss_learner()), space(), grid.clone(), Objective::minimize("loss"))
                .unwrap()
                .with_control(TuneControl::new().with_parallel(parallel))
                .run(&data, &folds)
                .unwrap()
        };
        let a = run(true);
        let b = run(false);
        let strip = |h: &SearchHistory| {
            h.records().iter().map(|r| (r.config_id, r.fold_id, r.seq, r.status.clone())).collect::<Vec<_>>()
        };
        assert_eq!(strip(&a), strip(&b));
    }

    #[test]
    fn test_all_failed_is_an_error() {
        let learner = FnLearner::new(
            |_: &Dataset, _: &Configuration| Err::<(), _>(CellError::Fit("always".into())),
            |_: &(), _: &Dataset, _: &Configuration| Ok(Metrics::new()),
        );
        let data = data();
        let folds = VFold::new(2).split(&data).unwrap();
        let result = GridSearch::new(Arc::new(learner), space(), vec![config(1, 0.0)], Objective::minimize("loss"))
            .unwrap()
            .run(&data, &folds);
        match result {
            Err(TuneError::AllFailed { n_cells, first_note }) => {
                assert_eq!(n_cells, 2);
                assert!(first_note.contains("always"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_start_returns_partial_history() {
        let data = data();
        let folds = VFold::new(2).split(&data).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let history = GridSearch::new(Arc::new(loss_learner()), space(), vec![config(1, 0.0)], Objective::minimize("loss"))
            .unwrap()
            .with_control(TuneControl::new().with_cancel(token))
            .run(&data, &folds)
            .unwrap();
        assert!(history.is_cancelled());
        assert!(history.is_empty());
        assert_eq!(history.n_configurations(), 1);
    }

    #[test]
    fn test_submodel_groups_share_fits() {
        let fits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fits);
        let learner = FnLearner::new(
            move |_: &Dataset, _: &Configuration| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            |_: &(), _: &Dataset, config: &Configuration| {
                Ok(Metrics::from([("loss".to_string(), config.float("k").unwrap_or(0.0))]))
            },
        )
        .with_submodel("k");

        let data = data();
        let folds = VFold::new(3).split(&data).unwrap();
        // Two shift values x five k values
        let grid: Vec<Configuration> =
            [0.0, 0.5].iter().flat_map(|&s| (1..=5).map(move |k| config(k, s))).collect();
        let history = GridSearch::new(Arc::new(learner), space(), grid, Objective::minimize("loss"))
            .unwrap()
            .run(&data, &folds)
            .unwrap();

        assert_eq!(history.len(), 30);
        assert_eq!(fits.load(Ordering::SeqCst), 2 * 3);
        assert_eq!(history.mean_metric(4, "loss"), Some(5.0));
    }

    #[test]
    fn test_group_by_submodel() {
        let members = vec![(0, config(1, 0.0)), (1, config(2, 0.5)), (2, config(3, 0.0))];
        let groups = group_by_submodel(members.clone(), Some("k"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].iter().map(|m| m.0).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(group_by_submodel(members, None).len(), 3);
    }
}
