//! Search Integration Tests
//!
//! End-to-end runs through the public API: resampling, both search drivers
//! and the result aggregator, with closure-defined and built-in learners.

use std::sync::Arc;

use approx::assert_relative_eq;
use cvtune::{
    collect_metrics, collect_notes, select_best, show_best, BayesSearch, CancelToken, CellError, Column,
    Configuration, Dataset, Direction, FnLearner, GridSearch, HyperparameterSpace, Learner, Metrics, MetricsTable,
    Objective, ParameterDomain, ParameterValue, RidgeRegression, SearchState, TuneControl, TuneError, VFold,
};

/// 100 rows of a noisy line plus a row index column
fn line_data() -> Dataset {
    let row: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let x: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
    let y: Vec<f64> = x.iter().enumerate().map(|(i, v)| 3.0 * v + 1.0 + (i as f64).sin() * 0.5).collect();
    Dataset::new(vec![Column::numeric("row", row), Column::numeric("x", x), Column::numeric("y", y)]).unwrap()
}

fn shift_space() -> HyperparameterSpace {
    HyperparameterSpace::new().with("shift", ParameterDomain::integer(0, 5)).unwrap()
}

fn shift(k: i64) -> Configuration {
    Configuration::new().with("shift", ParameterValue::Int(k))
}

/// Predicts the analysis mean of `y` plus `shift`; scored by rmse.
///
/// With `fail_shift` set, fitting that shift fails on the fold whose
/// assessment set holds row 0.
fn mean_learner(fail_shift: Option<i64>) -> impl Learner {
    FnLearner::new(
        move |analysis: &Dataset, config: &Configuration| {
            let rows = analysis.numeric("row").map_err(|e| CellError::Fit(e.to_string()))?;
            if fail_shift == config.int("shift") && !rows.contains(&0.0) {
                return Err(CellError::Fit("injected failure".into()));
            }
            let y = analysis.numeric("y").map_err(|e| CellError::Fit(e.to_string()))?;
            Ok(y.iter().sum::<f64>() / y.len() as f64)
        },
        |mean: &f64, assessment: &Dataset, config: &Configuration| {
            let y = assessment.numeric("y").map_err(|e| CellError::Score(e.to_string()))?;
            let prediction = mean + config.float("shift").unwrap_or(0.0);
            let mse = y.iter().map(|v| (v - prediction).powi(2)).sum::<f64>() / y.len() as f64;
            Ok(Metrics::from([("rmse".to_string(), mse.sqrt())]))
        },
    )
}

fn grid_history(fail_shift: Option<i64>) -> cvtune::SearchHistory {
    let data = line_data();
    let folds = VFold::new(5).with_seed(7).split(&data).unwrap();
    let grid = vec![shift(0), shift(2), shift(4)];
    GridSearch::new(Arc::new(mean_learner(fail_shift)), shift_space(), grid, Objective::minimize("rmse"))
        .unwrap()
        .run(&data, &folds)
        .unwrap()
}

// ============================================================================
// Grid search
// ============================================================================

#[test]
fn grid_100_rows_5_folds_3_configs() {
    let history = grid_history(None);
    assert_eq!(history.len(), 15);

    let MetricsTable::Raw(raw) = collect_metrics(&history, false) else {
        panic!("expected raw table");
    };
    assert_eq!(raw.len(), 15);

    let MetricsTable::Summarized(summary) = collect_metrics(&history, true) else {
        panic!("expected summarized table");
    };
    assert_eq!(summary.len(), 3);
    assert!(summary.iter().all(|s| s.n == 5 && s.std_err.is_some()));

    // The summary mean is the mean of the raw rows
    let raw_mean = raw.iter().filter(|r| r.config_id == 1).map(|r| r.value).sum::<f64>() / 5.0;
    assert_relative_eq!(summary[1].mean, raw_mean, epsilon = 1e-12);

    assert_eq!(select_best(&history, "rmse", Direction::Minimize).unwrap(), shift(0));
}

#[test]
fn grid_results_are_reproducible() {
    let a = grid_history(None);
    let b = grid_history(None);
    let values = |h: &cvtune::SearchHistory| {
        h.records().iter().map(|r| (r.config_id, r.fold_id, r.metric("rmse"))).collect::<Vec<_>>()
    };
    assert_eq!(values(&a), values(&b));
    assert_eq!(collect_metrics(&a, true), collect_metrics(&b, true));
}

#[test]
fn grid_injected_failure_is_isolated() {
    let history = grid_history(Some(2));
    assert_eq!(history.len(), 15);
    assert_eq!(history.failures().count(), 1);

    let notes = collect_notes(&history);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].stage, "fit");
    assert!(notes[0].message.contains("injected failure"));

    let MetricsTable::Summarized(summary) = collect_metrics(&history, true) else {
        panic!("expected summarized table");
    };
    let failed = summary.iter().find(|s| s.config == shift(2)).unwrap();
    assert_eq!(failed.n, 4);

    let top = show_best(&history, "rmse", Direction::Minimize, 3).unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].config, shift(0));
}

#[test]
fn grid_all_failed_is_an_error() {
    let data = line_data();
    let folds = VFold::new(5).split(&data).unwrap();
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| Err::<(), _>(CellError::Fit("no".into())),
        |_: &(), _: &Dataset, _: &Configuration| Ok(Metrics::new()),
    );
    let result = GridSearch::new(Arc::new(learner), shift_space(), vec![shift(1)], Objective::minimize("rmse"))
        .unwrap()
        .run(&data, &folds);
    assert!(matches!(result, Err(TuneError::AllFailed { n_cells: 5, .. })));
}

#[test]
fn grid_cancelled_before_start_returns_partial_history() {
    let data = line_data();
    let folds = VFold::new(5).split(&data).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let history = GridSearch::new(Arc::new(mean_learner(None)), shift_space(), vec![shift(0)], Objective::minimize("rmse"))
        .unwrap()
        .with_control(TuneControl::new().with_cancel(cancel))
        .run(&data, &folds)
        .unwrap();
    assert!(history.is_cancelled());
    assert!(history.is_empty());
}

// ============================================================================
// Bayesian search
// ============================================================================

#[test]
fn bayes_ridge_prefers_small_penalty_on_clean_line() {
    let data = line_data();
    let folds = VFold::new(5).split(&data).unwrap();
    let space = HyperparameterSpace::new().with("penalty", ParameterDomain::log10(-4.0, 2.0)).unwrap();
    let learner = Arc::new(RidgeRegression::new(vec!["x".into()], "y"));

    let history = BayesSearch::new(learner, space, Objective::minimize("rmse"))
        .with_control(TuneControl::new().with_seed(3))
        .n_initial(4)
        .iterations(6)
        .run(&data, &folds)
        .unwrap();

    assert!(matches!(history.final_state(), Some(SearchState::BudgetExhausted | SearchState::Converged)));
    assert!(history.n_configurations() <= 10);
    assert_eq!(history.len(), history.n_configurations() * 5);
    // Iteration tags: the initial design is iteration 0
    assert!(history.records().iter().take(20).all(|r| r.iteration == 0));

    let best = select_best(&history, "rmse", Direction::Minimize).unwrap();
    assert!(best.float("penalty").unwrap() < 1.0);
}

#[test]
fn bayes_is_deterministic_for_a_seed() {
    let data = line_data();
    let folds = VFold::new(4).split(&data).unwrap();
    let run = || {
        BayesSearch::new(Arc::new(mean_learner(None)), shift_space(), Objective::minimize("rmse"))
            .n_initial(3)
            .iterations(3)
            .run(&data, &folds)
            .unwrap()
    };
    assert_eq!(run().configurations(), run().configurations());
}
