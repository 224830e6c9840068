//! Tests for candidate evaluation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::data::{Column, Dataset};
use crate::error::CellError;
use crate::resample::{Fold, VFold};
use crate::tune::history::CellStatus;
use crate::tune::objective::Metrics;
use crate::tune::types::{Configuration, ParameterValue};

fn dataset(n: usize) -> Dataset {
    Dataset::new(vec![Column::numeric("y", (0..n).map(|i| i as f64).collect())]).unwrap()
}

fn first_fold(data: &Dataset) -> Fold {
    VFold::new(5).split(data).unwrap().remove(0)
}

fn config(k: i64) -> Configuration {
    Configuration::new().with("k", ParameterValue::Int(k))
}

/// Mean of `y` over the analysis rows, scored as absolute error of that mean
/// against the assessment mean plus `k`.
fn mean_learner() -> impl Learner {
    FnLearner::new(
        |data: &Dataset, _config: &Configuration| {
            let y = data.numeric("y").map_err(|e| CellError::Fit(e.to_string()))?;
            Ok(y.iter().sum::<f64>() / y.len() as f64)
        },
        |mean: &f64, data: &Dataset, config: &Configuration| {
            let y = data.numeric("y").map_err(|e| CellError::Score(e.to_string()))?;
            let target = y.iter().sum::<f64>() / y.len() as f64;
            let k = config.float("k").unwrap_or(0.0);
            Ok(Metrics::from([("err".to_string(), (mean - target).abs() + k)]))
        },
    )
    .with_extract(|mean: &f64, _config: &Configuration| serde_json::json!({ "mean": mean }))
}

// -------------------------------------------------------------------------
// evaluate
// -------------------------------------------------------------------------

#[test]
fn test_evaluate_success_with_artifact() {
    let data = dataset(20);
    let fold = first_fold(&data);
    let evaluator = CandidateEvaluator::new(Arc::new(mean_learner()), &data);

    let result = evaluator.evaluate(3, &config(1), &fold);
    assert_eq!(result.config_id, 3);
    assert_eq!(result.fold_id, 0);
    assert_eq!(result.fold_label, fold.label);
    assert!(result.metric("err").unwrap() >= 1.0);
    assert!(result.artifact.as_ref().unwrap().get("mean").is_some());
}

#[test]
fn test_extracts_can_be_disabled() {
    let data = dataset(20);
    let fold = first_fold(&data);
    let evaluator = CandidateEvaluator::new(Arc::new(mean_learner()), &data).with_save_extracts(false);
    let result = evaluator.evaluate(0, &config(1), &fold);
    assert!(!result.is_failed());
    assert!(result.artifact.is_none());
}

#[test]
fn test_fit_error_is_recorded() {
    let data = dataset(10);
    let fold = first_fold(&data);
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| Err::<(), _>(CellError::Fit("singular matrix".into())),
        |_: &(), _: &Dataset, _: &Configuration| Ok(Metrics::new()),
    );
    let result = CandidateEvaluator::new(Arc::new(learner), &data).evaluate(0, &config(1), &fold);
    assert_eq!(result.error(), Some(&CellError::Fit("singular matrix".into())));
    assert!(result.metrics().is_none());
}

#[test]
fn test_score_panic_is_recorded() {
    let data = dataset(10);
    let fold = first_fold(&data);
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| Ok(()),
        |_: &(), _: &Dataset, _: &Configuration| -> Result<Metrics, CellError> { panic!("index out of range") },
    );
    let result = CandidateEvaluator::new(Arc::new(learner), &data).evaluate(0, &config(1), &fold);
    match &result.status {
        CellStatus::Failed { error: CellError::Panicked(msg) } => assert!(msg.contains("index out of range")),
        other => panic!("unexpected status {other:?}"),
    }
}

#[test]
fn test_timeout_is_recorded() {
    let data = dataset(10);
    let fold = first_fold(&data);
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        },
        |_: &(), _: &Dataset, _: &Configuration| Ok(Metrics::new()),
    );
    let limit = Duration::from_millis(20);
    let result = CandidateEvaluator::new(Arc::new(learner), &data)
        .with_timeout(Some(limit))
        .evaluate(0, &config(1), &fold);
    assert_eq!(result.error(), Some(&CellError::Timeout(limit)));
}

#[test]
fn test_timeout_path_returns_results_when_fast() {
    let data = dataset(20);
    let fold = first_fold(&data);
    let evaluator = CandidateEvaluator::new(Arc::new(mean_learner()), &data).with_timeout(Some(Duration::from_secs(5)));
    let result = evaluator.evaluate(0, &config(2), &fold);
    assert!(!result.is_failed());
    assert!(result.artifact.is_some());
}

#[test]
fn test_panic_inside_timed_worker_is_recorded() {
    let data = dataset(10);
    let fold = first_fold(&data);
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| -> Result<(), CellError> { panic!("worker boom") },
        |_: &(), _: &Dataset, _: &Configuration| Ok(Metrics::new()),
    );
    let result = CandidateEvaluator::new(Arc::new(learner), &data)
        .with_timeout(Some(Duration::from_secs(5)))
        .evaluate(0, &config(1), &fold);
    assert_eq!(result.error(), Some(&CellError::Panicked("worker boom".into())));
}

// -------------------------------------------------------------------------
// evaluate_group
// -------------------------------------------------------------------------

#[test]
fn test_group_matches_individual_evaluation() {
    let data = dataset(30);
    let folds = VFold::new(3).split(&data).unwrap();
    let evaluator = CandidateEvaluator::new(Arc::new(mean_learner()), &data);
    let members: Vec<(usize, Configuration)> = (0..4).map(|k| (k as usize, config(k))).collect();

    for fold in &folds {
        let grouped = evaluator.evaluate_group(&members, fold);
        assert_eq!(grouped.len(), members.len());
        for ((id, cfg), result) in members.iter().zip(&grouped) {
            let single = evaluator.evaluate(*id, cfg, fold);
            assert_eq!(result.config_id, *id);
            assert_eq!(result.status, single.status);
            assert_eq!(result.artifact, single.artifact);
        }
    }
}

#[test]
fn test_group_fits_once() {
    let data = dataset(20);
    let fold = first_fold(&data);
    let fits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fits);
    let learner = FnLearner::new(
        move |_: &Dataset, _: &Configuration| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        |_: &(), _: &Dataset, config: &Configuration| {
            Ok(Metrics::from([("k".to_string(), config.float("k").unwrap_or(0.0))]))
        },
    )
    .with_submodel("k");

    let members: Vec<(usize, Configuration)> = (0..5).map(|k| (k as usize, config(k))).collect();
    let results = CandidateEvaluator::new(Arc::new(learner), &data).evaluate_group(&members, &fold);
    assert_eq!(fits.load(Ordering::SeqCst), 1);
    let ks: Vec<f64> = results.iter().map(|r| r.metric("k").unwrap()).collect();
    assert_eq!(ks, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_group_fit_failure_fails_every_member() {
    let data = dataset(10);
    let fold = first_fold(&data);
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| Err::<(), _>(CellError::Fit("bad".into())),
        |_: &(), _: &Dataset, _: &Configuration| Ok(Metrics::new()),
    );
    let members = vec![(0, config(1)), (1, config(2))];
    let results = CandidateEvaluator::new(Arc::new(learner), &data).evaluate_group(&members, &fold);
    assert!(results.iter().all(|r| r.is_failed()));
    assert!(CandidateEvaluator::new(Arc::new(mean_learner()), &data).evaluate_group(&[], &fold).is_empty());
}

#[test]
fn test_group_timeout_scales_with_members() {
    let data = dataset(10);
    let fold = first_fold(&data);
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| Ok(()),
        |_: &(), _: &Dataset, config: &Configuration| {
            std::thread::sleep(Duration::from_millis(60));
            Ok(Metrics::from([("k".to_string(), config.float("k").unwrap_or(0.0))]))
        },
    )
    .with_submodel("k");
    let evaluator = CandidateEvaluator::new(Arc::new(learner), &data).with_timeout(Some(Duration::from_millis(150)));

    // Each member alone fits the limit, so the group of four must too.
    let members: Vec<(usize, Configuration)> = (0..4).map(|k| (k as usize, config(k))).collect();
    let results = evaluator.evaluate_group(&members, &fold);
    assert!(results.iter().all(|r| !r.is_failed()), "{:?}", results.iter().map(|r| r.error()).collect::<Vec<_>>());
}

#[test]
fn test_group_timeout_reports_group_budget() {
    let data = dataset(10);
    let fold = first_fold(&data);
    let learner = FnLearner::new(
        |_: &Dataset, _: &Configuration| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        },
        |_: &(), _: &Dataset, _: &Configuration| Ok(Metrics::new()),
    );
    let members = vec![(0, config(1)), (1, config(2)), (2, config(3))];
    let results = CandidateEvaluator::new(Arc::new(learner), &data)
        .with_timeout(Some(Duration::from_millis(20)))
        .evaluate_group(&members, &fold);
    for result in &results {
        assert_eq!(result.error(), Some(&CellError::Timeout(Duration::from_millis(60))));
    }
}
