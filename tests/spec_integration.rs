//! Tuning Spec Integration Tests
//!
//! Loads YAML specs and JSON datasets from disk and runs them the way the
//! binary does.

use std::path::{Path, PathBuf};

use cvtune::{
    collect_extracts, collect_metrics, run_spec, select_best, select_by_one_std_err, validate_spec, CancelToken,
    Column, Dataset, Direction, MetricsTable, SearchState, TuneSpec,
};
use tempfile::TempDir;

/// Two noisy clusters in (x1, x2) with a class label
fn write_clusters(dir: &Path) -> PathBuf {
    let n = 60;
    let x1: Vec<f64> = (0..n).map(|i| if i % 3 == 0 { 4.0 } else { 0.0 } + (i as f64 * 1.7).sin()).collect();
    let x2: Vec<f64> = (0..n).map(|i| (i as f64 * 0.9).cos()).collect();
    let class: Vec<&str> = (0..n).map(|i| if i % 3 == 0 { "rare" } else { "common" }).collect();
    let data =
        Dataset::new(vec![Column::numeric("x1", x1), Column::numeric("x2", x2), Column::categorical("class", class)])
            .unwrap();
    let path = dir.join("clusters.json");
    std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();
    path
}

fn write_spec(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("spec.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

const KNN_GRID: &str = r#"
data:
  path: clusters.json
  features: [x1, x2]
  outcome: class
model:
  type: nearest_neighbors
folds:
  v: 5
  strata: class
  seed: 11
space:
  - name: neighbors
    type: quantitative
    low: 1
    high: 15
    integer: true
  - name: weight_func
    type: qualitative
    values: [rectangular, triangular, inverse]
    default: rectangular
objective:
  metric: accuracy
  direction: maximize
search:
  method: grid
  levels: 4
"#;

const KNN_BAYES: &str = r#"
data:
  path: clusters.json
  features: [x1, x2]
  outcome: class
model:
  type: nearest_neighbors
folds:
  v: 4
space:
  - name: neighbors
    type: quantitative
    low: 1
    high: 20
    integer: true
  - name: dist_power
    type: quantitative
    low: 1
    high: 2
objective:
  metric: accuracy
  direction: maximize
search:
  method: bayes
  n_initial: 4
  iterations: 5
  no_improve: 3
  acquisition:
    type: confidence_bound
    kappa: 0.5
"#;

fn load(dir: &TempDir, yaml: &str) -> (TuneSpec, Dataset) {
    let data_path = write_clusters(dir.path());
    let spec = TuneSpec::from_path(&write_spec(dir.path(), yaml)).unwrap();
    (spec, Dataset::from_path(&data_path).unwrap())
}

#[test]
fn knn_grid_spec_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (spec, data) = load(&dir, KNN_GRID);
    validate_spec(&spec).unwrap();

    let history = run_spec(&spec, &data, CancelToken::new()).unwrap();
    // 4 neighbor levels x 3 weight functions, 5 folds each
    assert_eq!(history.n_configurations(), 12);
    assert_eq!(history.len(), 60);
    assert_eq!(history.failures().count(), 0);

    let MetricsTable::Summarized(rows) = collect_metrics(&history, true) else {
        panic!("expected summarized table");
    };
    assert_eq!(rows.len(), 12);
    assert!(rows.iter().all(|r| (0.0..=1.0).contains(&r.mean)));

    let best = select_best(&history, "accuracy", Direction::Maximize).unwrap();
    let simple = select_by_one_std_err(&history, "accuracy", Direction::Maximize, "-neighbors").unwrap();
    assert!(simple.int("neighbors").unwrap() >= 1);
    assert!(best.str("weight_func").is_some());
}

#[test]
fn knn_bayes_spec_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (spec, data) = load(&dir, KNN_BAYES);

    let history = run_spec(&spec, &data, CancelToken::new()).unwrap();
    assert!(history.n_configurations() >= 4);
    assert!(history.n_configurations() <= 9);
    assert!(matches!(history.final_state(), Some(SearchState::Converged | SearchState::BudgetExhausted)));
    assert!(history.iterations() <= 5);
}

#[test]
fn ridge_spec_saves_coefficients() {
    let dir = TempDir::new().unwrap();
    let n = 40;
    let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.25).collect();
    let y: Vec<f64> = x.iter().map(|v| 0.5 - 2.0 * v).collect();
    let data = Dataset::new(vec![Column::numeric("x", x), Column::numeric("y", y)]).unwrap();

    let spec = TuneSpec::from_yaml_str(
        r#"
data: {features: [x], outcome: y}
model: {type: ridge_regression}
folds: {v: 4}
space:
  - {name: penalty, type: quantitative, low: -5, high: -1, transform: log10}
objective: {metric: rmse, direction: minimize}
search: {method: grid, design: latin_hypercube, size: 3}
"#,
    )
    .unwrap();

    let history = run_spec(&spec, &data, CancelToken::new()).unwrap();
    let extracts = collect_extracts(&history);
    assert_eq!(extracts.len(), 12);
    let slope = extracts[0].artifact["coefficients"]["x"].as_f64().unwrap();
    assert!(slope < 0.0);
}

#[test]
fn invalid_spec_is_rejected_before_running() {
    let dir = TempDir::new().unwrap();
    let (mut spec, data) = load(&dir, KNN_GRID);
    spec.objective.metric = "auc".into();
    let err = run_spec(&spec, &data, CancelToken::new()).unwrap_err();
    assert!(err.is_configuration_error());
}
