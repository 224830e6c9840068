//! Cross-validated hyperparameter search.
//!
//! This crate provides tools for:
//! - V-fold (optionally repeated and stratified) resampling of a dataset
//! - Evaluating candidate configurations on every fold with failure isolation
//! - Exhaustive search over regular, random and Latin hypercube grids
//! - Sequential Bayesian search with a Gaussian-process surrogate
//! - Aggregating, ranking and selecting configurations from the search history
//!
//! Models plug in through the [`Learner`] trait; [`learners`] ships two
//! built-in ones used by the `cvtune` binary and its YAML specs.
//!
//! # Toyota Way Principles
//!
//! - **Jidoka**: A failing fit stops only its own cell, never the search
//! - **Muda Elimination**: Sub-model fits and early convergence avoid wasted evaluations
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cvtune::{
//!     collect_metrics, grid_regular, select_best, Dataset, Direction, GridSearch, HyperparameterSpace,
//!     NearestNeighbors, Objective, ParameterDomain, VFold,
//! };
//!
//! # fn main() -> cvtune::Result<()> {
//! let data = Dataset::from_path(std::path::Path::new("cells.json"))?;
//! let folds = VFold::new(5).with_strata("class").split(&data)?;
//!
//! let space = HyperparameterSpace::new().with("neighbors", ParameterDomain::integer(1, 15))?;
//! let grid = grid_regular(&space, 5)?;
//! let learner = Arc::new(NearestNeighbors::new(vec!["x1".into(), "x2".into()], "class"));
//!
//! let history = GridSearch::new(learner, space, grid, Objective::maximize("accuracy"))?.run(&data, &folds)?;
//! println!("{}", collect_metrics(&history, true).to_table());
//! let _best = select_best(&history, "accuracy", Direction::Maximize)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod learners;
pub mod resample;
pub mod tune;

pub(crate) mod linalg;

pub use config::{run_spec, validate_spec, TuneSpec};
pub use data::{Column, ColumnData, Dataset};
pub use error::{CellError, Result, TuneError};
pub use learners::{NearestNeighbors, RidgeRegression, WeightFunc};
pub use resample::{Fold, VFold};
pub use tune::{
    collect_extracts, collect_metrics, collect_notes, grid_latin_hypercube, grid_random, grid_regular,
    select_best, select_by_one_std_err, show_best, Acquisition, BayesSearch, CancelToken, CandidateEvaluator,
    CellStatus, Configuration, Direction, EvaluationResult, FnLearner, GridSearch, HyperparameterSpace, Kernel,
    Learner, Metrics, MetricsTable, Objective, Parameter, ParameterDomain, ParameterValue, SearchHistory,
    SearchState, TradeOff, Transform, TuneControl,
};
