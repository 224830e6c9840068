//! Hyperparameter search
//!
//! - [`types`]: search spaces, parameter domains and configurations
//! - [`grid`]: regular, random and Latin hypercube candidate grids
//! - [`evaluator`]: the [`Learner`] capability and per-cell evaluation
//! - [`grid_search`] / [`bayes`]: the two search drivers
//! - [`collect`]: metric tables and selection over a [`SearchHistory`]

pub mod bayes;
pub mod collect;
pub mod control;
pub mod evaluator;
pub mod grid;
pub mod grid_search;
pub mod history;
pub mod objective;
pub mod types;

pub use bayes::{Acquisition, BayesSearch, GaussianProcess, Kernel, TradeOff};
pub use collect::{
    collect_extracts, collect_metrics, collect_notes, select_best, select_by_one_std_err, show_best,
    ExtractRecord, MetricRecord, MetricSummary, MetricsTable, NoteRecord,
};
pub use control::{CancelToken, TuneControl};
pub use evaluator::{CandidateEvaluator, FnLearner, Learner};
pub use grid::{grid_latin_hypercube, grid_random, grid_regular};
pub use grid_search::GridSearch;
pub use history::{CellStatus, EvaluationResult, SearchHistory, SearchState};
pub use objective::{Direction, Metrics, Objective};
pub use types::{Configuration, HyperparameterSpace, Parameter, ParameterDomain, ParameterValue, Transform};
