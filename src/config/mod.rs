//! Declarative YAML tuning specifications
//!
//! A [`TuneSpec`] names a dataset, a built-in learner, a resampling scheme, a
//! search space and a search strategy. [`validate_spec`] checks it up front;
//! [`run_spec`] executes it.

mod runner;
mod schema;
mod validate;


pub use runner::run_spec;
pub use schema::{ControlSpec, DataSpec, FoldSpec, GridDesign, ModelSpec, ParamSpec, SearchSpec, TuneSpec};
pub use validate::validate_spec;
