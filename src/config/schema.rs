//! YAML schema for declarative tuning runs
//!
//! ```yaml
//! data:
//!   path: cells.json
//!   features: [x1, x2]
//!   outcome: class
//! model:
//!   type: nearest_neighbors
//! folds:
//!   v: 5
//!   strata: class
//! space:
//!   - name: neighbors
//!     type: quantitative
//!     low: 1
//!     high: 25
//!     integer: true
//!   - name: weight_func
//!     type: qualitative
//!     values: [rectangular, triangular]
//!     default: rectangular
//! objective:
//!   metric: accuracy
//!   direction: maximize
//! search:
//!   method: bayes
//!   iterations: 20
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TuneError};
use crate::resample::VFold;
use crate::tune::{
    Acquisition, Configuration, HyperparameterSpace, Kernel, Objective, Parameter, ParameterDomain,
    TuneControl,
};

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

/// Complete tuning specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneSpec {
    /// Dataset location and roles of its columns
    pub data: DataSpec,

    /// Built-in learner to tune
    pub model: ModelSpec,

    /// Resampling scheme
    #[serde(default)]
    pub folds: FoldSpec,

    /// Tunable parameters, in declaration order
    pub space: Vec<ParamSpec>,

    /// Metric to optimise
    pub objective: Objective,

    /// Search strategy
    pub search: SearchSpec,

    /// Run-time controls
    #[serde(default)]
    pub control: ControlSpec,
}

/// Dataset section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    /// JSON dataset; may be overridden on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Numeric predictor columns
    pub features: Vec<String>,

    /// Outcome column
    pub outcome: String,
}

/// Built-in learners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    NearestNeighbors,
    RidgeRegression,
}

impl ModelSpec {
    /// Parameters the learner understands
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            ModelSpec::NearestNeighbors => &["neighbors", "weight_func", "dist_power"],
            ModelSpec::RidgeRegression => &["penalty"],
        }
    }

    /// Metrics the learner can report
    pub fn metrics(&self) -> &'static [&'static str] {
        match self {
            ModelSpec::NearestNeighbors => &["accuracy", "rmse", "rsq"],
            ModelSpec::RidgeRegression => &["rmse", "rsq"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelSpec::NearestNeighbors => "nearest_neighbors",
            ModelSpec::RidgeRegression => "ridge_regression",
        }
    }
}

/// V-fold cross-validation section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldSpec {
    #[serde(default = "FoldSpec::default_v")]
    pub v: usize,

    #[serde(default = "FoldSpec::default_repeats")]
    pub repeats: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strata: Option<String>,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl FoldSpec {
    fn default_v() -> usize {
        10
    }

    fn default_repeats() -> usize {
        1
    }

    /// Fold generator for this section
    pub fn vfold(&self) -> VFold {
        let vfold = VFold::new(self.v).with_seed(self.seed).with_repeats(self.repeats);
        match &self.strata {
            Some(column) => vfold.with_strata(column.clone()),
            None => vfold,
        }
    }
}

impl Default for FoldSpec {
    fn default() -> Self {
        Self { v: Self::default_v(), repeats: Self::default_repeats(), strata: None, seed: default_seed() }
    }
}

/// One tunable parameter: a name, an optional label and a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(flatten)]
    pub domain: ParameterDomain,
}

/// How a grid search builds its candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridDesign {
    #[default]
    Regular,
    Random,
    LatinHypercube,
}

/// Search strategy section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SearchSpec {
    Grid {
        #[serde(default)]
        design: GridDesign,
        /// Values per quantitative parameter for regular grids
        #[serde(default = "SearchSpec::default_levels")]
        levels: usize,
        /// Number of points for random and Latin hypercube grids
        #[serde(default = "SearchSpec::default_size")]
        size: usize,
        /// Explicit configurations; overrides `design`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        configs: Option<Vec<Configuration>>,
    },
    Bayes {
        #[serde(default = "SearchSpec::default_n_initial")]
        n_initial: usize,
        #[serde(default = "SearchSpec::default_iterations")]
        iterations: usize,
        #[serde(default = "SearchSpec::default_no_improve")]
        no_improve: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uncertain: Option<usize>,
        #[serde(default = "SearchSpec::default_n_candidates")]
        n_candidates: usize,
        #[serde(default)]
        acquisition: Acquisition,
        #[serde(default)]
        kernel: Kernel,
        /// Explicit initial design instead of a Latin hypercube
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial: Option<Vec<Configuration>>,
    },
}

impl SearchSpec {
    fn default_levels() -> usize {
        3
    }

    fn default_size() -> usize {
        10
    }

    fn default_n_initial() -> usize {
        5
    }

    fn default_iterations() -> usize {
        10
    }

    fn default_no_improve() -> usize {
        10
    }

    fn default_n_candidates() -> usize {
        500
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchSpec::Grid { .. } => "grid",
            SearchSpec::Bayes { .. } => "bayes",
        }
    }
}

/// Run-time control section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Per-cell time limit in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_true")]
    pub save_extracts: bool,

    #[serde(default = "default_true")]
    pub submodels: bool,
}

impl Default for ControlSpec {
    fn default() -> Self {
        Self {
            verbose: false,
            parallel: true,
            timeout_secs: None,
            seed: default_seed(),
            save_extracts: true,
            submodels: true,
        }
    }
}

impl ControlSpec {
    /// Library controls for this section
    pub fn to_control(&self) -> TuneControl {
        let control = TuneControl::new()
            .with_verbose(self.verbose)
            .with_parallel(self.parallel)
            .with_seed(self.seed)
            .with_save_extracts(self.save_extracts)
            .with_submodels(self.submodels);
        match self.timeout_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 => control.with_timeout(Duration::from_secs_f64(secs)),
            _ => control,
        }
    }
}

impl TuneSpec {
    /// Parse a YAML specification
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| TuneError::Parse { path: PathBuf::from("<string>"), message: e.to_string() })
    }

    /// Load a YAML specification from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TuneError::io(format!("reading spec {}", path.display()), e))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TuneError::Parse { path: path.to_path_buf(), message: e.to_string() })
    }

    /// Serialise back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| TuneError::Config { field: "spec".into(), message: e.to_string() })
    }

    /// Build the search space, validating every domain
    pub fn hyperparameter_space(&self) -> Result<HyperparameterSpace> {
        let mut space = HyperparameterSpace::new();
        for param in &self.space {
            let mut p = Parameter::new(param.name.clone(), param.domain.clone());
            if let Some(label) = &param.label {
                p = p.with_label(label.clone());
            }
            space.add_parameter(p)?;
        }
        Ok(space)
    }
}
