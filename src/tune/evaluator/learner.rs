//! The fit/score capability supplied by the host

use std::fmt;
use std::marker::PhantomData;

use crate::data::Dataset;
use crate::error::CellError;
use crate::tune::objective::Metrics;
use crate::tune::types::Configuration;

/// A model-fitting capability.
///
/// The search engine never looks inside a fitted model: it fits on the
/// analysis rows of a fold, scores on the assessment rows, and optionally asks
/// for an extraction artifact.
pub trait Learner: Send + Sync + 'static {
    /// Fitted model handed from `fit` to `score` and `extract`
    type Fitted: Send + 'static;

    /// Fit a model on the analysis rows
    fn fit(&self, analysis: &Dataset, config: &Configuration) -> Result<Self::Fitted, CellError>;

    /// Score a fitted model on the assessment rows.
    ///
    /// `config` is the configuration being scored; for sub-model groups it can
    /// differ from the one the model was fitted with in the sub-model
    /// parameter only.
    fn score(
        &self,
        fitted: &Self::Fitted,
        assessment: &Dataset,
        config: &Configuration,
    ) -> Result<Metrics, CellError>;

    /// Opaque artifact kept in the history (coefficients, diagnostics, ...)
    fn extract(&self, _fitted: &Self::Fitted, _config: &Configuration) -> Option<serde_json::Value> {
        None
    }

    /// Parameter whose values can all be scored from a single fit
    fn submodel_parameter(&self) -> Option<&str> {
        None
    }
}

type ExtractFn<M> = Box<dyn Fn(&M, &Configuration) -> serde_json::Value + Send + Sync>;

/// [`Learner`] built from plain closures.
///
/// # Example
///
/// ```
/// use cvtune::tune::{FnLearner, Metrics};
///
/// let learner = FnLearner::new(
///     |data: &cvtune::data::Dataset, _config: &cvtune::tune::Configuration| Ok(data.n_rows()),
///     |n_fit: &usize, _data: &cvtune::data::Dataset, _config: &cvtune::tune::Configuration| {
///         Ok(Metrics::from([("n_fit".to_string(), *n_fit as f64)]))
///     },
/// );
/// # let _ = learner;
/// ```
pub struct FnLearner<M, F, S> {
    fit_fn: F,
    score_fn: S,
    extract_fn: Option<ExtractFn<M>>,
    submodel: Option<String>,
    _model: PhantomData<fn() -> M>,
}

impl<M, F, S> FnLearner<M, F, S>
where
    M: Send + 'static,
    F: Fn(&Dataset, &Configuration) -> Result<M, CellError> + Send + Sync + 'static,
    S: Fn(&M, &Dataset, &Configuration) -> Result<Metrics, CellError> + Send + Sync + 'static,
{
    pub fn new(fit_fn: F, score_fn: S) -> Self {
        Self { fit_fn, score_fn, extract_fn: None, submodel: None, _model: PhantomData }
    }

    /// Attach an extraction function
    pub fn with_extract<E>(mut self, extract_fn: E) -> Self
    where
        E: Fn(&M, &Configuration) -> serde_json::Value + Send + Sync + 'static,
    {
        self.extract_fn = Some(Box::new(extract_fn));
        self
    }

    /// Declare a sub-model parameter
    pub fn with_submodel(mut self, parameter: impl Into<String>) -> Self {
        self.submodel = Some(parameter.into());
        self
    }
}

impl<M, F, S> Learner for FnLearner<M, F, S>
where
    M: Send + 'static,
    F: Fn(&Dataset, &Configuration) -> Result<M, CellError> + Send + Sync + 'static,
    S: Fn(&M, &Dataset, &Configuration) -> Result<Metrics, CellError> + Send + Sync + 'static,
{
    type Fitted = M;

    fn fit(&self, analysis: &Dataset, config: &Configuration) -> Result<M, CellError> {
        (self.fit_fn)(analysis, config)
    }

    fn score(&self, fitted: &M, assessment: &Dataset, config: &Configuration) -> Result<Metrics, CellError> {
        (self.score_fn)(fitted, assessment, config)
    }

    fn extract(&self, fitted: &M, config: &Configuration) -> Option<serde_json::Value> {
        self.extract_fn.as_ref().map(|f| f(fitted, config))
    }

    fn submodel_parameter(&self) -> Option<&str> {
        self.submodel.as_deref()
    }
}

impl<M, F, S> fmt::Debug for FnLearner<M, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLearner")
            .field("extract", &self.extract_fn.is_some())
            .field("submodel", &self.submodel)
            .finish()
    }
}
