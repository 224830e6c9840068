//! Built-in learners
//!
//! Two small models that make the engine usable from the command line and
//! give the tests something real to tune. Both standardise their numeric
//! features with statistics of the analysis rows only.

mod knn;
mod ridge;

use ndarray::{Array1, Array2, Axis};

use crate::data::Dataset;
use crate::error::CellError;

pub use knn::{NearestNeighbors, WeightFunc};
pub use ridge::RidgeRegression;

/// Column means and standard deviations of a training matrix
#[derive(Debug, Clone)]
pub(crate) struct Standardizer {
    means: Array1<f64>,
    sds: Array1<f64>,
}

impl Standardizer {
    pub(crate) fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let means = x.sum_axis(Axis(0)) / n;
        let sds = x
            .axis_iter(Axis(1))
            .zip(means.iter())
            .map(|(col, m)| {
                let var = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
                if var > 0.0 {
                    var.sqrt()
                } else {
                    1.0
                }
            })
            .collect();
        Self { means, sds }
    }

    pub(crate) fn apply(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.means) / &self.sds
    }
}

/// Numeric feature matrix, mapping data problems to a cell error of `stage`
pub(crate) fn features(
    data: &Dataset,
    names: &[String],
    stage: fn(String) -> CellError,
) -> Result<Array2<f64>, CellError> {
    data.numeric_matrix(names).map_err(|e| stage(e.to_string()))
}

/// Root mean squared error
pub fn rmse(truth: &[f64], estimate: &[f64]) -> f64 {
    let n = truth.len() as f64;
    (truth.iter().zip(estimate).map(|(t, e)| (t - e).powi(2)).sum::<f64>() / n).sqrt()
}

/// Squared Pearson correlation between truth and estimate. NaN when either
/// side is constant.
pub fn rsq(truth: &[f64], estimate: &[f64]) -> f64 {
    let n = truth.len() as f64;
    let mt = truth.iter().sum::<f64>() / n;
    let me = estimate.iter().sum::<f64>() / n;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (t, e) in truth.iter().zip(estimate) {
        sxy += (t - mt) * (e - me);
        sxx += (t - mt).powi(2);
        syy += (e - me).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy * sxy / (sxx * syy)
}

/// Fraction of matching labels
pub fn accuracy(truth: &[String], estimate: &[String]) -> f64 {
    let hits = truth.iter().zip(estimate).filter(|(t, e)| t == e).count();
    hits as f64 / truth.len() as f64
}
