//! Gaussian-process surrogate over encoded configurations

use std::f64::consts::PI;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::linalg::{cholesky, cholesky_solve, solve_lower};

/// Length scales tried when fitting, in unit-cube distance
pub const LENGTH_SCALES: [f64; 8] = [0.05, 0.1, 0.2, 0.35, 0.5, 0.75, 1.0, 2.0];

/// Observation noise on the standardised scale
const NOISE: f64 = 1e-4;

/// Surrogate fitting failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurrogateError {
    #[error("no observations to fit")]
    NoObservations,

    #[error("inputs have {got} columns, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("non-finite objective value")]
    NonFinite,

    #[error("kernel matrix is not positive definite for any length scale")]
    NotPositiveDefinite,
}

/// Covariance function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Rbf,
    #[default]
    Matern52,
}

impl Kernel {
    /// Unit-variance covariance at squared distance `d2`
    pub fn eval(&self, d2: f64, length_scale: f64) -> f64 {
        match self {
            Kernel::Rbf => (-0.5 * d2 / (length_scale * length_scale)).exp(),
            Kernel::Matern52 => {
                let r = 5.0_f64.sqrt() * d2.sqrt() / length_scale;
                (1.0 + r + r * r / 3.0) * (-r).exp()
            }
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Fitted Gaussian process.
///
/// The targets are standardised before fitting and predictions are mapped
/// back to the original scale. A new process is fitted from the complete set
/// of observations each time; there is no incremental update.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    kernel: Kernel,
    length_scale: f64,
    x: Vec<Vec<f64>>,
    chol: Array2<f64>,
    alpha: Array1<f64>,
    y_mean: f64,
    y_std: f64,
    log_likelihood: f64,
}

impl GaussianProcess {
    /// Fit on rows of `x` with targets `y`, choosing the length scale from
    /// [`LENGTH_SCALES`] by maximum marginal likelihood.
    pub fn fit(x: &[Vec<f64>], y: &[f64], kernel: Kernel) -> Result<Self, SurrogateError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(SurrogateError::NoObservations);
        }
        let dims = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != dims) {
            return Err(SurrogateError::DimensionMismatch { expected: dims, got: row.len() });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(SurrogateError::NonFinite);
        }

        let n = y.len() as f64;
        let y_mean = y.iter().sum::<f64>() / n;
        let var = y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>() / n;
        let y_std = if var > 0.0 { var.sqrt() } else { 1.0 };
        let z: Array1<f64> = y.iter().map(|v| (v - y_mean) / y_std).collect();

        LENGTH_SCALES
            .iter()
            .filter_map(|&ls| Self::fit_with(x, &z, kernel, ls, y_mean, y_std))
            .max_by(|a, b| a.log_likelihood.total_cmp(&b.log_likelihood))
            .ok_or(SurrogateError::NotPositiveDefinite)
    }

    fn fit_with(
        x: &[Vec<f64>],
        z: &Array1<f64>,
        kernel: Kernel,
        length_scale: f64,
        y_mean: f64,
        y_std: f64,
    ) -> Option<Self> {
        let n = x.len();
        let k = Array2::from_shape_fn((n, n), |(i, j)| {
            let cov = kernel.eval(squared_distance(&x[i], &x[j]), length_scale);
            if i == j {
                cov + NOISE
            } else {
                cov
            }
        });
        let chol = cholesky(&k)?;
        let alpha = cholesky_solve(&chol, z);
        let log_det: f64 = chol.diag().iter().map(|d| d.ln()).sum();
        let log_likelihood = -0.5 * z.dot(&alpha) - log_det - 0.5 * n as f64 * (2.0 * PI).ln();
        if !log_likelihood.is_finite() {
            return None;
        }
        Some(Self { kernel, length_scale, x: x.to_vec(), chol, alpha, y_mean, y_std, log_likelihood })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Length scale picked at fit time
    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }

    /// Log marginal likelihood of the standardised targets
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Predictive mean and standard deviation at `point`
    pub fn predict(&self, point: &[f64]) -> (f64, f64) {
        let k_star: Array1<f64> = self
            .x
            .iter()
            .map(|xi| self.kernel.eval(squared_distance(xi, point), self.length_scale))
            .collect();
        let mean = k_star.dot(&self.alpha);
        let v = solve_lower(&self.chol, &k_star);
        let var = (1.0 - v.dot(&v)).max(0.0);
        (self.y_mean + mean * self.y_std, var.sqrt() * self.y_std)
    }
}

// -------------------------------------------------------------------------
// Standard normal helpers
// -------------------------------------------------------------------------

/// Standard normal density
pub(crate) fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal CDF
pub(crate) fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function (Abramowitz and Stegun 7.1.26)
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
