//! Monotonic parameter transforms

use serde::{Deserialize, Serialize};

/// Monotonic transform between natural parameter units and the units in which
/// ranges are declared, grids are spaced and the surrogate is fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Identity,
    Log10,
    Log2,
    Ln,
    Sqrt,
}

impl Transform {
    /// Natural units → transformed units
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Transform::Identity => x,
            Transform::Log10 => x.log10(),
            Transform::Log2 => x.log2(),
            Transform::Ln => x.ln(),
            Transform::Sqrt => x.sqrt(),
        }
    }

    /// Transformed units → natural units
    pub fn inverse(&self, t: f64) -> f64 {
        match self {
            Transform::Identity => t,
            Transform::Log10 => 10f64.powf(t),
            Transform::Log2 => 2f64.powf(t),
            Transform::Ln => t.exp(),
            Transform::Sqrt => t * t,
        }
    }

    /// Whether natural value `x` lies in the transform's domain
    pub fn accepts(&self, x: f64) -> bool {
        match self {
            Transform::Identity => x.is_finite(),
            Transform::Log10 | Transform::Log2 | Transform::Ln => x.is_finite() && x > 0.0,
            Transform::Sqrt => x.is_finite() && x >= 0.0,
        }
    }

    /// Whether transformed value `t` maps back to a valid natural value
    pub(crate) fn accepts_transformed(&self, t: f64) -> bool {
        match self {
            Transform::Sqrt => t.is_finite() && t >= 0.0,
            _ => t.is_finite(),
        }
    }
}
