//! Parameter value and domain types

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::transform::Transform;
use crate::error::{Result, TuneError};

/// Relative tolerance used when checking values against natural bounds, so
/// that round trips through a transform do not reject boundary values.
const BOUND_TOLERANCE: f64 = 1e-9;

/// Parameter value (drawn from a domain)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Categorical(String),
}

impl ParameterValue {
    /// Get as float (converts int to float if needed)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            ParameterValue::Categorical(_) => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            ParameterValue::Float(v) => Some(*v as i64),
            ParameterValue::Categorical(_) => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Categorical(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Float(v) => write!(f, "{v}"),
            ParameterValue::Int(v) => write!(f, "{v}"),
            ParameterValue::Categorical(s) => write!(f, "{s}"),
        }
    }
}

/// Domain of a tunable parameter.
///
/// Quantitative bounds are declared in transformed units: a `Log10`
/// parameter with `low = -3, high = 0` spans natural values `0.001..=1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterDomain {
    Quantitative {
        low: f64,
        high: f64,
        #[serde(default)]
        transform: Transform,
        #[serde(default)]
        integer: bool,
    },
    Qualitative { values: Vec<String>, default: String },
}

impl ParameterDomain {
    /// Real-valued range without transform
    pub fn double(low: f64, high: f64) -> Self {
        Self::Quantitative { low, high, transform: Transform::Identity, integer: false }
    }

    /// Integer range without transform
    pub fn integer(low: i64, high: i64) -> Self {
        Self::Quantitative {
            low: low as f64,
            high: high as f64,
            transform: Transform::Identity,
            integer: true,
        }
    }

    /// Real-valued range declared in log10 units
    pub fn log10(low: f64, high: f64) -> Self {
        Self::transformed(low, high, Transform::Log10)
    }

    /// Real-valued range declared in the units of `transform`
    pub fn transformed(low: f64, high: f64, transform: Transform) -> Self {
        Self::Quantitative { low, high, transform, integer: false }
    }

    /// Finite set of values with a designated default
    pub fn qualitative<S: Into<String>>(values: Vec<S>, default: impl Into<String>) -> Self {
        Self::Qualitative {
            values: values.into_iter().map(Into::into).collect(),
            default: default.into(),
        }
    }

    /// Check the declaration itself.
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            ParameterDomain::Quantitative { low, high, transform, integer } => {
                if !(low.is_finite() && high.is_finite()) || low >= high {
                    return Err(TuneError::InvalidRange { name: name.to_string(), low: *low, high: *high });
                }
                if !transform.accepts_transformed(*low) || !transform.accepts_transformed(*high) {
                    return Err(TuneError::InvalidDomain {
                        name: name.to_string(),
                        message: format!("bounds [{low}, {high}] are outside the {transform:?} domain"),
                    });
                }
                if *integer {
                    let (lo, hi) = self.integer_bounds();
                    if lo > hi {
                        return Err(TuneError::InvalidDomain {
                            name: name.to_string(),
                            message: "range contains no integer values".into(),
                        });
                    }
                }
                Ok(())
            }
            ParameterDomain::Qualitative { values, default } => {
                if values.is_empty() {
                    return Err(TuneError::InvalidDomain {
                        name: name.to_string(),
                        message: "no values".into(),
                    });
                }
                let mut sorted = values.clone();
                sorted.sort();
                sorted.dedup();
                if sorted.len() != values.len() {
                    return Err(TuneError::InvalidDomain {
                        name: name.to_string(),
                        message: "duplicate values".into(),
                    });
                }
                if !values.contains(default) {
                    return Err(TuneError::InvalidDomain {
                        name: name.to_string(),
                        message: format!("default '{default}' is not one of the values"),
                    });
                }
                Ok(())
            }
        }
    }

    /// Value used when a configuration leaves the parameter out. Only
    /// qualitative domains have one.
    pub fn default_value(&self) -> Option<ParameterValue> {
        match self {
            ParameterDomain::Qualitative { default, .. } => Some(ParameterValue::Categorical(default.clone())),
            ParameterDomain::Quantitative { .. } => None,
        }
    }

    /// Bounds in natural units (quantitative only)
    pub fn natural_bounds(&self) -> Option<(f64, f64)> {
        match self {
            ParameterDomain::Quantitative { low, high, transform, .. } => {
                Some((transform.inverse(*low), transform.inverse(*high)))
            }
            ParameterDomain::Qualitative { .. } => None,
        }
    }

    fn integer_bounds(&self) -> (i64, i64) {
        let (lo, hi) = self.natural_bounds().unwrap_or((0.0, 0.0));
        let lo = (lo - lo.abs() * BOUND_TOLERANCE).ceil() as i64;
        let hi = (hi + hi.abs() * BOUND_TOLERANCE).floor() as i64;
        (lo, hi)
    }

    /// Number of surrogate input dimensions this parameter occupies
    pub fn dims(&self) -> usize {
        match self {
            ParameterDomain::Quantitative { .. } => 1,
            ParameterDomain::Qualitative { values, .. } => values.len(),
        }
    }

    /// Map a coordinate in `[0, 1]` (transformed units, rescaled) to a value.
    pub fn from_unit(&self, u: f64) -> ParameterValue {
        let u = u.clamp(0.0, 1.0);
        match self {
            ParameterDomain::Quantitative { low, high, transform, integer } => {
                let natural = transform.inverse(low + u * (high - low));
                if *integer {
                    let (lo, hi) = self.integer_bounds();
                    ParameterValue::Int((natural.round() as i64).clamp(lo, hi))
                } else {
                    let (lo, hi) = (transform.inverse(*low), transform.inverse(*high));
                    ParameterValue::Float(natural.clamp(lo, hi))
                }
            }
            ParameterDomain::Qualitative { values, .. } => {
                let idx = ((u * values.len() as f64).floor() as usize).min(values.len() - 1);
                ParameterValue::Categorical(values[idx].clone())
            }
        }
    }

    /// Encode a value as surrogate inputs: the rescaled transformed coordinate
    /// for quantitative domains, a one-hot vector for qualitative ones.
    pub fn encode(&self, value: &ParameterValue) -> Option<Vec<f64>> {
        match self {
            ParameterDomain::Quantitative { low, high, transform, .. } => {
                let x = value.as_float()?;
                Some(vec![((transform.apply(x) - low) / (high - low)).clamp(0.0, 1.0)])
            }
            ParameterDomain::Qualitative { values, .. } => {
                let s = value.as_str()?;
                let idx = values.iter().position(|v| v == s)?;
                let mut one_hot = vec![0.0; values.len()];
                one_hot[idx] = 1.0;
                Some(one_hot)
            }
        }
    }

    /// `n` values regularly spaced in transformed units. Integer domains
    /// drop duplicates created by rounding; qualitative domains return (up to)
    /// their first `n` values.
    pub fn value_seq(&self, n: usize) -> Vec<ParameterValue> {
        match self {
            ParameterDomain::Quantitative { .. } => {
                let mut values: Vec<ParameterValue> = match n {
                    0 => Vec::new(),
                    1 => vec![self.from_unit(0.0)],
                    _ => (0..n).map(|i| self.from_unit(i as f64 / (n - 1) as f64)).collect(),
                };
                values.dedup();
                values
            }
            ParameterDomain::Qualitative { values, .. } => values
                .iter()
                .take(n)
                .map(|v| ParameterValue::Categorical(v.clone()))
                .collect(),
        }
    }

    /// Sample a random value from this domain
    pub fn sample<R: Rng>(&self, rng: &mut R) -> ParameterValue {
        self.from_unit(rng.random::<f64>())
    }

    /// Check if a value is valid for this domain
    pub fn is_valid(&self, value: &ParameterValue) -> bool {
        match (self, value) {
            (ParameterDomain::Quantitative { integer: true, .. }, ParameterValue::Int(v)) => {
                let (lo, hi) = self.integer_bounds();
                (lo..=hi).contains(v)
            }
            (ParameterDomain::Quantitative { integer: false, .. }, ParameterValue::Float(_))
            | (ParameterDomain::Quantitative { integer: false, .. }, ParameterValue::Int(_)) => {
                let Some(x) = value.as_float() else { return false };
                let Some((lo, hi)) = self.natural_bounds() else { return false };
                let slack = (hi - lo).abs() * BOUND_TOLERANCE;
                x.is_finite() && x >= lo - slack && x <= hi + slack
            }
            (ParameterDomain::Qualitative { values, .. }, ParameterValue::Categorical(s)) => {
                values.contains(s)
            }
            _ => false,
        }
    }
}

/// A named, labelled tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub label: String,
    pub domain: ParameterDomain,
}

impl Parameter {
    pub fn new(name: impl Into<String>, domain: ParameterDomain) -> Self {
        let name = name.into();
        Self { label: name.clone(), name, domain }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            ParameterDomain::Quantitative { low, high, transform, integer } => {
                let kind = if *integer { "integer" } else { "double" };
                write!(f, "{} ({kind}, [{low}, {high}]", self.label)?;
                if *transform != Transform::Identity {
                    write!(f, " in {transform:?} units")?;
                }
                write!(f, ")")
            }
            ParameterDomain::Qualitative { values, default } => {
                write!(f, "{} ({} values, default '{default}')", self.label, values.len())
            }
        }
    }
}
