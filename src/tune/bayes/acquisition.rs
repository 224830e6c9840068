//! Acquisition functions and their exploration trade-off

use serde::{Deserialize, Serialize};

use super::gp::{normal_cdf, normal_pdf};

/// Exploration/exploitation trade-off as a function of the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeOff {
    Constant { value: f64 },
    /// `limit + (start - limit) * exp(-(iter - 1) * slope)`
    ExpoDecay { start: f64, limit: f64, slope: f64 },
}

impl Default for TradeOff {
    fn default() -> Self {
        TradeOff::Constant { value: 0.0 }
    }
}

impl TradeOff {
    pub fn constant(value: f64) -> Self {
        TradeOff::Constant { value }
    }

    pub fn expo_decay(start: f64, limit: f64, slope: f64) -> Self {
        TradeOff::ExpoDecay { start, limit, slope }
    }

    /// Trade-off at 1-based iteration `iter`
    pub fn value(&self, iter: usize) -> f64 {
        match *self {
            TradeOff::Constant { value } => value,
            TradeOff::ExpoDecay { start, limit, slope } => {
                let steps = iter.saturating_sub(1) as f64;
                limit + (start - limit) * (-steps * slope).exp()
            }
        }
    }
}

/// Scores a candidate from its predictive distribution. All functions assume
/// larger objective values are better; minimised metrics are negated before
/// they reach the surrogate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Acquisition {
    ExpectedImprovement {
        #[serde(default)]
        trade_off: TradeOff,
    },
    ProbabilityOfImprovement {
        #[serde(default)]
        trade_off: TradeOff,
    },
    ConfidenceBound { kappa: f64 },
}

impl Default for Acquisition {
    fn default() -> Self {
        Acquisition::ExpectedImprovement { trade_off: TradeOff::default() }
    }
}

impl Acquisition {
    /// Acquisition value of a candidate with predictive `mean` and `sd`,
    /// given the incumbent `best` at iteration `iter`.
    pub fn score(&self, mean: f64, sd: f64, best: f64, iter: usize) -> f64 {
        match self {
            Acquisition::ExpectedImprovement { trade_off } => {
                let delta = mean - best - trade_off.value(iter);
                if sd <= 0.0 {
                    return delta.max(0.0);
                }
                let z = delta / sd;
                delta * normal_cdf(z) + sd * normal_pdf(z)
            }
            Acquisition::ProbabilityOfImprovement { trade_off } => {
                let delta = mean - best - trade_off.value(iter);
                if sd <= 0.0 {
                    return if delta > 0.0 { 1.0 } else { 0.0 };
                }
                normal_cdf(delta / sd)
            }
            Acquisition::ConfidenceBound { kappa } => mean + kappa * sd,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Acquisition::ExpectedImprovement { .. } => "exp_improve",
            Acquisition::ProbabilityOfImprovement { .. } => "prob_improve",
            Acquisition::ConfidenceBound { .. } => "conf_bound",
        }
    }
}
