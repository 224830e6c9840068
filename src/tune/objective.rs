//! Metric names, optimisation direction and the search objective

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Named metric values produced by scoring one fitted model
pub type Metrics = BTreeMap<String, f64>;

/// Whether larger or smaller metric values are better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Whether `candidate` is strictly better than `incumbent`
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }

    /// Sign that turns the metric into a quantity to maximise
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Maximize => 1.0,
            Direction::Minimize => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Maximize => write!(f, "maximize"),
            Direction::Minimize => write!(f, "minimize"),
        }
    }
}

/// The metric a search optimises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub metric: String,
    pub direction: Direction,
}

impl Objective {
    pub fn maximize(metric: impl Into<String>) -> Self {
        Self { metric: metric.into(), direction: Direction::Maximize }
    }

    pub fn minimize(metric: impl Into<String>) -> Self {
        Self { metric: metric.into(), direction: Direction::Minimize }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction, self.metric)
    }
}
