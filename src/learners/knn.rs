//! Weighted k-nearest-neighbour classification and regression

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::{accuracy, features, rmse, rsq, Standardizer};
use crate::data::{ColumnData, Dataset};
use crate::error::CellError;
use crate::tune::objective::Metrics;
use crate::tune::types::Configuration;
use crate::tune::evaluator::Learner;

const DEFAULT_NEIGHBORS: i64 = 5;

/// Kernel weighting neighbours by distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightFunc {
    Rectangular,
    Triangular,
    Inverse,
}

impl WeightFunc {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rectangular" => Some(WeightFunc::Rectangular),
            "triangular" => Some(WeightFunc::Triangular),
            "inverse" => Some(WeightFunc::Inverse),
            _ => None,
        }
    }

    /// Weight of a neighbour at `distance`, where `scale` is the distance of
    /// the first neighbour outside the k nearest.
    fn weight(&self, distance: f64, scale: f64) -> f64 {
        match self {
            WeightFunc::Rectangular => 1.0,
            WeightFunc::Triangular => {
                if scale > 0.0 {
                    (1.0 - distance / scale).max(1e-6)
                } else {
                    1.0
                }
            }
            WeightFunc::Inverse => 1.0 / (distance + 1e-6),
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Class(Vec<String>),
    Numeric(Vec<f64>),
}

/// Training rows kept by a fitted model
#[derive(Debug, Clone)]
pub struct KnnModel {
    scaler: Standardizer,
    x: Array2<f64>,
    outcome: Outcome,
}

/// k-nearest neighbours over numeric features.
///
/// A categorical outcome makes it a classifier scored by `accuracy`; a
/// numeric one a regressor scored by `rmse` and `rsq`. Tunable parameters:
/// `neighbors` (default 5), `weight_func` (default rectangular) and
/// `dist_power` (Minkowski exponent, default 2).
///
/// Fitting only stores the standardised training rows, so every value of
/// `neighbors` can be scored from the same fit.
#[derive(Debug, Clone)]
pub struct NearestNeighbors {
    features: Vec<String>,
    outcome: String,
}

impl NearestNeighbors {
    pub fn new(features: Vec<String>, outcome: impl Into<String>) -> Self {
        Self { features, outcome: outcome.into() }
    }
}

struct Settings {
    neighbors: usize,
    weight_func: WeightFunc,
    dist_power: f64,
}

fn settings(config: &Configuration, stage: fn(String) -> CellError) -> Result<Settings, CellError> {
    let neighbors = config.int("neighbors").unwrap_or(DEFAULT_NEIGHBORS);
    if neighbors < 1 {
        return Err(stage(format!("neighbors must be positive, got {neighbors}")));
    }
    let weight_func = match config.str("weight_func") {
        None => WeightFunc::Rectangular,
        Some(name) => WeightFunc::parse(name).ok_or_else(|| stage(format!("unknown weight_func '{name}'")))?,
    };
    let dist_power = config.float("dist_power").unwrap_or(2.0);
    if dist_power <= 0.0 {
        return Err(stage(format!("dist_power must be positive, got {dist_power}")));
    }
    Ok(Settings { neighbors: neighbors as usize, weight_func, dist_power })
}

fn minkowski(a: ArrayView1<f64>, b: ArrayView1<f64>, p: f64) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs().powf(p)).sum::<f64>().powf(1.0 / p)
}

impl Learner for NearestNeighbors {
    type Fitted = KnnModel;

    fn fit(&self, analysis: &Dataset, config: &Configuration) -> Result<KnnModel, CellError> {
        settings(config, CellError::Fit)?;
        if analysis.n_rows() == 0 {
            return Err(CellError::Fit("no analysis rows".into()));
        }
        let raw = features(analysis, &self.features, CellError::Fit)?;
        let scaler = Standardizer::fit(&raw);
        let x = scaler.apply(&raw);
        let outcome = match analysis.column(&self.outcome).map(|c| &c.data) {
            Some(ColumnData::Categorical(v)) => Outcome::Class(v.clone()),
            Some(ColumnData::Numeric(v)) => Outcome::Numeric(v.clone()),
            None => return Err(CellError::Fit(format!("Column not found: {}", self.outcome))),
        };
        Ok(KnnModel { scaler, x, outcome })
    }

    fn score(&self, model: &KnnModel, assessment: &Dataset, config: &Configuration) -> Result<Metrics, CellError> {
        let s = settings(config, CellError::Score)?;
        if assessment.n_rows() == 0 {
            return Err(CellError::Score("empty assessment set".into()));
        }
        let x_new = model.scaler.apply(&features(assessment, &self.features, CellError::Score)?);
        let n_train = model.x.nrows();
        let k = s.neighbors.min(n_train);

        // (index, weight) of the k nearest training rows for each new row
        let neighbourhoods: Vec<Vec<(usize, f64)>> = x_new
            .rows()
            .into_iter()
            .map(|row| {
                let mut dists: Vec<(usize, f64)> = model
                    .x
                    .rows()
                    .into_iter()
                    .enumerate()
                    .map(|(i, train)| (i, minkowski(row, train, s.dist_power)))
                    .collect();
                dists.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
                let scale = dists.get(k).or_else(|| dists.last()).map_or(0.0, |d| d.1);
                dists.truncate(k);
                dists.into_iter().map(|(i, d)| (i, s.weight_func.weight(d, scale))).collect()
            })
            .collect();

        match &model.outcome {
            Outcome::Class(labels) => {
                let truth = assessment
                    .categorical(&self.outcome)
                    .map_err(|e| CellError::Score(e.to_string()))?;
                let predicted: Vec<String> = neighbourhoods
                    .iter()
                    .map(|hood| {
                        let mut votes: BTreeMap<&str, f64> = BTreeMap::new();
                        for &(i, w) in hood {
                            *votes.entry(labels[i].as_str()).or_default() += w;
                        }
                        // BTreeMap order makes ties go to the first label.
                        let mut best: Option<(&str, f64)> = None;
                        for (label, w) in votes {
                            if best.map_or(true, |(_, bw)| w > bw) {
                                best = Some((label, w));
                            }
                        }
                        best.map(|(l, _)| l.to_string()).unwrap_or_default()
                    })
                    .collect();
                Ok(Metrics::from([("accuracy".to_string(), accuracy(truth, &predicted))]))
            }
            Outcome::Numeric(values) => {
                let truth = assessment.numeric(&self.outcome).map_err(|e| CellError::Score(e.to_string()))?;
                let predicted: Vec<f64> = neighbourhoods
                    .iter()
                    .map(|hood| {
                        let total: f64 = hood.iter().map(|(_, w)| w).sum();
                        hood.iter().map(|&(i, w)| values[i] * w).sum::<f64>() / total
                    })
                    .collect();
                Ok(Metrics::from([
                    ("rmse".to_string(), rmse(truth, &predicted)),
                    ("rsq".to_string(), rsq(truth, &predicted)),
                ]))
            }
        }
    }

    fn submodel_parameter(&self) -> Option<&str> {
        Some("neighbors")
    }
}
