//! Ridge (L2 penalised) linear regression

use ndarray::{Array1, Array2};

use super::{features, rmse, rsq, Standardizer};
use crate::data::Dataset;
use crate::error::CellError;
use crate::linalg::{cholesky, cholesky_solve};
use crate::tune::evaluator::Learner;
use crate::tune::objective::Metrics;
use crate::tune::types::Configuration;

/// Fitted ridge coefficients on the standardised feature scale
#[derive(Debug, Clone)]
pub struct RidgeModel {
    scaler: Standardizer,
    intercept: f64,
    coefficients: Array1<f64>,
}

impl RidgeModel {
    fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        self.scaler.apply(x).dot(&self.coefficients) + self.intercept
    }
}

/// Ridge regression on standardised numeric features.
///
/// Minimises `||y - b0 - X b||² / n + penalty * ||b||²`. The `penalty`
/// parameter is expected on a log10 scale in the search space; the learner
/// receives its natural value. Scored by `rmse` and `rsq`; extraction returns
/// the intercept and per-feature coefficients.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    features: Vec<String>,
    outcome: String,
}

impl RidgeRegression {
    pub fn new(features: Vec<String>, outcome: impl Into<String>) -> Self {
        Self { features, outcome: outcome.into() }
    }
}

impl Learner for RidgeRegression {
    type Fitted = RidgeModel;

    fn fit(&self, analysis: &Dataset, config: &Configuration) -> Result<RidgeModel, CellError> {
        let penalty = config.float("penalty").unwrap_or(0.0);
        if penalty.is_nan() || penalty < 0.0 {
            return Err(CellError::Fit(format!("penalty must be non-negative, got {penalty}")));
        }
        let raw = features(analysis, &self.features, CellError::Fit)?;
        let y = analysis.numeric(&self.outcome).map_err(|e| CellError::Fit(e.to_string()))?;
        let n = raw.nrows();
        if n == 0 {
            return Err(CellError::Fit("no analysis rows".into()));
        }

        let scaler = Standardizer::fit(&raw);
        let x = scaler.apply(&raw);
        let y = Array1::from(y.to_vec());
        let intercept = y.mean().unwrap_or(0.0);
        let centered = &y - intercept;

        let mut gram = x.t().dot(&x) / n as f64;
        for j in 0..gram.nrows() {
            gram[[j, j]] += penalty;
        }
        let rhs = x.t().dot(&centered) / n as f64;
        let chol = cholesky(&gram)
            .ok_or_else(|| CellError::Fit(format!("singular system at penalty {penalty}")))?;
        let coefficients = cholesky_solve(&chol, &rhs);

        Ok(RidgeModel { scaler, intercept, coefficients })
    }

    fn score(&self, model: &RidgeModel, assessment: &Dataset, _config: &Configuration) -> Result<Metrics, CellError> {
        let x = features(assessment, &self.features, CellError::Score)?;
        let truth = assessment.numeric(&self.outcome).map_err(|e| CellError::Score(e.to_string()))?;
        if truth.is_empty() {
            return Err(CellError::Score("empty assessment set".into()));
        }
        let predicted = model.predict(&x).to_vec();
        Ok(Metrics::from([
            ("rmse".to_string(), rmse(truth, &predicted)),
            ("rsq".to_string(), rsq(truth, &predicted)),
        ]))
    }

    fn extract(&self, model: &RidgeModel, _config: &Configuration) -> Option<serde_json::Value> {
        let coefficients: serde_json::Map<String, serde_json::Value> = self
            .features
            .iter()
            .zip(model.coefficients.iter())
            .map(|(name, b)| (name.clone(), serde_json::json!(b)))
            .collect();
        Some(serde_json::json!({ "intercept": model.intercept, "coefficients": coefficients }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::tune::types::ParameterValue;
    use approx::assert_relative_eq;

    fn linear_data() -> Dataset {
        let x1: Vec<f64> = (0..30).map(|i| i as f64 / 3.0).collect();
        let x2: Vec<f64> = (0..30).map(|i| ((i * 7) % 11) as f64).collect();
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 2.0 + 3.0 * a - 0.5 * b).collect();
        Dataset::new(vec![Column::numeric("x1", x1), Column::numeric("x2", x2), Column::numeric("y", y)]).unwrap()
    }

    fn ridge() -> RidgeRegression {
        RidgeRegression::new(vec!["x1".into(), "x2".into()], "y")
    }

    fn penalty(p: f64) -> Configuration {
        Configuration::new().with("penalty", ParameterValue::Float(p))
    }

    #[test]
    fn test_small_penalty_recovers_linear_fit() {
        let data = linear_data();
        let model = ridge().fit(&data, &penalty(1e-10)).unwrap();
        let metrics = ridge().score(&model, &data, &penalty(1e-10)).unwrap();
        assert!(metrics["rmse"] < 1e-6);
        assert_relative_eq!(metrics["rsq"], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let data = linear_data();
        let norm = |p: f64| {
            let model = ridge().fit(&data, &penalty(p)).unwrap();
            model.coefficients.iter().map(|b| b * b).sum::<f64>()
        };
        assert!(norm(10.0) < norm(0.01));
    }

    #[test]
    fn test_extract_names_coefficients() {
        let data = linear_data();
        let model = ridge().fit(&data, &penalty(0.1)).unwrap();
        let artifact = ridge().extract(&model, &penalty(0.1)).unwrap();
        assert!(artifact["coefficients"]["x1"].as_f64().unwrap() > 0.0);
        assert!(artifact["coefficients"]["x2"].as_f64().unwrap() < 0.0);
        assert_relative_eq!(artifact["intercept"].as_f64().unwrap(), data.numeric("y").unwrap().iter().sum::<f64>() / 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unpenalised_collinear_features_fail() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let data = Dataset::new(vec![
            Column::numeric("a", x.clone()),
            Column::numeric("b", x.clone()),
            Column::numeric("y", x),
        ])
        .unwrap();
        let learner = RidgeRegression::new(vec!["a".into(), "b".into()], "y");
        assert!(matches!(learner.fit(&data, &penalty(0.0)), Err(CellError::Fit(_))));
        assert!(learner.fit(&data, &penalty(0.1)).is_ok());
    }
}
