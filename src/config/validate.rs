//! Tuning specification validation
//!
//! Catches declaration mistakes before any data is loaded or any model is
//! fitted.

use super::schema::{SearchSpec, TuneSpec};
use crate::error::{Result, TuneError};

fn invalid(field: &str, message: impl Into<String>) -> TuneError {
    TuneError::Config { field: field.to_string(), message: message.into() }
}

/// Validate a tuning specification
///
/// Checks:
/// - Column roles are declared and disjoint
/// - Fold settings are usable
/// - Parameter domains are valid, unique and known to the model
/// - The objective metric is one the model reports
/// - Search settings and explicit configurations are consistent with the space
pub fn validate_spec(spec: &TuneSpec) -> Result<()> {
    if spec.data.features.is_empty() {
        return Err(invalid("data.features", "at least one feature column is required"));
    }
    if spec.data.outcome.is_empty() {
        return Err(invalid("data.outcome", "outcome column is required"));
    }
    if spec.data.features.contains(&spec.data.outcome) {
        return Err(invalid("data.features", format!("outcome '{}' is also listed as a feature", spec.data.outcome)));
    }

    if spec.folds.v < 2 {
        return Err(invalid("folds.v", format!("must be at least 2, got {}", spec.folds.v)));
    }
    if spec.folds.repeats == 0 {
        return Err(invalid("folds.repeats", "must be at least 1"));
    }

    if spec.space.is_empty() {
        return Err(TuneError::EmptySpace);
    }
    let space = spec.hyperparameter_space()?;
    let known = spec.model.parameters();
    if let Some(param) = space.iter().find(|p| !known.contains(&p.name.as_str())) {
        return Err(invalid(
            "space",
            format!("{} has no parameter '{}' (expected one of: {})", spec.model.name(), param.name, known.join(", ")),
        ));
    }

    if !spec.model.metrics().contains(&spec.objective.metric.as_str()) {
        return Err(invalid(
            "objective.metric",
            format!(
                "{} does not report '{}' (reports: {})",
                spec.model.name(),
                spec.objective.metric,
                spec.model.metrics().join(", ")
            ),
        ));
    }

    match &spec.search {
        SearchSpec::Grid { levels, size, configs, .. } => {
            if *levels == 0 {
                return Err(invalid("search.levels", "must be at least 1"));
            }
            if *size == 0 {
                return Err(invalid("search.size", "must be at least 1"));
            }
            if let Some(configs) = configs {
                if configs.is_empty() {
                    return Err(TuneError::EmptyGrid);
                }
                for config in configs {
                    space.validate(&space.complete(config))?;
                }
            }
        }
        SearchSpec::Bayes { n_initial, no_improve, n_candidates, initial, .. } => {
            match initial {
                Some(configs) if configs.is_empty() => return Err(TuneError::EmptyGrid),
                Some(configs) => {
                    for config in configs {
                        space.validate(&space.complete(config))?;
                    }
                }
                None if *n_initial == 0 => return Err(invalid("search.n_initial", "must be at least 1")),
                None => {}
            }
            if *no_improve == 0 {
                return Err(invalid("search.no_improve", "must be at least 1"));
            }
            if *n_candidates == 0 {
                return Err(invalid("search.n_candidates", "must be at least 1"));
            }
        }
    }

    if let Some(secs) = spec.control.timeout_secs {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(invalid("control.timeout_secs", format!("must be positive, got {secs}")));
        }
    }

    Ok(())
}
