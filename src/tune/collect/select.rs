//! Choosing configurations from a finished history

use std::cmp::Ordering;

use super::metrics::{summarize_metrics, MetricSummary};
use crate::error::{Result, TuneError};
use crate::tune::history::SearchHistory;
use crate::tune::objective::Direction;
use crate::tune::types::{Configuration, ParameterValue};

/// Summaries of `metric`, best first; ties keep the lower configuration id
/// first. NaN means are left out.
fn ranked(history: &SearchHistory, metric: &str, direction: Direction) -> Result<Vec<MetricSummary>> {
    if !history.has_usable() {
        return Err(TuneError::NoUsableConfiguration);
    }
    let mut rows: Vec<MetricSummary> = summarize_metrics(history)
        .into_iter()
        .filter(|s| s.metric == metric)
        .collect();
    if rows.is_empty() {
        return Err(TuneError::MetricNotFound(metric.to_string()));
    }
    rows.retain(|s| !s.mean.is_nan());
    if rows.is_empty() {
        return Err(TuneError::NoUsableConfiguration);
    }

    let sign = direction.sign();
    rows.sort_by(|a, b| {
        (sign * b.mean)
            .total_cmp(&(sign * a.mean))
            .then(a.config_id.cmp(&b.config_id))
    });
    Ok(rows)
}

/// Configuration with the best mean `metric`; ties go to the lowest
/// configuration id.
pub fn select_best(history: &SearchHistory, metric: &str, direction: Direction) -> Result<Configuration> {
    let rows = ranked(history, metric, direction)?;
    rows.into_iter().next().map(|s| s.config).ok_or(TuneError::NoUsableConfiguration)
}

/// The `n` best summaries of `metric`
pub fn show_best(history: &SearchHistory, metric: &str, direction: Direction, n: usize) -> Result<Vec<MetricSummary>> {
    let mut rows = ranked(history, metric, direction)?;
    rows.truncate(n);
    Ok(rows)
}

/// Simplest configuration whose mean is within one standard error of the
/// best.
///
/// Simplicity is the value of the parameter `simplest`, smaller being
/// simpler; prefix the name with `-` to treat larger values as simpler.
/// Qualitative parameters compare by name.
pub fn select_by_one_std_err(
    history: &SearchHistory,
    metric: &str,
    direction: Direction,
    simplest: &str,
) -> Result<Configuration> {
    let (param, descending) = match simplest.strip_prefix('-') {
        Some(name) => (name, true),
        None => (simplest, false),
    };

    let rows = ranked(history, metric, direction)?;
    let Some(best) = rows.first() else {
        return Err(TuneError::NoUsableConfiguration);
    };
    let margin = best.std_err.unwrap_or(0.0);
    let limit = best.mean - direction.sign() * margin;

    let mut within: Vec<(&MetricSummary, &ParameterValue)> = Vec::new();
    for row in &rows {
        let inside = match direction {
            Direction::Maximize => row.mean >= limit,
            Direction::Minimize => row.mean <= limit,
        };
        if inside {
            let value = row
                .config
                .get(param)
                .ok_or_else(|| TuneError::ParameterNotFound(param.to_string()))?;
            within.push((row, value));
        }
    }

    within.sort_by(|(a, va), (b, vb)| {
        let order = compare_values(va, vb);
        let order = if descending { order.reverse() } else { order };
        order.then(a.config_id.cmp(&b.config_id))
    });
    within.first().map(|(row, _)| row.config.clone()).ok_or(TuneError::NoUsableConfiguration)
}

fn compare_values(a: &ParameterValue, b: &ParameterValue) -> Ordering {
    match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
