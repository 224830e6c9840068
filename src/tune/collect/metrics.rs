//! Per-fold and summarised metric tables

use serde::{Deserialize, Serialize};

use crate::tune::history::SearchHistory;
use crate::tune::types::Configuration;

/// One metric of one configuration on one fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub config_id: usize,
    pub config: Configuration,
    pub fold_id: usize,
    pub fold_label: String,
    pub iteration: usize,
    pub metric: String,
    pub value: f64,
}

/// One metric of one configuration, summarised over its completed folds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub config_id: usize,
    pub config: Configuration,
    pub metric: String,
    pub mean: f64,
    /// Number of completed folds
    pub n: usize,
    /// Standard error of the mean; `None` with fewer than two folds
    pub std_err: Option<f64>,
}

/// Result of [`collect_metrics`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum MetricsTable {
    Summarized(Vec<MetricSummary>),
    Raw(Vec<MetricRecord>),
}

impl MetricsTable {
    pub fn len(&self) -> usize {
        match self {
            MetricsTable::Summarized(rows) => rows.len(),
            MetricsTable::Raw(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Format as ASCII table.
    pub fn to_table(&self) -> String {
        let (header, rows): (Vec<&str>, Vec<Vec<String>>) = match self {
            MetricsTable::Summarized(rows) => (
                vec!["Id", "Configuration", "Metric", "Mean", "N", "Std Err"],
                rows.iter()
                    .map(|r| {
                        vec![
                            r.config_id.to_string(),
                            r.config.to_string(),
                            r.metric.clone(),
                            format!("{:.4}", r.mean),
                            r.n.to_string(),
                            r.std_err.map_or_else(|| "-".to_string(), |se| format!("{se:.4}")),
                        ]
                    })
                    .collect(),
            ),
            MetricsTable::Raw(rows) => (
                vec!["Id", "Fold", "Configuration", "Metric", "Value"],
                rows.iter()
                    .map(|r| {
                        vec![
                            r.config_id.to_string(),
                            r.fold_label.clone(),
                            r.config.to_string(),
                            r.metric.clone(),
                            format!("{:.4}", r.value),
                        ]
                    })
                    .collect(),
            ),
        };
        render_box(&header, &rows)
    }
}

fn render_box(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}\n", segments.join(mid))
    };
    let line = |cells: &[String]| {
        let padded: Vec<String> = cells.iter().zip(&widths).map(|(c, &w)| format!(" {c:<w$} ")).collect();
        format!("│{}│\n", padded.join("│"))
    };

    let mut output = rule("┌", "┬", "┐");
    output.push_str(&line(&header.iter().map(ToString::to_string).collect::<Vec<_>>()));
    output.push_str(&rule("├", "┼", "┤"));
    for row in rows {
        output.push_str(&line(row));
    }
    output.push_str(&rule("└", "┴", "┘"));
    output
}

/// Metric values of the history, per fold (`summarize = false`) or
/// summarised per configuration (`summarize = true`).
///
/// Failed cells contribute nothing; a configuration that failed on every
/// fold has no summary rows.
pub fn collect_metrics(history: &SearchHistory, summarize: bool) -> MetricsTable {
    if summarize {
        MetricsTable::Summarized(summarize_metrics(history))
    } else {
        MetricsTable::Raw(raw_metrics(history))
    }
}

fn raw_metrics(history: &SearchHistory) -> Vec<MetricRecord> {
    history
        .records()
        .iter()
        .filter_map(|r| r.metrics().map(|m| (r, m)))
        .flat_map(|(r, metrics)| {
            metrics.iter().map(move |(name, &value)| MetricRecord {
                config_id: r.config_id,
                config: r.config.clone(),
                fold_id: r.fold_id,
                fold_label: r.fold_label.clone(),
                iteration: r.iteration,
                metric: name.clone(),
                value,
            })
        })
        .collect()
}

/// Summaries in configuration id order, metrics by name within a
/// configuration.
pub(crate) fn summarize_metrics(history: &SearchHistory) -> Vec<MetricSummary> {
    let mut values: Vec<std::collections::BTreeMap<&str, Vec<f64>>> =
        vec![Default::default(); history.n_configurations()];
    for record in history.records() {
        if let Some(metrics) = record.metrics() {
            for (name, &value) in metrics {
                values[record.config_id].entry(name.as_str()).or_default().push(value);
            }
        }
    }

    values
        .into_iter()
        .enumerate()
        .flat_map(|(config_id, per_metric)| {
            per_metric.into_iter().map(move |(metric, v)| (config_id, metric.to_string(), v))
        })
        .filter_map(|(config_id, metric, v)| {
            let config = history.configuration(config_id)?.clone();
            let (mean, std_err) = mean_and_std_err(&v);
            Some(MetricSummary { config_id, config, metric, mean, n: v.len(), std_err })
        })
        .collect()
}

fn mean_and_std_err(values: &[f64]) -> (f64, Option<f64>) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, None);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, Some((var / n).sqrt()))
}
