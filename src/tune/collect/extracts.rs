//! Extraction artifacts and failure notes

use serde::{Deserialize, Serialize};

use crate::tune::history::SearchHistory;
use crate::tune::types::Configuration;

/// Artifact a learner extracted from one fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractRecord {
    pub config_id: usize,
    pub config: Configuration,
    pub fold_id: usize,
    pub fold_label: String,
    pub artifact: serde_json::Value,
}

/// Diagnostic for one failed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub config_id: usize,
    pub config: Configuration,
    pub fold_label: String,
    pub iteration: usize,
    /// `fit`, `score`, `panic` or `timeout`
    pub stage: String,
    pub message: String,
}

/// Every stored artifact, in history order
pub fn collect_extracts(history: &SearchHistory) -> Vec<ExtractRecord> {
    history
        .records()
        .iter()
        .filter_map(|r| {
            r.artifact.as_ref().map(|artifact| ExtractRecord {
                config_id: r.config_id,
                config: r.config.clone(),
                fold_id: r.fold_id,
                fold_label: r.fold_label.clone(),
                artifact: artifact.clone(),
            })
        })
        .collect()
}

/// Failed cells, in history order
pub fn collect_notes(history: &SearchHistory) -> Vec<NoteRecord> {
    history
        .failures()
        .filter_map(|r| {
            r.error().map(|error| NoteRecord {
                config_id: r.config_id,
                config: r.config.clone(),
                fold_label: r.fold_label.clone(),
                iteration: r.iteration,
                stage: error.stage().to_string(),
                message: error.to_string(),
            })
        })
        .collect()
}
