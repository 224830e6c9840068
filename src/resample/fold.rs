//! A single analysis/assessment split

use serde::{Deserialize, Serialize};

/// One resample: rows used to fit (analysis) and rows held out to score
/// (assessment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    /// Position of the fold in the resample set
    pub id: usize,
    /// Human readable label, e.g. `Fold03` or `Repeat2_Fold1`
    pub label: String,
    analysis: Vec<usize>,
    assessment: Vec<usize>,
}

impl Fold {
    pub(crate) fn new(id: usize, label: String, analysis: Vec<usize>, assessment: Vec<usize>) -> Self {
        Self { id, label, analysis, assessment }
    }

    /// Row indices used for fitting (sorted)
    pub fn analysis(&self) -> &[usize] {
        &self.analysis
    }

    /// Row indices held out for scoring (sorted)
    pub fn assessment(&self) -> &[usize] {
        &self.assessment
    }
}
