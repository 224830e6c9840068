//! V-fold splitter

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::fold::Fold;
use crate::data::{ColumnData, Dataset};
use crate::error::{Result, TuneError};

/// Number of quantile bins used when stratifying on a numeric column
pub const STRATA_BREAKS: usize = 4;

/// V-fold cross-validation splitter.
///
/// Each repeat shuffles the rows (per stratum when stratified) with a seeded
/// generator and deals them round-robin into `v` assessment sets. Dealing
/// continues from where the previous stratum stopped, so both per-class counts
/// and overall fold sizes differ by at most one row.
#[derive(Clone, Debug)]
pub struct VFold {
    v: usize,
    repeats: usize,
    strata: Option<String>,
    seed: u64,
}

impl VFold {
    /// Create a new splitter with `v` folds
    pub fn new(v: usize) -> Self {
        Self { v, repeats: 1, strata: None, seed: 42 }
    }

    /// Set random seed for shuffling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Repeat the whole v-fold partition `repeats` times
    pub fn with_repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats.max(1);
        self
    }

    /// Stratify on a column
    pub fn with_strata(mut self, column: impl Into<String>) -> Self {
        self.strata = Some(column.into());
        self
    }

    pub fn v(&self) -> usize {
        self.v
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }

    /// Split a dataset, honouring the stratification column if one is set.
    pub fn split(&self, data: &Dataset) -> Result<Vec<Fold>> {
        let n_rows = data.n_rows();
        self.check_v(n_rows)?;

        let groups = match &self.strata {
            None => vec![("all".to_string(), (0..n_rows).collect())],
            Some(column) => {
                let groups = strata_groups(data, column)?;
                if let Some((class, rows)) = groups.iter().find(|(_, rows)| rows.len() < self.v) {
                    return Err(TuneError::StrataTooSmall {
                        class: class.clone(),
                        count: rows.len(),
                        v: self.v,
                    });
                }
                groups
            }
        };

        Ok(self.deal(n_rows, &groups))
    }

    /// Split `n_rows` rows without stratification.
    pub fn split_rows(&self, n_rows: usize) -> Result<Vec<Fold>> {
        self.check_v(n_rows)?;
        Ok(self.deal(n_rows, &[("all".to_string(), (0..n_rows).collect())]))
    }

    fn check_v(&self, n_rows: usize) -> Result<()> {
        if self.v < 2 || self.v > n_rows {
            return Err(TuneError::InvalidFolds { v: self.v, n_rows });
        }
        Ok(())
    }

    fn deal(&self, n_rows: usize, groups: &[(String, Vec<usize>)]) -> Vec<Fold> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut folds = Vec::with_capacity(self.v * self.repeats);

        for repeat in 0..self.repeats {
            let mut assessments: Vec<Vec<usize>> = vec![Vec::new(); self.v];
            let mut next = 0;

            for (_, rows) in groups {
                let mut rows = rows.clone();
                rows.shuffle(&mut rng);
                for row in rows {
                    assessments[next].push(row);
                    next = (next + 1) % self.v;
                }
            }

            for (i, mut assessment) in assessments.into_iter().enumerate() {
                assessment.sort_unstable();
                let analysis = complement(n_rows, &assessment);
                folds.push(Fold::new(folds.len(), self.label(repeat, i), analysis, assessment));
            }
        }

        folds
    }

    fn label(&self, repeat: usize, fold: usize) -> String {
        let width = digits(self.v);
        if self.repeats == 1 {
            format!("Fold{:0width$}", fold + 1)
        } else {
            let repeat_width = digits(self.repeats);
            format!("Repeat{:0repeat_width$}_Fold{:0width$}", repeat + 1, fold + 1)
        }
    }
}

fn digits(n: usize) -> usize {
    n.to_string().len()
}

fn complement(n_rows: usize, assessment: &[usize]) -> Vec<usize> {
    let mut held_out = vec![false; n_rows];
    for &row in assessment {
        held_out[row] = true;
    }
    (0..n_rows).filter(|&row| !held_out[row]).collect()
}

/// Group row indices by stratum. Categorical columns group by value; numeric
/// columns are cut into [`STRATA_BREAKS`] rank-based bins.
fn strata_groups(data: &Dataset, column: &str) -> Result<Vec<(String, Vec<usize>)>> {
    let col = data
        .column(column)
        .ok_or_else(|| TuneError::UnknownColumn(column.to_string()))?;

    match &col.data {
        ColumnData::Categorical(values) => {
            let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
            for (row, value) in values.iter().enumerate() {
                groups.entry(value.as_str()).or_default().push(row);
            }
            Ok(groups.into_iter().map(|(k, rows)| (k.to_string(), rows)).collect())
        }
        ColumnData::Numeric(values) => {
            let mut order: Vec<usize> = (0..values.len()).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

            let n = order.len();
            let bins = STRATA_BREAKS.min(n.max(1));
            Ok((0..bins)
                .map(|b| {
                    let rows = order[b * n / bins..(b + 1) * n / bins].to_vec();
                    (format!("{column}_q{}", b + 1), rows)
                })
                .collect())
        }
    }
}
