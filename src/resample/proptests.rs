//! Property tests for v-fold resampling

use proptest::prelude::*;

use super::VFold;
use crate::data::{Column, Dataset};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_assessment_sets_partition_rows(n_rows in 2usize..300, v in 2usize..12, seed in any::<u64>()) {
        prop_assume!(v <= n_rows);
        let folds = VFold::new(v).with_seed(seed).split_rows(n_rows).unwrap();
        prop_assert_eq!(folds.len(), v);

        let mut seen = vec![0usize; n_rows];
        for fold in &folds {
            for &row in fold.assessment() {
                seen[row] += 1;
            }
            prop_assert_eq!(fold.analysis().len(), n_rows - fold.assessment().len());
        }
        prop_assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn prop_stratified_counts_within_one(
        classes in proptest::collection::vec(0usize..4, 40..200),
        v in 2usize..6,
        seed in any::<u64>(),
    ) {
        let labels: Vec<String> = classes.iter().map(|c| format!("c{c}")).collect();
        let mut totals = std::collections::BTreeMap::new();
        for label in &labels {
            *totals.entry(label.clone()).or_insert(0usize) += 1;
        }
        prop_assume!(totals.values().all(|&n| n >= v));

        let data = Dataset::new(vec![Column::categorical("class", labels.clone())]).unwrap();
        let folds = VFold::new(v).with_strata("class").with_seed(seed).split(&data).unwrap();

        for fold in &folds {
            for (class, &total) in &totals {
                let count = fold.assessment().iter().filter(|&&r| &labels[r] == class).count();
                let expected = total as f64 / v as f64;
                prop_assert!((count as f64 - expected).abs() <= 1.0);
            }
        }
    }
}
