//! V-fold cross-validation resampling
//!
//! Produces [`Fold`]s whose assessment sets partition the rows of a dataset.
//! Optional stratification keeps each class's share of the assessment sets
//! within one row of its global proportion.

mod fold;
mod vfold;

#[cfg(test)]
mod proptests;

pub use fold::Fold;
pub use vfold::{VFold, STRATA_BREAKS};
