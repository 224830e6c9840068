//! In-memory tabular datasets
//!
//! A [`Dataset`] is an immutable, column-oriented table. Resampling hands out
//! row subsets of it to learners; nothing in the search engine mutates it.

mod dataset;


pub use dataset::{Column, ColumnData, Dataset};
