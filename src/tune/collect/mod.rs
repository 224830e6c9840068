//! Result aggregation
//!
//! Read-only views over a [`SearchHistory`](crate::tune::SearchHistory):
//! metric tables, best-configuration selection, extraction artifacts and
//! failure notes.

mod extracts;
mod metrics;
mod select;


pub use extracts::{collect_extracts, collect_notes, ExtractRecord, NoteRecord};
pub use metrics::{collect_metrics, MetricRecord, MetricSummary, MetricsTable};
pub use select::{select_best, select_by_one_std_err, show_best};
