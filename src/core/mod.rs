//! Core data structures: the tabular dataset and per-category series.

mod dataset;
mod series;

pub use dataset::{Dataset, Record, Schema};
pub use series::MetricSeries;
