//! # metric-anomaly
//!
//! Anomaly detection core for grouped time-series business metrics.
//!
//! Raw daily records carrying categorical dimension columns and numeric
//! component columns are reshaped by a composable transform pipeline into
//! per-category time series at a target frequency, then scanned for
//! anomalies with one of two interchangeable strategies: STL residual
//! analysis with normal confidence bounds, or ARIMA forecasting with
//! prediction-interval checks. The [`model::AnomalyModel`] session type
//! owns the immutable source dataset, orchestrates per-category runs and
//! aggregates the results into a single anomaly table that can be exported
//! as CSV.

pub mod arima;
pub mod config;
pub mod core;
pub mod detect;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod stats;
pub mod stl;

pub use error::{AnomalyError, Result};

pub mod prelude {
    pub use crate::config::{
        CategoryFilter, DetectionConfig, Dimension, Frequency, Measure, Method,
    };
    pub use crate::core::{Dataset, MetricSeries, Record, Schema};
    pub use crate::detect::{AnomalyRecord, AnomalyTable};
    pub use crate::error::{AnomalyError, Result};
    pub use crate::model::{AnomalyModel, DetectionRun};
}
