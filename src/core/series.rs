//! Per-category univariate time series extracted from a working view.

use crate::core::Dataset;
use crate::error::{AnomalyError, Result};
use chrono::NaiveDate;

/// A single category's (timestamp, measure value) series, ready for
/// decomposition or forecasting. Timestamps are strictly increasing: within
/// one category slice of a collapsed working view each timestamp occurs
/// exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    category: String,
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl MetricSeries {
    /// Create a series, validating lengths and timestamp ordering.
    pub fn new(
        category: impl Into<String>,
        timestamps: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(AnomalyError::TimestampError(format!(
                "{} timestamps for {} values",
                timestamps.len(),
                values.len()
            )));
        }
        for pair in timestamps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(AnomalyError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self {
            category: category.into(),
            timestamps,
            values,
        })
    }

    /// Extract the measure column of a single-category working view.
    pub fn from_dataset(
        data: &Dataset,
        measure: &str,
        category: impl Into<String>,
    ) -> Result<Self> {
        let idx = data.component_index(measure)?;
        let timestamps: Vec<NaiveDate> = data.records().iter().map(|r| r.date).collect();
        let values: Vec<f64> = data.records().iter().map(|r| r.components[idx]).collect();
        Self::new(category, timestamps, values)
    }

    /// The category label this series belongs to.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Timestamps in order.
    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    /// Measure values in order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
