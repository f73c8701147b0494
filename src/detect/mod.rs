//! Anomaly-detection strategies and their shared result shape.
//!
//! Both strategies consume one category's [`MetricSeries`] and produce the
//! same [`AnomalyRecord`] rows, so the aggregating session is
//! strategy-agnostic.

mod arima;
mod stl;

pub use arima::detect_with_arima;
pub use stl::detect_with_stl;

use crate::config::{DetectionConfig, Method};
use crate::core::MetricSeries;
use crate::error::{AnomalyError, Result};
use chrono::NaiveDate;
use std::io::Write;

/// One scored data point produced by a detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRecord {
    /// Period timestamp of the point.
    pub timestamp: NaiveDate,
    /// Category of the selected dimension this point belongs to.
    pub category: String,
    /// Raw measure value.
    pub value: f64,
    /// Deviation score: residual standard deviations (STL) or distance from
    /// the forecast in interval half-widths (ARIMA).
    pub score: f64,
    /// Whether the point falls outside the confidence interval.
    pub flagged: bool,
}

/// Aggregated result of a detection run, replaced wholesale on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalyTable {
    records: Vec<AnomalyRecord>,
}

impl AnomalyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from records, sorted by (timestamp, category).
    pub fn from_records(mut records: Vec<AnomalyRecord>) -> Self {
        records.sort_by(|a, b| (a.timestamp, &a.category).cmp(&(b.timestamp, &b.category)));
        Self { records }
    }

    /// All records in order.
    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    /// Records flagged as anomalous.
    pub fn flagged(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.records.iter().filter(|r| r.flagged)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the flagged rows as CSV. An empty table yields a valid
    /// header-only output.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(["timestamp", "category", "value", "score", "flagged"])
            .map_err(|e| AnomalyError::ExportError(e.to_string()))?;

        for record in self.flagged() {
            csv_writer
                .write_record([
                    record.timestamp.to_string(),
                    record.category.clone(),
                    record.value.to_string(),
                    record.score.to_string(),
                    record.flagged.to_string(),
                ])
                .map_err(|e| AnomalyError::ExportError(e.to_string()))?;
        }

        csv_writer
            .flush()
            .map_err(|e| AnomalyError::ExportError(e.to_string()))
    }
}

/// Run the configured strategy on one category's series.
pub fn detect_series(series: &MetricSeries, config: &DetectionConfig) -> Result<Vec<AnomalyRecord>> {
    match config.method {
        Method::Stl => detect_with_stl(series, config.sig_level, config.seasonal_period),
        Method::Arima => detect_with_arima(series, config.sig_level, &config.arima),
    }
}
