//! Stage 5: resample collapsed daily data to the target frequency.

use crate::config::Frequency;
use crate::core::{Dataset, Schema};
use crate::error::Result;
use crate::pipeline::Transform;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sums component columns into frequency buckets, labelling each bucket
/// with its period start (weekly: the Monday opening the week). Must run
/// strictly after [`Collapse`](crate::pipeline::Collapse): resampling a
/// multi-dimensional table would double-count across categories.
#[derive(Debug, Clone)]
pub struct ConvertFrequency {
    frequency: Frequency,
}

impl ConvertFrequency {
    /// Create a resampling stage for the given frequency.
    pub fn new(frequency: Frequency) -> Self {
        Self { frequency }
    }
}

impl Transform for ConvertFrequency {
    fn name(&self) -> &'static str {
        "convert_frequency"
    }

    fn apply(&self, data: Dataset) -> Result<Dataset> {
        let n_components = data.schema().components().len();

        let mut groups: BTreeMap<(NaiveDate, Vec<String>), Vec<f64>> = BTreeMap::new();
        for record in data.records() {
            let bucket = self.frequency.period_start(record.date);
            let sums = groups
                .entry((bucket, record.dimensions.clone()))
                .or_insert_with(|| vec![0.0; n_components]);
            for (sum, value) in sums.iter_mut().zip(record.components.iter()) {
                *sum += value;
            }
        }

        let schema = Schema::new(
            data.schema().dimensions().to_vec(),
            data.schema().components().to_vec(),
        );
        let mut resampled = Dataset::new(schema);
        for ((date, dimensions), components) in groups {
            resampled.push_row(date, dimensions, components)?;
        }
        Ok(resampled)
    }
}
