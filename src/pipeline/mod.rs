//! Composable transformations that reshape raw multi-dimensional data into
//! a per-category time series.
//!
//! Each stage is a pure `(table, parameters) -> table` function behind the
//! [`Transform`] trait; a [`Pipeline`] chains boxed stages in a fixed order.
//! The standard chain is built by [`dimension_pipeline`].

mod collapse;
mod fill_missing;
mod filter;
mod measure;
mod resample;

pub use collapse::Collapse;
pub use fill_missing::FillMissing;
pub use filter::{FilterCategory, FilterYear};
pub use measure::AddMeasure;
pub use resample::ConvertFrequency;

use crate::config::{Dimension, Frequency, Measure};
use crate::core::Dataset;
use crate::error::Result;

/// A stateless dataset transformation.
pub trait Transform {
    /// Stage name for diagnostics.
    fn name(&self) -> &'static str;

    /// Apply the transformation, consuming the input table.
    fn apply(&self, data: Dataset) -> Result<Dataset>;
}

/// An ordered chain of transforms applied left to right.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage.
    pub fn push(mut self, stage: impl Transform + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order.
    pub fn apply(&self, data: Dataset) -> Result<Dataset> {
        let mut current = data;
        for stage in &self.stages {
            current = stage.apply(current)?;
            tracing::trace!(stage = stage.name(), rows = current.len(), "applied stage");
        }
        Ok(current)
    }
}

/// Standard preparation chain: fill missing values, collapse to the
/// selected dimension, drop unknown and bad categories, resample to the
/// target frequency and derive the measure column.
pub fn dimension_pipeline(
    measure: &Measure,
    dimension: &Dimension,
    frequency: Frequency,
    bad_categories: &[String],
) -> Pipeline {
    let mut pipeline = Pipeline::new()
        .push(FillMissing::new(0.0))
        .push(Collapse::new(dimension.clone()));

    if let Some(name) = dimension.name() {
        let mut removed = vec!["Unknown".to_string()];
        removed.extend(bad_categories.iter().cloned());
        pipeline = pipeline.push(FilterCategory::remove(name, removed));
    }

    pipeline
        .push(ConvertFrequency::new(frequency))
        .push(AddMeasure::new(measure.clone()))
}

/// Filter chain retaining a single category of an already-collapsed view.
pub fn category_pipeline(dimension: &str, categories: Vec<String>) -> Pipeline {
    Pipeline::new().push(FilterCategory::retain(dimension, categories))
}
