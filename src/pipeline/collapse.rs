//! Stage 2: collapse multi-dimensional data down to a single dimension.

use crate::config::Dimension;
use crate::core::{Dataset, Schema};
use crate::error::Result;
use crate::pipeline::Transform;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Groups rows by (timestamp, selected category) — timestamp alone for
/// `ALL` — summing every component column. Downstream measures are only
/// valid after this aggregation. Output rows are sorted chronologically,
/// then by category, with exactly one row per (timestamp, category) pair.
#[derive(Debug, Clone)]
pub struct Collapse {
    dimension: Dimension,
}

impl Collapse {
    /// Create a collapse stage for the given dimension.
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension }
    }
}

impl Transform for Collapse {
    fn name(&self) -> &'static str {
        "collapse"
    }

    fn apply(&self, data: Dataset) -> Result<Dataset> {
        let n_components = data.schema().components().len();

        let dim_idx = match &self.dimension {
            Dimension::All => None,
            Dimension::Column(name) => Some(data.dimension_index(name)?),
        };

        let mut groups: BTreeMap<(NaiveDate, String), Vec<f64>> = BTreeMap::new();
        for record in data.records() {
            let category = match dim_idx {
                Some(idx) => record.dimensions[idx].clone(),
                None => String::new(),
            };
            let sums = groups
                .entry((record.date, category))
                .or_insert_with(|| vec![0.0; n_components]);
            for (sum, value) in sums.iter_mut().zip(record.components.iter()) {
                *sum += value;
            }
        }

        let out_dimensions = match &self.dimension {
            Dimension::All => vec![],
            Dimension::Column(name) => vec![name.clone()],
        };
        let schema = Schema::new(out_dimensions, data.schema().components().to_vec());

        let mut collapsed = Dataset::new(schema);
        for ((date, category), components) in groups {
            let dimensions = if self.dimension.is_all() {
                vec![]
            } else {
                vec![category]
            };
            collapsed.push_row(date, dimensions, components)?;
        }
        Ok(collapsed)
    }
}
