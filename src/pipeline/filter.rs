//! Stages 3 and 4: category and calendar-year filters.

use crate::core::Dataset;
use crate::error::Result;
use crate::pipeline::Transform;
use chrono::Datelike;

/// Retains or removes rows whose category value contains any of the given
/// substrings.
#[derive(Debug, Clone)]
pub struct FilterCategory {
    dimension: String,
    categories: Vec<String>,
    remove: bool,
}

impl FilterCategory {
    /// Keep only rows matching one of the categories.
    pub fn retain(dimension: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            dimension: dimension.into(),
            categories,
            remove: false,
        }
    }

    /// Drop rows matching one of the categories.
    pub fn remove(dimension: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            dimension: dimension.into(),
            categories,
            remove: true,
        }
    }
}

impl Transform for FilterCategory {
    fn name(&self) -> &'static str {
        "filter_category"
    }

    fn apply(&self, data: Dataset) -> Result<Dataset> {
        let idx = data.dimension_index(&self.dimension)?;

        let mut filtered = Dataset::new(data.schema().clone());
        for record in data.records() {
            let matches = self
                .categories
                .iter()
                .any(|c| record.dimensions[idx].contains(c.as_str()));
            if matches != self.remove {
                filtered.push_record(record.clone())?;
            }
        }
        Ok(filtered)
    }
}

/// Retains rows within one calendar year; `None` keeps every year.
#[derive(Debug, Clone)]
pub struct FilterYear {
    year: Option<i32>,
}

impl FilterYear {
    /// Create a year filter; `None` is the all-years sentinel.
    pub fn new(year: Option<i32>) -> Self {
        Self { year }
    }
}

impl Transform for FilterYear {
    fn name(&self) -> &'static str {
        "filter_year"
    }

    fn apply(&self, data: Dataset) -> Result<Dataset> {
        let Some(year) = self.year else {
            return Ok(data);
        };

        let mut filtered = Dataset::new(data.schema().clone());
        for record in data.records() {
            if record.date.year() == year {
                filtered.push_record(record.clone())?;
            }
        }
        Ok(filtered)
    }
}
