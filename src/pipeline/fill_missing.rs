//! Stage 1: replace missing numeric entries.

use crate::core::Dataset;
use crate::error::Result;
use crate::pipeline::Transform;

/// Replaces NaN and infinite component entries with a fixed value. Rows are
/// never dropped.
#[derive(Debug, Clone)]
pub struct FillMissing {
    value: f64,
}

impl FillMissing {
    /// Create a fill stage with the given replacement value.
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Transform for FillMissing {
    fn name(&self) -> &'static str {
        "fill_missing"
    }

    fn apply(&self, mut data: Dataset) -> Result<Dataset> {
        data.fill_missing(self.value);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Schema;
    use chrono::NaiveDate;

    #[test]
    fn replaces_nan_without_dropping_rows() {
        let schema = Schema::new(vec![], vec!["count".to_string()]);
        let mut data = Dataset::new(schema);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        data.push_row(date, vec![], vec![f64::NAN]).unwrap();
        data.push_row(date, vec![], vec![3.0]).unwrap();

        let result = FillMissing::new(0.0).apply(data).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.records()[0].components, vec![0.0]);
        assert_eq!(result.records()[1].components, vec![3.0]);
    }

    #[test]
    fn custom_fill_value() {
        let schema = Schema::new(vec![], vec!["count".to_string()]);
        let mut data = Dataset::new(schema);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        data.push_row(date, vec![], vec![f64::INFINITY]).unwrap();

        let result = FillMissing::new(-1.0).apply(data).unwrap();
        assert_eq!(result.records()[0].components, vec![-1.0]);
    }
}
