//! Tabular dataset of daily records with dimension and component columns.

use crate::error::{AnomalyError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Column layout of a [`Dataset`]: categorical dimension columns and numeric
/// component columns. The timestamp column is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    dimensions: Vec<String>,
    components: Vec<String>,
}

impl Schema {
    /// Create a schema from dimension and component column names.
    pub fn new(dimensions: Vec<String>, components: Vec<String>) -> Self {
        Self {
            dimensions,
            components,
        }
    }

    /// Dimension column names.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Component column names.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Index of a dimension column.
    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == name)
    }

    /// Index of a component column.
    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c == name)
    }

    /// Comma-separated column listing, used in mismatch errors.
    pub fn describe(&self) -> String {
        self.dimensions
            .iter()
            .chain(self.components.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One row of a dataset: a day timestamp, one categorical value per
/// dimension column and one numeric value per component column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Day-granularity timestamp.
    pub date: NaiveDate,
    /// Values of the dimension columns, in schema order.
    pub dimensions: Vec<String>,
    /// Values of the component columns, in schema order.
    pub components: Vec<f64>,
}

/// An ordered table of records sharing one [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    records: Vec<Record>,
}

impl Dataset {
    /// Create an empty dataset with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Create a dataset from pre-built records, validating arity.
    pub fn from_records(schema: Schema, records: Vec<Record>) -> Result<Self> {
        let mut data = Self::new(schema);
        for record in records {
            data.push_record(record)?;
        }
        Ok(data)
    }

    /// The dataset schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All records in order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a row, validating it against the schema.
    pub fn push_row(
        &mut self,
        date: NaiveDate,
        dimensions: Vec<String>,
        components: Vec<f64>,
    ) -> Result<()> {
        self.push_record(Record {
            date,
            dimensions,
            components,
        })
    }

    /// Append a record, validating it against the schema.
    pub fn push_record(&mut self, record: Record) -> Result<()> {
        if record.dimensions.len() != self.schema.dimensions.len()
            || record.components.len() != self.schema.components.len()
        {
            return Err(AnomalyError::SchemaMismatch {
                expected: self.schema.describe(),
                got: format!(
                    "{} dimension value(s), {} component value(s)",
                    record.dimensions.len(),
                    record.components.len()
                ),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Union another dataset's rows into this one. The column sets must
    /// match exactly; otherwise nothing is changed and `SchemaMismatch` is
    /// returned.
    pub fn append(&mut self, other: &Dataset) -> Result<()> {
        if self.schema != other.schema {
            return Err(AnomalyError::SchemaMismatch {
                expected: self.schema.describe(),
                got: other.schema.describe(),
            });
        }
        self.records.extend(other.records.iter().cloned());
        Ok(())
    }

    /// Sort rows chronologically, then by dimension values.
    pub fn sort_rows(&mut self) {
        self.records
            .sort_by(|a, b| (a.date, &a.dimensions).cmp(&(b.date, &b.dimensions)));
    }

    /// Index of a dimension column, or `ColumnNotFound`.
    pub fn dimension_index(&self, name: &str) -> Result<usize> {
        self.schema
            .dimension_index(name)
            .ok_or_else(|| AnomalyError::ColumnNotFound(name.to_string()))
    }

    /// Index of a component column, or `ColumnNotFound`.
    pub fn component_index(&self, name: &str) -> Result<usize> {
        self.schema
            .component_index(name)
            .ok_or_else(|| AnomalyError::ColumnNotFound(name.to_string()))
    }

    /// Sorted distinct values of a dimension column.
    pub fn categories(&self, dimension: &str) -> Result<Vec<String>> {
        let idx = self.dimension_index(dimension)?;
        let mut values: Vec<String> = self
            .records
            .iter()
            .map(|r| r.dimensions[idx].clone())
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }

    /// Row count per category of a dimension column.
    pub fn category_counts(&self, dimension: &str) -> Result<BTreeMap<String, usize>> {
        let idx = self.dimension_index(dimension)?;
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.dimensions[idx].clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Replace non-finite component entries with the given value. Never
    /// drops rows.
    pub fn fill_missing(&mut self, value: f64) {
        for record in &mut self.records {
            for component in &mut record.components {
                if !component.is_finite() {
                    *component = value;
                }
            }
        }
    }
}
