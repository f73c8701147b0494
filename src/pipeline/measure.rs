//! Stage 6: derive the measure column from aggregated components.

use crate::config::{Measure, MeasureRule};
use crate::core::{Dataset, Schema};
use crate::error::Result;
use crate::pipeline::Transform;

/// Appends the derived measure column. Measures are ratios or aggregates
/// that are only valid after collapsing, so this stage runs last.
#[derive(Debug, Clone)]
pub struct AddMeasure {
    measure: Measure,
}

impl AddMeasure {
    /// Create a measure-derivation stage.
    pub fn new(measure: Measure) -> Self {
        Self { measure }
    }
}

impl Transform for AddMeasure {
    fn name(&self) -> &'static str {
        "add_measure"
    }

    fn apply(&self, data: Dataset) -> Result<Dataset> {
        let derive: Box<dyn Fn(&[f64]) -> f64> = match self.measure.rule() {
            MeasureRule::Sum { component } => {
                let idx = data.component_index(component)?;
                Box::new(move |components: &[f64]| components[idx])
            }
            MeasureRule::Ratio {
                numerator,
                denominator,
            } => {
                let num_idx = data.component_index(numerator)?;
                let den_idx = data.component_index(denominator)?;
                Box::new(move |components: &[f64]| {
                    if components[den_idx] == 0.0 {
                        0.0
                    } else {
                        components[num_idx] / components[den_idx]
                    }
                })
            }
            // One per collapsed unit; the share of the whole is computed
            // downstream, so the column is exactly constant 1.
            MeasureRule::Proportion { component } => {
                data.component_index(component)?;
                Box::new(|_: &[f64]| 1.0)
            }
        };

        let mut components = data.schema().components().to_vec();
        components.push(self.measure.name().to_string());
        let schema = Schema::new(data.schema().dimensions().to_vec(), components);

        let mut derived = Dataset::new(schema);
        for record in data.records() {
            let mut values = record.components.clone();
            values.push(derive(&record.components));
            derived.push_row(record.date, record.dimensions.clone(), values)?;
        }
        Ok(derived)
    }
}
