//! Property-based tests for the pipeline and decomposition invariants.
//!
//! These verify properties that should hold for all valid inputs, using
//! randomly generated data.

use chrono::NaiveDate;
use metric_anomaly::arima::{difference, integrate};
use metric_anomaly::config::{Dimension, Frequency};
use metric_anomaly::core::{Dataset, Schema};
use metric_anomaly::pipeline::{Collapse, ConvertFrequency, FillMissing, Pipeline, Transform};
use metric_anomaly::stl::Stl;
use proptest::prelude::*;

fn single_category_dataset(values: &[f64]) -> Dataset {
    let schema = Schema::new(vec!["cat".to_string()], vec!["count".to_string()]);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut data = Dataset::new(schema);
    for (i, &value) in values.iter().enumerate() {
        data.push_row(
            start + chrono::Duration::days(i as i64),
            vec!["A".to_string()],
            vec![value],
        )
        .unwrap();
    }
    data
}

/// Values that avoid numerical extremes.
fn value_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000.0..1000.0_f64, min_len..max_len)
}

proptest! {
    #[test]
    fn stl_decomposition_is_additive(values in value_strategy(24, 80)) {
        let result = Stl::new(12).decompose(&values).unwrap();

        for i in 0..values.len() {
            let reconstructed = result.trend[i] + result.seasonal[i] + result.residual[i];
            prop_assert!((values[i] - reconstructed).abs() < 1e-8);
        }
    }

    #[test]
    fn integrate_continues_from_last_value(
        values in value_strategy(2, 40),
        step in -100.0..100.0_f64,
    ) {
        let integrated = integrate(&[step], &values, 1);
        prop_assert!((integrated[0] - (values.last().unwrap() + step)).abs() < 1e-9);
    }

    #[test]
    fn difference_then_integrate_restores_series(
        values in value_strategy(3, 40),
    ) {
        // Re-integrating the differenced series from the first value must
        // reproduce the original tail.
        let diffs = difference(&values, 1);
        prop_assert_eq!(diffs.len(), values.len() - 1);

        let restored = integrate(&diffs, &values[..1], 1);
        for (restored_value, original) in restored.iter().zip(values[1..].iter()) {
            prop_assert!((restored_value - original).abs() < 1e-9);
        }
    }

    #[test]
    fn fill_missing_never_changes_row_count(values in value_strategy(1, 50)) {
        let mut with_gaps = values.clone();
        for i in (0..with_gaps.len()).step_by(3) {
            with_gaps[i] = f64::NAN;
        }

        let data = single_category_dataset(&with_gaps);
        let filled = FillMissing::new(0.0).apply(data.clone()).unwrap();

        prop_assert_eq!(filled.len(), data.len());
        for record in filled.records() {
            prop_assert!(record.components.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn collapse_resample_pair_is_idempotent(values in value_strategy(7, 60)) {
        let pipeline = || {
            Pipeline::new()
                .push(Collapse::new(Dimension::column("cat")))
                .push(ConvertFrequency::new(Frequency::Weekly))
        };

        let once = pipeline().apply(single_category_dataset(&values)).unwrap();
        let twice = pipeline().apply(once.clone()).unwrap();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn collapse_preserves_component_totals(values in value_strategy(1, 60)) {
        let data = single_category_dataset(&values);
        let collapsed = Collapse::new(Dimension::All).apply(data).unwrap();

        let total: f64 = values.iter().sum();
        let collapsed_total: f64 = collapsed
            .records()
            .iter()
            .map(|r| r.components[0])
            .sum();
        prop_assert!((total - collapsed_total).abs() < 1e-6);
    }

    #[test]
    fn append_mismatch_is_always_a_no_op(
        values in value_strategy(1, 30),
        other_column in "[a-z]{1,8}",
    ) {
        prop_assume!(other_column != "count");

        let mut data = single_category_dataset(&values);
        let before = data.clone();

        let other_schema = Schema::new(vec!["cat".to_string()], vec![other_column]);
        let mut other = Dataset::new(other_schema);
        other
            .push_row(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                vec!["B".to_string()],
                vec![1.0],
            )
            .unwrap();

        prop_assert!(data.append(&other).is_err());
        prop_assert_eq!(data, before);
    }
}
