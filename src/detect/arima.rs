//! ARIMA-forecast detection strategy (legacy, retained for compatibility).
//!
//! Splits the series into a training segment and a recent test segment,
//! fits the best ARIMA model on the training data and flags test points
//! falling outside the forecast confidence interval.

use crate::arima::{estimate_orders, search_best_model};
use crate::config::ArimaOptions;
use crate::core::MetricSeries;
use crate::detect::AnomalyRecord;
use crate::error::{AnomalyError, Result};

/// Minimum training length for order estimation and fitting.
const MIN_TRAIN: usize = 10;

const MIN_HALF_WIDTH: f64 = 1e-12;

/// Run ARIMA-forecast detection over one category's series.
///
/// The last `steps` observations form the test segment; each yields a
/// record with `score` equal to the distance from the point forecast in
/// interval half-widths. A degenerate white-noise fit degrades to the
/// constant forecast's confidence band.
pub fn detect_with_arima(
    series: &MetricSeries,
    sig_level: f64,
    options: &ArimaOptions,
) -> Result<Vec<AnomalyRecord>> {
    let n = series.len();
    let steps = options.steps;

    if n < steps + MIN_TRAIN {
        return Err(AnomalyError::InsufficientData {
            needed: steps + MIN_TRAIN,
            got: n,
        });
    }

    let train = &series.values()[..n - steps];
    let test = &series.values()[n - steps..];
    let test_timestamps = &series.timestamps()[n - steps..];

    let orders = estimate_orders(train, options.max_diff, sig_level);
    let model = search_best_model(train, orders)?;
    tracing::debug!(
        category = series.category(),
        p = model.order().p,
        d = model.order().d,
        q = model.order().q,
        "selected ARIMA order"
    );

    let (point, lower, upper) = model.predict_with_intervals(steps, 1.0 - sig_level)?;

    let records = test_timestamps
        .iter()
        .zip(test.iter())
        .enumerate()
        .map(|(i, (&timestamp, &value))| {
            let half_width = (upper[i] - lower[i]) / 2.0;
            let (score, flagged) = if half_width < MIN_HALF_WIDTH {
                // Zero-width band: no variance, no anomalies possible.
                (0.0, false)
            } else {
                (
                    (value - point[i]) / half_width,
                    value < lower[i] || value > upper[i],
                )
            };
            AnomalyRecord {
                timestamp,
                category: series.category().to_string(),
                value,
                score,
                flagged,
            }
        })
        .collect();

    Ok(records)
}
