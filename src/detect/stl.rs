//! STL-residual detection strategy.
//!
//! Decomposes the series, assumes approximately normal residuals and flags
//! points whose residual falls outside the two-sided confidence interval at
//! the configured significance level.

use crate::core::MetricSeries;
use crate::detect::AnomalyRecord;
use crate::error::Result;
use crate::stats::{mean, std_dev};
use crate::stl::Stl;
use statrs::distribution::{ContinuousCDF, Normal};

const MIN_STD: f64 = 1e-12;

/// Run STL-residual detection over one category's series.
///
/// Every point yields a record; `score` is the residual's distance from the
/// residual mean in standard deviations, used downstream for marker sizing.
/// A series with no residual variance has no anomalies.
pub fn detect_with_stl(
    series: &MetricSeries,
    sig_level: f64,
    period: usize,
) -> Result<Vec<AnomalyRecord>> {
    let decomposition = Stl::new(period).decompose(series.values())?;
    let residuals = &decomposition.residual;

    let mu = mean(residuals);
    let sigma = std_dev(residuals);

    if !sigma.is_finite() || sigma < MIN_STD {
        // No variance means no anomalies are possible for this category.
        return Ok(series
            .timestamps()
            .iter()
            .zip(series.values().iter())
            .map(|(&timestamp, &value)| AnomalyRecord {
                timestamp,
                category: series.category().to_string(),
                value,
                score: 0.0,
                flagged: false,
            })
            .collect());
    }

    let residual_distribution = Normal::new(mu, sigma)
        .map_err(|e| crate::error::AnomalyError::ComputationError(e.to_string()))?;
    let lower = residual_distribution.inverse_cdf(sig_level / 2.0);
    let upper = residual_distribution.inverse_cdf(1.0 - sig_level / 2.0);

    let records = series
        .timestamps()
        .iter()
        .zip(series.values().iter())
        .zip(residuals.iter())
        .map(|((&timestamp, &value), &residual)| AnomalyRecord {
            timestamp,
            category: series.category().to_string(),
            value,
            score: (residual - mu) / sigma,
            flagged: residual <= lower || residual >= upper,
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnomalyError;
    use chrono::NaiveDate;

    fn weekly_series(values: Vec<f64>) -> MetricSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(); // a Monday
        let timestamps = (0..values.len() as i64)
            .map(|i| start + chrono::Duration::weeks(i))
            .collect();
        MetricSeries::new("A", timestamps, values).unwrap()
    }

    fn seasonal_values(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                0.2 + 0.001 * i as f64
                    + 0.05 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
            })
            .collect()
    }

    #[test]
    fn clean_series_has_records_for_every_point() {
        let series = weekly_series(seasonal_values(104));

        let records = detect_with_stl(&series, 0.05, 12).unwrap();

        assert_eq!(records.len(), 104);
        for record in &records {
            assert_eq!(record.category, "A");
            assert!(record.score.is_finite());
        }
    }

    #[test]
    fn large_spike_is_flagged() {
        let mut values = seasonal_values(104);
        values[60] += 10.0; // far beyond any residual scale

        let series = weekly_series(values);
        let records = detect_with_stl(&series, 0.05, 12).unwrap();

        assert!(records[60].flagged, "spike must be flagged");
        assert!(records[60].score.abs() > 2.0);
    }

    #[test]
    fn constant_series_has_no_anomalies() {
        let series = weekly_series(vec![1.0; 52]);

        let records = detect_with_stl(&series, 0.05, 12).unwrap();

        assert_eq!(records.len(), 52);
        for record in records {
            assert!(!record.flagged);
            assert_eq!(record.score, 0.0);
        }
    }

    #[test]
    fn short_series_is_insufficient() {
        let series = weekly_series(vec![1.0, 2.0, 3.0]);
        let result = detect_with_stl(&series, 0.05, 12);
        assert!(matches!(
            result,
            Err(AnomalyError::InsufficientData { .. })
        ));
    }

    #[test]
    fn tighter_sig_level_flags_fewer_points() {
        let mut values = seasonal_values(156);
        // Mild perturbations around the edge of the band.
        for i in (0..156).step_by(13) {
            values[i] += 0.01;
        }
        let series = weekly_series(values);

        let loose = detect_with_stl(&series, 0.20, 12).unwrap();
        let tight = detect_with_stl(&series, 0.01, 12).unwrap();

        let loose_count = loose.iter().filter(|r| r.flagged).count();
        let tight_count = tight.iter().filter(|r| r.flagged).count();
        assert!(tight_count <= loose_count);
    }
}
