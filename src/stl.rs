//! Seasonal-trend decomposition using LOESS.
//!
//! Splits a series into trend, seasonal and residual components via
//! iterated cycle-subseries smoothing (Cleveland et al. 1990). The STL
//! detection strategy analyzes the residual component for outliers.

use crate::error::{AnomalyError, Result};

/// Components of an additive decomposition: `y = trend + seasonal + residual`.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal component.
    pub seasonal: Vec<f64>,
    /// Residual component.
    pub residual: Vec<f64>,
}

/// STL decomposition configuration and algorithm.
#[derive(Debug, Clone)]
pub struct Stl {
    period: usize,
    seasonal_smoothness: usize,
    trend_smoothness: usize,
    low_pass_smoothness: usize,
    inner_iterations: usize,
    outer_iterations: usize,
    robust: bool,
}

impl Stl {
    /// Create a decomposer for the given seasonal period with smoothing
    /// spans derived from the period (spans must be odd).
    pub fn new(period: usize) -> Self {
        let ns = period | 1;
        let nt = (1.5 * period as f64 / (1.0 - 1.5 / ns as f64)).ceil() as usize;
        let nt = nt | 1;
        let nl = period | 1;

        Self {
            period,
            seasonal_smoothness: ns,
            trend_smoothness: nt,
            low_pass_smoothness: nl,
            inner_iterations: 2,
            outer_iterations: 0,
            robust: false,
        }
    }

    /// Set a custom seasonal smoothing span.
    pub fn with_seasonal_smoothness(mut self, ns: usize) -> Self {
        self.seasonal_smoothness = ns | 1;
        self
    }

    /// Set a custom trend smoothing span.
    pub fn with_trend_smoothness(mut self, nt: usize) -> Self {
        self.trend_smoothness = nt | 1;
        self
    }

    /// Enable robustness iterations that downweight large residuals.
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self.outer_iterations = 6;
        self
    }

    /// Set the number of inner iterations.
    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n;
        self
    }

    /// Decompose the series. Requires at least two full seasonal cycles.
    pub fn decompose(&self, series: &[f64]) -> Result<Decomposition> {
        let n = series.len();
        if n < 2 * self.period {
            return Err(AnomalyError::InsufficientData {
                needed: 2 * self.period,
                got: n,
            });
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];

        let outer_iters = if self.robust {
            self.outer_iterations.max(1)
        } else {
            1
        };

        for _ in 0..outer_iters {
            for _ in 0..self.inner_iterations {
                // Detrend, smooth each cycle-subseries, then remove the
                // low-pass component to isolate the seasonal part.
                let detrended: Vec<f64> =
                    series.iter().zip(trend.iter()).map(|(y, t)| y - t).collect();
                let cycle = self.smooth_cycle_subseries(&detrended, &weights);
                let low_pass = self.low_pass_filter(&cycle);
                for i in 0..n {
                    seasonal[i] = cycle[i] - low_pass[i];
                }

                // Deseasonalize and re-estimate the trend.
                let deseasonalized: Vec<f64> = series
                    .iter()
                    .zip(seasonal.iter())
                    .map(|(y, s)| y - s)
                    .collect();
                trend = loess_smooth(&deseasonalized, self.trend_smoothness, &weights);
            }

            if self.robust {
                let residual: Vec<f64> = series
                    .iter()
                    .zip(seasonal.iter())
                    .zip(trend.iter())
                    .map(|((y, s), t)| y - s - t)
                    .collect();
                weights = robustness_weights(&residual);
            }
        }

        let residual: Vec<f64> = series
            .iter()
            .zip(seasonal.iter())
            .zip(trend.iter())
            .map(|((y, s), t)| y - s - t)
            .collect();

        Ok(Decomposition {
            trend,
            seasonal,
            residual,
        })
    }

    /// Smooth each cycle-subseries (one per position in the seasonal cycle).
    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let period = self.period;
        let mut result = vec![0.0; n];

        for cycle_pos in 0..period {
            let mut sub_values = Vec::new();
            let mut sub_weights = Vec::new();
            let mut sub_indices = Vec::new();

            for (i, (&val, &w)) in detrended.iter().zip(weights.iter()).enumerate() {
                if i % period == cycle_pos {
                    sub_values.push(val);
                    sub_weights.push(w);
                    sub_indices.push(i);
                }
            }

            let smoothed = loess_smooth(&sub_values, self.seasonal_smoothness, &sub_weights);
            for (&idx, &val) in sub_indices.iter().zip(smoothed.iter()) {
                result[idx] = val;
            }
        }

        result
    }

    /// Moving-average cascade followed by LOESS, removing seasonal leakage
    /// from the smoothed cycle-subseries.
    fn low_pass_filter(&self, series: &[f64]) -> Vec<f64> {
        let ma1 = moving_average(series, self.period);
        let ma2 = moving_average(&ma1, self.period);
        let ma3 = moving_average(&ma2, 3);

        let weights = vec![1.0; series.len()];
        loess_smooth(&ma3, self.low_pass_smoothness, &weights)
    }
}

/// Tricube-weighted local smoothing (LOESS reduced to a weighted local
/// mean, which suffices for residual extraction).
fn loess_smooth(values: &[f64], span: usize, weights: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let half_span = span / 2;
    let mut result = vec![0.0; n];

    for i in 0..n {
        let start = i.saturating_sub(half_span);
        let end = (i + half_span + 1).min(n);

        let mut sum_weights = 0.0;
        let mut sum_values = 0.0;

        for j in start..end {
            let dist = (i as f64 - j as f64).abs();
            let u = dist / (half_span as f64 + 1.0);
            let tricube = if u < 1.0 {
                (1.0 - u.powi(3)).powi(3)
            } else {
                0.0
            };
            let w = tricube * weights[j];
            sum_weights += w;
            sum_values += w * values[j];
        }

        result[i] = if sum_weights > 0.0 {
            sum_values / sum_weights
        } else {
            values[i]
        };
    }

    result
}

/// Simple centered moving average.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    let mut result = vec![0.0; n];

    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let sum: f64 = series[start..end].iter().sum();
        result[i] = sum / (end - start) as f64;
    }

    result
}

/// Bisquare weights from the median absolute residual.
fn robustness_weights(residual: &[f64]) -> Vec<f64> {
    let n = residual.len();
    let mut sorted: Vec<f64> = residual.iter().map(|r| r.abs()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    let h = 6.0 * median;

    residual
        .iter()
        .map(|r| {
            if h < 1e-10 {
                return 1.0;
            }
            let u = r.abs() / h;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}
