//! ARIMA order estimation and AICc-based grid search.
//!
//! The differencing order is the smallest-variance differenced series that
//! passes the ADF unit-root test; the AR and MA order ceilings come from
//! the number of leading PACF/ACF lags outside the critical band. The final
//! model minimizes AICc over the full (p', d, q') grid.

use crate::arima::diff::difference;
use crate::arima::model::Arima;
use crate::arima::stationarity::is_stationary;
use crate::error::{AnomalyError, Result};
use crate::stats::{autocorrelation, partial_autocorrelation, std_dev};
use statrs::distribution::{ContinuousCDF, Normal};

/// Select the differencing order: difference up to `max_diff` times, order
/// the candidates by ascending standard deviation, and take the first one
/// that is stationary at the given significance level. Falls back to 0 when
/// nothing passes (e.g. degenerate input).
pub fn select_d(values: &[f64], max_diff: usize, sig_level: f64) -> usize {
    let mut candidates: Vec<(usize, Vec<f64>, f64)> = Vec::with_capacity(max_diff + 1);
    candidates.push((0, values.to_vec(), std_dev(values)));

    let mut current = values.to_vec();
    for order in 1..=max_diff {
        if current.len() <= 1 {
            break;
        }
        current = difference(&current, 1);
        candidates.push((order, current.clone(), std_dev(&current)));
    }

    // Stable sort keeps lower orders first on ties.
    candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    for (order, series, _) in &candidates {
        if is_stationary(series, sig_level) {
            return *order;
        }
    }

    0
}

/// Number of lags to include in the ACF/PACF scans.
fn scan_lags(n: usize) -> usize {
    if n < 8 {
        return 0;
    }
    let by_size = (10.0 * (n as f64).log10()) as usize;
    by_size.min(n / 2 - 1)
}

/// Half-width of the critical band for correlation coefficients.
fn critical_band(n: usize, sig_level: f64) -> f64 {
    let normal = match Normal::new(0.0, 1.0) {
        Ok(normal) => normal,
        Err(_) => return f64::INFINITY,
    };
    normal.inverse_cdf(1.0 - sig_level / 2.0) / (n as f64).sqrt()
}

/// Upper bound for the AR order p: the number of leading PACF lags outside
/// the critical band.
pub fn max_ar_order(values: &[f64], sig_level: f64) -> usize {
    let nlags = scan_lags(values.len());
    if nlags == 0 {
        return 0;
    }
    let band = critical_band(values.len(), sig_level);

    let mut p = 0;
    for lag in 1..=nlags {
        let value = partial_autocorrelation(values, lag);
        if value.is_finite() && value.abs() >= band {
            p += 1;
        } else {
            break;
        }
    }
    p
}

/// Upper bound for the MA order q: the number of leading ACF lags outside
/// the critical band.
pub fn max_ma_order(values: &[f64], sig_level: f64) -> usize {
    let nlags = scan_lags(values.len());
    if nlags == 0 {
        return 0;
    }
    let band = critical_band(values.len(), sig_level);

    let mut q = 0;
    for lag in 1..=nlags {
        let value = autocorrelation(values, lag);
        if value.is_finite() && value.abs() >= band {
            q += 1;
        } else {
            break;
        }
    }
    q
}

/// Estimate starting orders (p, d, q) for a series. `d` is the selected
/// differencing order; `p` and `q` are ceilings from the PACF/ACF of the
/// differenced series. An excessive MA order trades lags for extra
/// differencing.
pub fn estimate_orders(values: &[f64], max_diff: usize, sig_level: f64) -> (usize, usize, usize) {
    let mut d = select_d(values, max_diff, sig_level);
    let mut differenced = difference(values, d);

    let mut p = max_ar_order(&differenced, sig_level);
    let mut q = max_ma_order(&differenced, sig_level);

    while q >= 10 {
        q -= 5;
        d += 1;
        differenced = difference(&differenced, 1);
        p = max_ar_order(&differenced, sig_level);
    }

    (p, d, q)
}

/// Grid-search all (p', d, q') with 0 <= p' <= p and 0 <= q' <= q, fitting
/// each candidate and returning the model with the smallest AICc.
pub fn search_best_model(values: &[f64], orders: (usize, usize, usize)) -> Result<Arima> {
    let (max_p, d, max_q) = orders;

    let mut best: Option<(f64, Arima)> = None;

    for p in 0..=max_p {
        for q in 0..=max_q {
            let mut model = Arima::new(p, d, q);
            if model.fit(values).is_err() {
                continue;
            }
            let Some(score) = model.aicc() else {
                continue;
            };
            if score.is_nan() {
                continue;
            }
            match &best {
                Some((best_score, _)) if score >= *best_score => {}
                _ => best = Some((score, model)),
            }
        }
    }

    best.map(|(_, model)| model).ok_or_else(|| {
        AnomalyError::ComputationError("no ARIMA model could be fitted".to_string())
    })
}
