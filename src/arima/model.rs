//! ARIMA(p, d, q) fitted by conditional least squares.

use crate::arima::diff::{difference, integrate};
use crate::error::{AnomalyError, Result};
use crate::stats::{nelder_mead, NelderMeadConfig};
use statrs::distribution::{ContinuousCDF, Normal};

/// Model orders (p, d, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl ArimaOrder {
    /// Create an order triple.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of estimated parameters (AR + MA + intercept).
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }
}

/// An ARIMA forecasting model.
///
/// Coefficients are estimated by minimizing the conditional sum of squares
/// of the differenced series; information criteria are derived from the
/// residual variance under a Gaussian likelihood.
#[derive(Debug, Clone)]
pub struct Arima {
    order: ArimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    intercept: f64,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    aicc: Option<f64>,
}

impl Arima {
    /// Create an unfitted model with the given orders.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            order: ArimaOrder::new(p, d, q),
            ar: vec![],
            ma: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            aicc: None,
        }
    }

    /// The model orders.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Estimated AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    /// Estimated MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Estimated intercept on the differenced scale.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Akaike information criterion of the fit.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Small-sample corrected AIC.
    pub fn aicc(&self) -> Option<f64> {
        self.aicc
    }

    /// Residuals on the differenced scale.
    pub fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    /// Fit the model to a series.
    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        let min_len = self.order.d + self.order.p.max(self.order.q) + 2;
        if values.len() < min_len {
            return Err(AnomalyError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        self.original = Some(values.to_vec());
        let diff_series = difference(values, self.order.d);
        self.estimate_parameters(&diff_series);
        self.calculate_fit_statistics(&diff_series);
        self.differenced = Some(diff_series);

        Ok(())
    }

    /// Point forecast for the given horizon.
    pub fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let original = self.original.as_ref().ok_or(AnomalyError::FitRequired)?;
        let diff_series = self.differenced.as_ref().ok_or(AnomalyError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(AnomalyError::FitRequired)?;

        if horizon == 0 {
            return Ok(vec![]);
        }

        let p = self.order.p;
        let q = self.order.q;

        let mut extended = diff_series.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;

            for i in 0..p {
                if t > i {
                    pred += self.ar[i] * (extended[t - 1 - i] - self.intercept);
                }
            }
            // Future shocks are zero, so only observed residuals contribute.
            for i in 0..q {
                if t > i {
                    pred += self.ma[i] * extended_residuals[t - 1 - i];
                }
            }

            extended.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff: Vec<f64> = extended[diff_series.len()..].to_vec();
        let predictions = if self.order.d > 0 {
            integrate(&forecast_diff, original, self.order.d)
        } else {
            forecast_diff
        };

        Ok(predictions)
    }

    /// Forecast with symmetric confidence intervals at the given level
    /// (e.g. 0.95). Returns (point, lower, upper).
    pub fn predict_with_intervals(
        &self,
        horizon: usize,
        level: f64,
    ) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        if !(level > 0.0 && level < 1.0) {
            return Err(AnomalyError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }

        let point = self.predict(horizon)?;
        let variance = self.residual_variance.unwrap_or(0.0).max(0.0);

        let standard_normal = Normal::new(0.0, 1.0)
            .map_err(|e| AnomalyError::ComputationError(e.to_string()))?;
        let z = standard_normal.inverse_cdf((1.0 + level) / 2.0);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            // Forecast variance grows with the horizon.
            let se = (variance * h as f64).sqrt();
            lower.push(point[h - 1] - z * se);
            upper.push(point[h - 1] + z * se);
        }

        Ok((point, lower, upper))
    }

    /// Conditional sum of squares for a given parameter set.
    fn conditional_sum_of_squares(
        diff_series: &[f64],
        p: usize,
        q: usize,
        ar: &[f64],
        ma: &[f64],
        intercept: f64,
    ) -> f64 {
        let n = diff_series.len();
        let start = p.max(q);
        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut css = 0.0;

        for t in start..n {
            let mut pred = intercept;
            for i in 0..p {
                pred += ar[i] * (diff_series[t - 1 - i] - intercept);
            }
            for i in 0..q {
                pred += ma[i] * residuals[t - 1 - i];
            }

            let error = diff_series[t] - pred;
            residuals[t] = error;
            css += error * error;
        }

        css
    }

    fn estimate_parameters(&mut self, diff_series: &[f64]) {
        let p = self.order.p;
        let q = self.order.q;
        let mean = if diff_series.is_empty() {
            0.0
        } else {
            diff_series.iter().sum::<f64>() / diff_series.len() as f64
        };

        if p == 0 && q == 0 {
            self.intercept = mean;
            self.ar = vec![];
            self.ma = vec![];
            return;
        }

        let n_params = p + q + 1;
        let mut initial = vec![0.0; n_params];
        initial[0] = mean;
        for i in 0..p {
            initial[1 + i] = 0.1 / (i + 1) as f64;
        }
        for i in 0..q {
            initial[1 + p + i] = 0.1 / (i + 1) as f64;
        }

        // Coefficient bounds keep the fit inside the stationary/invertible
        // region.
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        for _ in 0..(p + q) {
            bounds.push((-0.99, 0.99));
        }

        let result = nelder_mead(
            |params| {
                let intercept = params[0];
                let ar = &params[1..1 + p];
                let ma = &params[1 + p..];
                Self::conditional_sum_of_squares(diff_series, p, q, ar, ma, intercept)
            },
            &initial,
            Some(&bounds),
            NelderMeadConfig::default(),
        );

        self.intercept = result.optimal_point[0];
        self.ar = result.optimal_point[1..1 + p].to_vec();
        self.ma = result.optimal_point[1 + p..].to_vec();
    }

    fn calculate_fit_statistics(&mut self, diff_series: &[f64]) {
        let n = diff_series.len();
        let p = self.order.p;
        let q = self.order.q;
        let start = p.max(q);

        let mut residuals = vec![0.0; n];
        for t in start..n {
            let mut pred = self.intercept;
            for i in 0..p {
                pred += self.ar[i] * (diff_series[t - 1 - i] - self.intercept);
            }
            for i in 0..q {
                pred += self.ma[i] * residuals[t - 1 - i];
            }
            residuals[t] = diff_series[t] - pred;
        }

        let valid = &residuals[start..];
        if !valid.is_empty() {
            let variance = valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64;
            self.residual_variance = Some(variance);

            let n_eff = valid.len() as f64;
            let k = self.order.num_params() as f64;
            // Guard the log for perfect fits (constant series).
            let var_floor = variance.max(f64::MIN_POSITIVE);
            let ll = -0.5 * n_eff * (1.0 + var_floor.ln() + (2.0 * std::f64::consts::PI).ln());

            let aic = -2.0 * ll + 2.0 * k;
            self.aic = Some(aic);
            self.aicc = Some(if n_eff - k - 1.0 > 0.0 {
                aic + (2.0 * k * k + 2.0 * k) / (n_eff - k - 1.0)
            } else {
                f64::INFINITY
            });
        }

        self.residuals = Some(residuals);
    }
}
