//! Differencing utilities for ARIMA models.

/// Apply `d` rounds of first differencing to a series.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Reverse differencing: integrate a forecast on the differenced scale back
/// to the original scale, anchored on the tail of the original series.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let init = if level == 0 {
            *original.last().unwrap_or(&0.0)
        } else {
            *difference(original, level).last().unwrap_or(&0.0)
        };

        let mut cumsum = init;
        let mut integrated = Vec::with_capacity(result.len());
        for &step in &result {
            cumsum += step;
            integrated.push(cumsum);
        }
        result = integrated;
    }

    result
}
