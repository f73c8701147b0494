//! Nelder-Mead simplex minimization, used for conditional least squares
//! estimation of ARIMA coefficients.

/// Result of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point.
    pub optimal_value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the simplex converged within tolerance.
    pub converged: bool,
}

/// Configuration for Nelder-Mead minimization. Reflection, expansion,
/// contraction and shrink coefficients are the standard 1, 2, 1/2, 1/2.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the objective spread across the simplex.
    pub tolerance: f64,
    /// Initial simplex step size relative to each coordinate.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            initial_step: 0.05,
        }
    }
}

const ALPHA: f64 = 1.0; // reflection
const GAMMA: f64 = 2.0; // expansion
const RHO: f64 = 0.5; // contraction
const SIGMA: f64 = 0.5; // shrink

/// Minimize `objective` starting from `initial`, optionally clamping each
/// coordinate to `bounds`.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    // Initial simplex: the start point plus one perturbed vertex per axis.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(clamp(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if values[worst] - values[best] < config.tolerance {
            converged = true;
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; n];
        for (i, vertex) in simplex.iter().enumerate() {
            if i != worst {
                for j in 0..n {
                    centroid[j] += vertex[j];
                }
            }
        }
        for c in &mut centroid {
            *c /= n as f64;
        }

        let blend = |from: &[f64], towards: &[f64], coeff: f64| -> Vec<f64> {
            let point: Vec<f64> = from
                .iter()
                .zip(towards.iter())
                .map(|(f, t)| f + coeff * (t - f))
                .collect();
            clamp(&point, bounds)
        };

        // Reflection
        let reflected: Vec<f64> = centroid
            .iter()
            .zip(simplex[worst].iter())
            .map(|(c, w)| c + ALPHA * (c - w))
            .collect();
        let reflected = clamp(&reflected, bounds);
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            // Expansion
            let expanded = blend(&centroid, &reflected, GAMMA);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        // Contraction towards the better of (reflected, worst).
        let target = if reflected_value < values[worst] {
            &reflected
        } else {
            &simplex[worst]
        };
        let contracted = blend(&centroid, target, RHO);
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink everything towards the best vertex.
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                for j in 0..n {
                    simplex[i][j] = anchor[j] + SIGMA * (simplex[i][j] - anchor[j]);
                }
                simplex[i] = clamp(&simplex[i], bounds);
                values[i] = objective(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                if i < b.len() {
                    x.clamp(b[i].0, b[i].1)
                } else {
                    x
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimizes_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn respects_bounds() {
        // Minimize (x-5)^2 with x in [0, 3]; optimum sits on the boundary.
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn handles_rosenbrock() {
        let config = NelderMeadConfig {
            max_iter: 5000,
            tolerance: 1e-10,
            ..Default::default()
        };
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            None,
            config,
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn empty_initial_point_does_not_converge() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());
        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }

    #[test]
    fn starting_at_optimum_converges() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2),
            &[2.0],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-4);
    }
}
