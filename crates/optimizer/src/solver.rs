//! A deterministic projected-gradient solver over the unit simplex.
//!
//! The max-Sharpe and max-Omega methods need a constrained minimizer
//! (weights in `[0, 1]`, summing to 1). This one uses a fixed uniform
//! starting point, central-difference gradients and a backtracking line
//! search, so repeated calls on the same inputs produce identical weights.

const MAX_ITERATIONS: usize = 200;
const GRADIENT_EPS: f64 = 1e-6;
const MIN_STEP: f64 = 1e-10;

/// Minimizes `objective` over the probability simplex of dimension `n`.
///
/// Returns `None` when the problem is degenerate (`n == 0`, or the objective
/// is non-finite at the starting point); callers treat that as
/// non-convergence and fall back to equal weight.
pub fn minimize_on_simplex<F>(objective: F, n: usize) -> Option<Vec<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if n == 0 {
        return None;
    }

    let mut x = vec![1.0 / n as f64; n];
    let mut fx = objective(&x);
    if !fx.is_finite() {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let gradient = numerical_gradient(&objective, &x);
        if gradient.iter().any(|g| !g.is_finite()) {
            break;
        }

        // Backtracking line search along the projected direction.
        let mut step = 1.0;
        let mut improved = false;
        while step > MIN_STEP {
            let candidate: Vec<f64> = x
                .iter()
                .zip(&gradient)
                .map(|(xi, gi)| xi - step * gi)
                .collect();
            let candidate = project_to_simplex(&candidate);
            let fc = objective(&candidate);
            if fc.is_finite() && fc < fx - 1e-12 {
                x = candidate;
                fx = fc;
                improved = true;
                break;
            }
            step *= 0.5;
        }

        if !improved {
            break;
        }
    }

    Some(x)
}

fn numerical_gradient<F>(objective: &F, x: &[f64]) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut gradient = vec![0.0; x.len()];
    let mut probe = x.to_vec();
    for i in 0..x.len() {
        probe[i] = x[i] + GRADIENT_EPS;
        let upper = objective(&probe);
        probe[i] = x[i] - GRADIENT_EPS;
        let lower = objective(&probe);
        probe[i] = x[i];
        gradient[i] = (upper - lower) / (2.0 * GRADIENT_EPS);
    }
    gradient
}

/// Euclidean projection onto `{ w : w_i >= 0, sum w_i = 1 }`.
///
/// With the sum fixed at 1 and weights non-negative, the `[0, 1]` box bound
/// holds automatically.
pub fn project_to_simplex(v: &[f64]) -> Vec<f64> {
    let n = v.len();
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let mut cumulative = 0.0;
    let mut threshold = 0.0;
    for (i, &value) in sorted.iter().enumerate() {
        cumulative += value;
        let candidate = (cumulative - 1.0) / (i + 1) as f64;
        if value - candidate > 0.0 {
            threshold = candidate;
        }
    }

    v.iter().map(|&vi| (vi - threshold).max(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_lands_on_simplex() {
        let projected = project_to_simplex(&[0.8, 0.8, -0.1]);
        let sum: f64 = projected.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(projected.iter().all(|w| *w >= 0.0));
    }

    #[test]
    fn projection_is_identity_on_simplex_points() {
        let point = [0.25, 0.25, 0.5];
        let projected = project_to_simplex(&point);
        for (a, b) in point.iter().zip(&projected) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn minimizes_a_quadratic() {
        // min sum((w_i - target_i)^2) over the simplex, target on the simplex.
        let target = [0.7, 0.2, 0.1];
        let weights = minimize_on_simplex(
            |w| {
                w.iter()
                    .zip(&target)
                    .map(|(wi, ti)| (wi - ti).powi(2))
                    .sum()
            },
            3,
        )
        .unwrap();
        for (w, t) in weights.iter().zip(&target) {
            assert!((w - t).abs() < 1e-3, "weights {weights:?}");
        }
    }

    #[test]
    fn same_inputs_same_outputs() {
        let objective = |w: &[f64]| w[0] * w[0] + 2.0 * w[1];
        let first = minimize_on_simplex(objective, 2).unwrap();
        let second = minimize_on_simplex(objective, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn degenerate_dimension_is_none() {
        assert!(minimize_on_simplex(|_| 0.0, 0).is_none());
    }
}
