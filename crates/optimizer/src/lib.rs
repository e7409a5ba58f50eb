//! # Allocation Optimizer
//!
//! Produces capital-allocation weights for a strategy collection via one of
//! six named methods, from naive equal weighting to constrained numeric
//! maximization of the portfolio Sharpe or Omega ratio.
//!
//! ## Architectural Principles
//!
//! - **Stateless:** every call is a pure function of the strategy collection
//!   and the method; the only tunable (the Omega threshold) lives on the
//!   optimizer value itself and defaults to the system-wide convention of 0.
//! - **Never fails:** degenerate inputs and solver non-convergence fall back
//!   to equal weight, which itself degrades to an empty mapping for zero
//!   strategies. On success, weights are normalized to sum to 1.
//! - **Deterministic:** the numeric methods start from uniform weights with
//!   a fixed iteration budget, so identical inputs yield identical weights.

use analytics::stats;
use core_types::{StrategySet, aligned_return_matrix};
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeMap;
use tracing::warn;

pub mod method;
pub mod solver;

pub use method::Method;

/// Weight mapping from strategy name to allocation fraction.
pub type WeightMap = BTreeMap<String, f64>;

/// The allocation optimizer.
#[derive(Debug, Clone)]
pub struct AllocationOptimizer {
    omega_threshold: f64,
}

impl AllocationOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the Omega threshold. Every other component assumes the
    /// default of 0; change it only if every consumer changes with it.
    pub fn with_omega_threshold(omega_threshold: f64) -> Self {
        Self { omega_threshold }
    }

    /// Computes allocation weights for `strategies` using `method`.
    ///
    /// The result is normalized to sum to 1 (empty for an empty collection).
    pub fn optimize(&self, strategies: &StrategySet, method: Method) -> WeightMap {
        let mut weights = match method {
            Method::EqualWeight => self.equal_weight(strategies),
            Method::RiskParity => self.risk_parity(strategies),
            Method::MinVariance => self.min_variance(strategies),
            Method::MaxSharpe => self.max_sharpe(strategies),
            Method::MaxOmega => self.max_omega(strategies),
            Method::Kelly => self.kelly(strategies),
        };
        normalize(&mut weights);
        weights
    }

    fn equal_weight(&self, strategies: &StrategySet) -> WeightMap {
        let n = strategies.len();
        if n == 0 {
            return WeightMap::new();
        }
        let weight = 1.0 / n as f64;
        strategies.keys().map(|name| (name.clone(), weight)).collect()
    }

    /// Weight proportional to inverse volatility.
    fn risk_parity(&self, strategies: &StrategySet) -> WeightMap {
        let mut weights = WeightMap::new();
        for (name, strategy) in strategies {
            if strategy.returns().is_empty() {
                continue;
            }
            let vol = stats::std_dev(strategy.returns().as_slice());
            if vol > 0.0 {
                weights.insert(name.clone(), 1.0 / vol);
            }
        }
        weights
    }

    /// Closed-form minimum-variance weights from the pseudo-inverse of the
    /// covariance matrix, negative weights clipped to zero.
    fn min_variance(&self, strategies: &StrategySet) -> WeightMap {
        let matrix = aligned_return_matrix(strategies);
        let Some(cov) = covariance_matrix(&matrix.rows) else {
            return self.equal_weight(strategies);
        };

        let Ok(inv_cov) = cov.pseudo_inverse(1e-10) else {
            warn!("covariance pseudo-inverse failed, falling back to equal weight");
            return self.equal_weight(strategies);
        };

        let n = matrix.rows.len();
        let ones = DVector::from_element(n, 1.0);
        let numerator = &inv_cov * &ones;
        let denominator = ones.dot(&numerator);
        if denominator == 0.0 || !denominator.is_finite() {
            warn!("degenerate minimum-variance denominator, falling back to equal weight");
            return self.equal_weight(strategies);
        }

        let clipped: Vec<f64> = (numerator / denominator)
            .iter()
            .map(|w| w.max(0.0))
            .collect();
        if clipped.iter().sum::<f64>() <= 0.0 {
            return self.equal_weight(strategies);
        }

        matrix.names.into_iter().zip(clipped).collect()
    }

    /// Numeric maximization of the weighted portfolio's Sharpe ratio.
    fn max_sharpe(&self, strategies: &StrategySet) -> WeightMap {
        let matrix = aligned_return_matrix(strategies);
        let Some(cov) = covariance_matrix(&matrix.rows) else {
            return self.equal_weight(strategies);
        };
        let means: Vec<f64> = matrix.rows.iter().map(|row| stats::mean(row)).collect();

        let objective = |w: &[f64]| {
            let portfolio_return: f64 = w.iter().zip(&means).map(|(wi, mi)| wi * mi).sum();
            let wv = DVector::from_column_slice(w);
            let portfolio_vol = (wv.transpose() * &cov * &wv)[(0, 0)].sqrt();
            if portfolio_vol > 0.0 {
                -portfolio_return / portfolio_vol
            } else {
                0.0
            }
        };

        self.solve_or_equal_weight(objective, &matrix.names, strategies)
    }

    /// Numeric maximization of the weighted portfolio's Omega ratio, using
    /// the same threshold convention as the metrics engine.
    fn max_omega(&self, strategies: &StrategySet) -> WeightMap {
        let matrix = aligned_return_matrix(strategies);
        if matrix.is_empty() {
            return self.equal_weight(strategies);
        }

        let threshold = self.omega_threshold;
        let rows = matrix.rows.clone();
        let width = matrix.width();
        let objective = move |w: &[f64]| {
            let portfolio: Vec<f64> = (0..width)
                .map(|t| rows.iter().zip(w).map(|(row, wi)| row[t] * wi).sum())
                .collect();
            let omega = analytics::omega_ratio(&portfolio, threshold);
            // A portfolio with no shortfalls scores a large bounded value so
            // the minimizer stays finite.
            if omega.is_infinite() { -100.0 } else { -omega }
        };

        self.solve_or_equal_weight(objective, &matrix.names, strategies)
    }

    /// Per-strategy Kelly fraction, quarter-sized and capped at 25%.
    fn kelly(&self, strategies: &StrategySet) -> WeightMap {
        let mut weights = WeightMap::new();
        for (name, strategy) in strategies {
            let weight = match strategy.metric("kelly_criterion") {
                Some(kelly) => (kelly * 0.25).clamp(0.0, 0.25),
                // Strategies without the metric get a small constant stake
                // before renormalization.
                None => 0.02,
            };
            weights.insert(name.clone(), weight);
        }
        weights
    }

    fn solve_or_equal_weight<F>(
        &self,
        objective: F,
        names: &[String],
        strategies: &StrategySet,
    ) -> WeightMap
    where
        F: Fn(&[f64]) -> f64,
    {
        match solver::minimize_on_simplex(&objective, names.len()) {
            Some(weights) if weights.iter().all(|w| w.is_finite()) => names
                .iter()
                .cloned()
                .zip(weights)
                .collect(),
            _ => {
                warn!("numeric optimization did not converge, falling back to equal weight");
                self.equal_weight(strategies)
            }
        }
    }
}

impl Default for AllocationOptimizer {
    fn default() -> Self {
        Self { omega_threshold: 0.0 }
    }
}

/// Sample covariance matrix (divide by n - 1) over aligned rows. `None` when
/// there are no rows or too few observations for a sample estimate.
fn covariance_matrix(rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    let n = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if n == 0 || width < 2 {
        return None;
    }

    let means: Vec<f64> = rows.iter().map(|row| stats::mean(row)).collect();
    Some(DMatrix::from_fn(n, n, |i, j| {
        rows[i]
            .iter()
            .zip(&rows[j])
            .map(|(a, b)| (a - means[i]) * (b - means[j]))
            .sum::<f64>()
            / (width - 1) as f64
    }))
}

fn normalize(weights: &mut WeightMap) {
    let total: f64 = weights.values().sum();
    if total > 0.0 {
        for weight in weights.values_mut() {
            *weight /= total;
        }
    }
}
