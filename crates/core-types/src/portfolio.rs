use crate::strategy::{MetricMap, Strategy, StrategySet};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The aligned, stacked view of every non-empty return series in a
/// [`StrategySet`].
///
/// Derived, never persisted. Every row has identical length: all series are
/// truncated to the shortest available length, right-aligned on the most
/// recent observations. `names[i]` labels `rows[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of aligned observations per row (0 when there are no rows).
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Builds the aligned return matrix for a strategy collection.
///
/// Strategies with empty return series contribute no row. A collection with
/// no valid rows yields an empty matrix, not an error.
pub fn aligned_return_matrix(strategies: &StrategySet) -> ReturnMatrix {
    let min_len = strategies
        .values()
        .map(|s| s.returns().len())
        .filter(|&len| len > 0)
        .min()
        .unwrap_or(0);

    let mut names = Vec::new();
    let mut rows = Vec::new();
    if min_len > 0 {
        for (name, strategy) in strategies {
            if strategy.returns().is_empty() {
                continue;
            }
            names.push(name.clone());
            rows.push(strategy.returns().tail(min_len).to_vec());
        }
    }

    ReturnMatrix { names, rows }
}

/// A named collection of strategies with capital and allocation state.
///
/// Allocation weights are plain floats and are **not** constrained to sum
/// to 1: only the built-in optimization methods normalize. Manual and
/// formula-driven allocations are kept exactly as supplied so the caller can
/// observe over- or under-allocation across several active strategies.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub name: String,
    pub initial_capital: Decimal,
    pub current_capital: Decimal,
    strategies: StrategySet,
    allocations: BTreeMap<String, f64>,
    metrics: MetricMap,
}

impl Portfolio {
    pub fn new(name: impl Into<String>, initial_capital: Decimal) -> Self {
        Self {
            name: name.into(),
            initial_capital,
            current_capital: initial_capital,
            strategies: StrategySet::new(),
            allocations: BTreeMap::new(),
            metrics: MetricMap::new(),
        }
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    pub fn allocations(&self) -> &BTreeMap<String, f64> {
        &self.allocations
    }

    pub fn metrics(&self) -> &MetricMap {
        &self.metrics
    }

    /// Adds (or replaces) a strategy with an initial allocation weight, then
    /// normalizes all allocations to sum to 1.
    pub fn add_strategy(&mut self, strategy: Arc<Strategy>, allocation: f64) {
        let name = strategy.name().to_string();
        self.strategies.insert(name.clone(), strategy);
        self.allocations.insert(name, allocation);
        self.normalize_allocations();
    }

    /// Removes a strategy and its allocation entry.
    ///
    /// The remaining allocations are deliberately left un-normalized so the
    /// other weights keep their exact values.
    pub fn remove_strategy(&mut self, name: &str) {
        self.strategies.remove(name);
        self.allocations.remove(name);
    }

    /// Replaces the whole allocation mapping verbatim, without normalizing.
    ///
    /// The map may contain keys with no matching strategy; such stale entries
    /// are ignored when building the weighted return series.
    pub fn set_allocations(&mut self, allocations: BTreeMap<String, f64>) {
        self.allocations = allocations;
    }

    /// Caches the portfolio-level metric map computed by the caller.
    pub fn set_metrics(&mut self, metrics: MetricMap) {
        self.metrics = metrics;
    }

    fn normalize_allocations(&mut self) {
        let total: f64 = self.allocations.values().sum();
        if total > 0.0 {
            for weight in self.allocations.values_mut() {
                *weight /= total;
            }
        }
    }

    /// The aligned return matrix over this portfolio's strategies.
    pub fn return_matrix(&self) -> ReturnMatrix {
        aligned_return_matrix(&self.strategies)
    }

    /// The portfolio's weighted return series.
    ///
    /// Each aligned row is weighted by its allocation (0 for strategies with
    /// no allocation entry). An empty matrix or an all-zero weight vector
    /// yields an empty series.
    pub fn weighted_returns(&self) -> Vec<f64> {
        let matrix = self.return_matrix();
        if matrix.is_empty() {
            return Vec::new();
        }

        let weights: Vec<f64> = matrix
            .names
            .iter()
            .map(|name| self.allocations.get(name).copied().unwrap_or(0.0))
            .collect();
        if weights.iter().sum::<f64>() == 0.0 {
            return Vec::new();
        }

        (0..matrix.width())
            .map(|t| {
                matrix
                    .rows
                    .iter()
                    .zip(&weights)
                    .map(|(row, w)| row[t] * w)
                    .sum()
            })
            .collect()
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Herfindahl-Hirschman concentration of the allocation weights.
    pub fn concentration(&self) -> f64 {
        self.allocations.values().map(|w| w * w).sum()
    }

    /// Ratio of the weighted average member volatility to the portfolio
    /// volatility. 1.0 when the portfolio series is degenerate.
    pub fn diversification_ratio(&self) -> f64 {
        let matrix = self.return_matrix();
        if matrix.is_empty() {
            return 1.0;
        }

        let weighted_avg_vol: f64 = matrix
            .names
            .iter()
            .zip(&matrix.rows)
            .map(|(name, row)| self.allocations.get(name).copied().unwrap_or(0.0) * std_dev(row))
            .sum();

        let portfolio_vol = std_dev(&self.weighted_returns());
        if portfolio_vol == 0.0 {
            return 1.0;
        }
        weighted_avg_vol / portfolio_vol
    }

    /// Pairwise Pearson correlations over the aligned rows, keyed by the
    /// matrix's name order. Empty when the matrix is empty.
    pub fn correlation_matrix(&self) -> Vec<(String, Vec<f64>)> {
        let matrix = self.return_matrix();
        matrix
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let row = matrix
                    .rows
                    .iter()
                    .map(|other| pearson(&matrix.rows[i], other))
                    .collect();
                (name.clone(), row)
            })
            .collect()
    }

    /// The plain-data summary consumed by the export layer.
    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            name: self.name.clone(),
            initial_capital: self.initial_capital,
            current_capital: self.current_capital,
            allocations: self.allocations.clone(),
            metrics: self.metrics.clone(),
        }
    }

    /// Restores the persisted fields from a summary. Strategy data is not
    /// part of the persisted shape and is left untouched.
    pub fn apply_summary(&mut self, summary: PortfolioSummary) {
        self.name = summary.name;
        self.initial_capital = summary.initial_capital;
        self.current_capital = summary.current_capital;
        self.allocations = summary.allocations;
        self.metrics = summary.metrics;
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new("Portfolio", dec!(100_000))
    }
}

/// The persisted portfolio shape: what the export layer writes and reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub name: String,
    pub initial_capital: Decimal,
    pub current_capital: Decimal,
    pub allocations: BTreeMap<String, f64>,
    pub metrics: MetricMap,
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let cov: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / n;
    let denom = std_dev(a) * std_dev(b);
    if denom == 0.0 { 0.0 } else { cov / denom }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReturnSeries, Strategy};
    use std::sync::Arc;

    fn strategy(name: &str, returns: Vec<f64>) -> Arc<Strategy> {
        Arc::new(Strategy::new(
            name,
            ReturnSeries::new(returns),
            MetricMap::new(),
        ))
    }

    #[test]
    fn matrix_truncates_to_shortest_right_aligned() {
        let mut portfolio = Portfolio::default();
        portfolio.add_strategy(strategy("a", vec![0.05, 0.01, -0.02, 0.03]), 0.5);
        portfolio.add_strategy(strategy("b", vec![0.02, 0.00]), 0.5);

        let matrix = portfolio.return_matrix();
        assert_eq!(matrix.names, vec!["a", "b"]);
        assert_eq!(matrix.rows[0], vec![-0.02, 0.03]);
        assert_eq!(matrix.rows[1], vec![0.02, 0.00]);
    }

    #[test]
    fn empty_strategies_contribute_no_row() {
        let mut portfolio = Portfolio::default();
        portfolio.add_strategy(strategy("a", vec![0.01, 0.02]), 0.5);
        portfolio.add_strategy(strategy("empty", vec![]), 0.5);

        let matrix = portfolio.return_matrix();
        assert_eq!(matrix.names, vec!["a"]);
        assert_eq!(matrix.width(), 2);
    }

    #[test]
    fn add_normalizes_but_manual_edits_do_not() {
        let mut portfolio = Portfolio::default();
        portfolio.add_strategy(strategy("a", vec![0.01]), 3.0);
        portfolio.add_strategy(strategy("b", vec![0.01]), 1.0);
        let total: f64 = portfolio.allocations().values().sum();
        assert!((total - 1.0).abs() < 1e-12);

        // Manual edits are kept verbatim: several active strategies may sum
        // above 1.
        let mut manual = BTreeMap::new();
        manual.insert("a".to_string(), 0.8);
        manual.insert("b".to_string(), 0.7);
        portfolio.set_allocations(manual);
        let total: f64 = portfolio.allocations().values().sum();
        assert!((total - 1.5).abs() < 1e-12);
    }

    #[test]
    fn stale_allocation_is_ignored() {
        let mut portfolio = Portfolio::default();
        portfolio.add_strategy(strategy("a", vec![0.01, 0.02]), 1.0);
        let mut allocations = BTreeMap::new();
        allocations.insert("a".to_string(), 1.0);
        allocations.insert("removed".to_string(), 0.5);
        portfolio.set_allocations(allocations);

        let returns = portfolio.weighted_returns();
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn zero_weights_yield_empty_series() {
        let mut portfolio = Portfolio::default();
        portfolio.add_strategy(strategy("a", vec![0.01, 0.02]), 0.0);
        assert!(portfolio.weighted_returns().is_empty());
    }

    #[test]
    fn summary_round_trips_through_json() {
        let mut portfolio = Portfolio::new("Desk", dec!(250_000));
        let mut allocations = BTreeMap::new();
        allocations.insert("a".to_string(), 0.6);
        allocations.insert("b".to_string(), 0.4);
        portfolio.set_allocations(allocations);
        let mut metrics = MetricMap::new();
        metrics.insert("sharpe_ratio".to_string(), 1.1);
        portfolio.set_metrics(metrics);

        let json = serde_json::to_string(&portfolio.summary()).unwrap();
        let restored: PortfolioSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, portfolio.summary());

        let mut other = Portfolio::default();
        other.apply_summary(restored);
        assert_eq!(other.name, "Desk");
        assert_eq!(other.allocations().get("a"), Some(&0.6));
    }

    #[test]
    fn concentration_is_sum_of_squares() {
        let mut portfolio = Portfolio::default();
        portfolio.add_strategy(strategy("a", vec![0.01]), 0.5);
        portfolio.add_strategy(strategy("b", vec![0.01]), 0.5);
        assert!((portfolio.concentration() - 0.5).abs() < 1e-12);
    }
}
