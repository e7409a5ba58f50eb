use serde::Serialize;
use std::collections::BTreeMap;

/// The reduced output of a Monte Carlo run. Return-scale figures are
/// percentages.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloResults {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub value_at_risk: f64,
    pub conditional_var: f64,
    pub max_drawdown: f64,
    pub best_case: f64,
    pub worst_case: f64,
    /// Probability (in percent) of a positive terminal return.
    pub probability_profit: f64,
    /// Probability (in percent) of losing more than half the allocation.
    pub probability_loss_50: f64,
    /// Probability (in percent) of losing more than 90%, the ruin event.
    pub probability_ruin: f64,
    /// Terminal-return percentiles at 5/10/25/50/75/90/95.
    pub percentiles: BTreeMap<u8, f64>,
    pub distribution: DistributionStats,
    /// Mean of the per-trial allocation percentages the formula produced.
    pub mean_allocation_pct: f64,
    pub total_trials: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}
