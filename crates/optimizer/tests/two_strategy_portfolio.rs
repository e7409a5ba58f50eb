use analytics::MetricsEngine;
use core_types::{ReturnSeries, StrategySet};
use optimizer::{AllocationOptimizer, Method};

/// End-to-end: two strategies through the metrics engine and the optimizer.
#[test]
fn equal_weight_on_two_strategies_splits_in_half() {
    let engine = MetricsEngine::new();
    let mut strategies = StrategySet::new();
    strategies.insert(
        "A".to_string(),
        engine.attach("A", ReturnSeries::new(vec![0.01, -0.02, 0.03, -0.01, 0.02])),
    );
    strategies.insert(
        "B".to_string(),
        engine.attach("B", ReturnSeries::new(vec![0.00, 0.01, -0.01, 0.02, 0.00])),
    );

    let weights = AllocationOptimizer::new().optimize(&strategies, Method::EqualWeight);
    assert!((weights["A"] - 0.5).abs() < 1e-12);
    assert!((weights["B"] - 0.5).abs() < 1e-12);
    let total: f64 = weights.values().sum();
    assert!((total - 1.0).abs() < 1e-12);

    // Series A has a positive mean return, so its Sharpe ratio at a zero
    // risk-free rate is strictly positive.
    let sharpe = strategies["A"].metric("sharpe_ratio").unwrap();
    assert!(sharpe > 0.0);
}
