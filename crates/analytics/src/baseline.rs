use core_types::MetricMap;

/// The closed vocabulary of the allocation-formula surface, paired with the
/// engine metric each name reads from.
///
/// Every formula call site (optimizer preview, Monte Carlo, stress testing,
/// overfitting diagnostics) builds its baseline through this table, which is
/// what keeps the Omega threshold convention and the drawdown sign identical
/// across components.
pub const FORMULA_METRICS: [(&str, &str); 9] = [
    ("sharpe", "sharpe_ratio"),
    ("omega", "omega_ratio"),
    ("volatility", "volatility"),
    ("drawdown", "max_drawdown"),
    ("win_rate", "win_rate"),
    ("profit_factor", "profit_factor"),
    ("total_return", "total_return"),
    ("calmar", "calmar_ratio"),
    ("sortino", "sortino_ratio"),
];

/// Projects a full engine metric map onto the nine-key formula vocabulary.
///
/// Missing source metrics are simply absent from the output; the evaluator
/// reports an unknown-identifier failure for them and the call site's
/// fallback applies.
pub fn formula_baseline(metrics: &MetricMap) -> MetricMap {
    let mut baseline = MetricMap::new();
    for (short, full) in FORMULA_METRICS {
        if let Some(value) = metrics.get(full) {
            baseline.insert(short.to_string(), *value);
        }
    }
    baseline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricsEngine;
    use core_types::ReturnSeries;

    #[test]
    fn baseline_projects_all_nine_keys() {
        let engine = MetricsEngine::new();
        let metrics = engine.compute(&ReturnSeries::new(vec![0.01, -0.02, 0.03]));
        let baseline = formula_baseline(&metrics);
        assert_eq!(baseline.len(), 9);
        assert_eq!(baseline["sharpe"], metrics["sharpe_ratio"]);
        assert_eq!(baseline["drawdown"], metrics["max_drawdown"]);
    }

    #[test]
    fn empty_metrics_project_to_empty_baseline() {
        assert!(formula_baseline(&MetricMap::new()).is_empty());
    }
}
