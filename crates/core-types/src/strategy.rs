use crate::series::ReturnSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A mapping from metric name to value, as produced by the metrics engine.
pub type MetricMap = BTreeMap<String, f64>;

/// A named strategy: its historical return series plus the metric map derived
/// from it.
///
/// A `Strategy` is immutable after construction. When the underlying data
/// changes (a data source is reloaded), the owner builds a fresh `Strategy`
/// and replaces the `Arc` in its [`StrategySet`]; the swap is atomic from the
/// point of view of any reader holding the map, so the cached metrics are
/// never observed half-updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    name: String,
    returns: ReturnSeries,
    metrics: MetricMap,
}

impl Strategy {
    /// Builds a strategy from its return series and the metrics computed for
    /// that exact series. The caller (normally the metrics engine's `attach`
    /// helper) is responsible for the two being consistent.
    pub fn new(name: impl Into<String>, returns: ReturnSeries, metrics: MetricMap) -> Self {
        Self {
            name: name.into(),
            returns,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn returns(&self) -> &ReturnSeries {
        &self.returns
    }

    pub fn metrics(&self) -> &MetricMap {
        &self.metrics
    }

    /// A single cached metric, if the series was long enough to produce one.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// The shared collection of strategies keyed by unique name.
///
/// `BTreeMap` gives a deterministic (alphabetical) iteration order, which
/// keeps matrix construction and every optimizer method reproducible.
/// `Arc` lets a [`crate::Portfolio`] and the source collection share one
/// strategy without copying its return history.
pub type StrategySet = BTreeMap<String, Arc<Strategy>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_lookup() {
        let mut metrics = MetricMap::new();
        metrics.insert("sharpe_ratio".to_string(), 1.2);
        let strategy = Strategy::new("alpha", ReturnSeries::new(vec![0.01]), metrics);
        assert_eq!(strategy.metric("sharpe_ratio"), Some(1.2));
        assert_eq!(strategy.metric("omega_ratio"), None);
    }
}
