use core_types::MetricMap;
use rand::Rng;
use rand_distr::{Beta, Distribution, Gamma, LogNormal, Normal, StandardNormal};

/// Per-trial metric sampling.
///
/// Two interchangeable modes: anchored on a real per-strategy baseline, or
/// fully generic when no baseline exists. Both produce the same nine-key
/// vocabulary map, so nothing downstream changes when the mode does.
pub enum MetricSampler {
    /// Normal draws centered on the supplied baseline values, with fixed
    /// per-metric spreads and domain clips.
    Anchored(MetricMap),
    /// Documented generic distributions for each metric.
    Generic(GenericDistributions),
}

impl MetricSampler {
    pub fn from_baseline(base_metrics: Option<&MetricMap>) -> Self {
        match base_metrics {
            Some(metrics) => MetricSampler::Anchored(metrics.clone()),
            None => MetricSampler::Generic(GenericDistributions::new()),
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> MetricMap {
        match self {
            MetricSampler::Anchored(baseline) => draw_anchored(baseline, rng),
            MetricSampler::Generic(dists) => dists.draw(rng),
        }
    }
}

fn draw_anchored<R: Rng + ?Sized>(baseline: &MetricMap, rng: &mut R) -> MetricMap {
    let base = |key: &str, default: f64| baseline.get(key).copied().unwrap_or(default);
    let normal = |rng: &mut R, mean: f64, spread: f64| {
        let z: f64 = StandardNormal.sample(rng);
        mean + spread * z
    };

    let mut metrics = MetricMap::new();
    metrics.insert("sharpe".into(), normal(rng, base("sharpe", 0.5), 0.3));
    metrics.insert(
        "omega".into(),
        normal(rng, base("omega", 1.1), 0.2).max(0.1),
    );
    metrics.insert(
        "volatility".into(),
        normal(rng, base("volatility", 0.15), 0.05).max(0.01),
    );
    metrics.insert(
        "drawdown".into(),
        normal(rng, base("drawdown", 0.08), 0.03).clamp(0.001, 0.95),
    );
    metrics.insert(
        "win_rate".into(),
        normal(rng, base("win_rate", 0.58), 0.1).clamp(0.1, 0.9),
    );
    metrics.insert(
        "profit_factor".into(),
        normal(rng, base("profit_factor", 1.4), 0.3).max(0.1),
    );
    metrics.insert(
        "total_return".into(),
        normal(rng, base("total_return", 0.12), 0.1),
    );
    metrics.insert("calmar".into(), normal(rng, base("calmar", 0.8), 0.3));
    metrics.insert("sortino".into(), normal(rng, base("sortino", 0.7), 0.3));
    metrics
}

/// The generic distribution set, constructed once per simulation run.
pub struct GenericDistributions {
    sharpe: Normal<f64>,
    omega: LogNormal<f64>,
    volatility: Gamma<f64>,
    drawdown: Beta<f64>,
    win_rate: Beta<f64>,
    profit_factor: LogNormal<f64>,
    total_return: Normal<f64>,
    calmar: Normal<f64>,
    sortino: Normal<f64>,
}

impl GenericDistributions {
    pub fn new() -> Self {
        // All parameters are fixed positive constants; construction cannot
        // fail for them.
        Self {
            sharpe: Normal::new(0.5, 0.8).expect("valid normal parameters"),
            omega: LogNormal::new(0.1, 0.5).expect("valid log-normal parameters"),
            volatility: Gamma::new(2.0, 0.075).expect("valid gamma parameters"),
            drawdown: Beta::new(2.0, 8.0).expect("valid beta parameters"),
            win_rate: Beta::new(5.5, 4.5).expect("valid beta parameters"),
            profit_factor: LogNormal::new(0.25, 0.4).expect("valid log-normal parameters"),
            total_return: Normal::new(0.12, 0.25).expect("valid normal parameters"),
            calmar: Normal::new(0.8, 0.6).expect("valid normal parameters"),
            sortino: Normal::new(0.7, 0.9).expect("valid normal parameters"),
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> MetricMap {
        let mut metrics = MetricMap::new();
        metrics.insert("sharpe".into(), self.sharpe.sample(rng));
        metrics.insert("omega".into(), self.omega.sample(rng));
        metrics.insert("volatility".into(), self.volatility.sample(rng));
        // Rescaled to a realistic drawdown range, floored away from zero so
        // `x / drawdown` formulas stay evaluable.
        metrics.insert("drawdown".into(), self.drawdown.sample(rng) * 0.5 + 0.01);
        metrics.insert("win_rate".into(), self.win_rate.sample(rng));
        metrics.insert("profit_factor".into(), self.profit_factor.sample(rng));
        metrics.insert("total_return".into(), self.total_return.sample(rng));
        metrics.insert("calmar".into(), self.calmar.sample(rng));
        metrics.insert("sortino".into(), self.sortino.sample(rng));
        metrics
    }
}

impl Default for GenericDistributions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored_draws_respect_domain_clips() {
        let mut baseline = MetricMap::new();
        baseline.insert("omega".into(), 0.1);
        baseline.insert("drawdown".into(), 0.9);
        baseline.insert("win_rate".into(), 0.05);
        let sampler = MetricSampler::Anchored(baseline);

        let mut rng = rand::rng();
        for _ in 0..200 {
            let draw = sampler.draw(&mut rng);
            assert!(draw["omega"] >= 0.1);
            assert!((0.001..=0.95).contains(&draw["drawdown"]));
            assert!((0.1..=0.9).contains(&draw["win_rate"]));
            assert!(draw["volatility"] >= 0.01);
            assert!(draw["profit_factor"] >= 0.1);
        }
    }

    #[test]
    fn generic_draws_cover_all_nine_metrics() {
        let sampler = MetricSampler::from_baseline(None);
        let mut rng = rand::rng();
        let draw = sampler.draw(&mut rng);
        assert_eq!(draw.len(), 9);
        assert!(draw["volatility"] > 0.0);
        assert!(draw["omega"] > 0.0);
        assert!((0.0..=1.0).contains(&draw["win_rate"]));
    }
}
