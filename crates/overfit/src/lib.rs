//! # Overfitting Detector
//!
//! Estimates how much an allocation formula is curve-fit to the historical
//! data it was tuned on. Five diagnostics (time stability, forward
//! cross-validation, perturbation robustness, performance correlation, and
//! extreme-allocation screening) are combined with fixed weights into a
//! 0-100 overfitting score (higher = more overfit).
//!
//! Per-period metrics come from the real metrics engine, so a formula is
//! judged against exactly the numbers it would see in production. Formula
//! evaluation uses the conservative clamp (allocations capped at 50%) and a
//! fallback of 10, so one unevaluable period degrades a score instead of
//! aborting the analysis.

use analytics::{MetricsEngine, formula_baseline, stats};
use core_types::{MetricMap, ReturnSeries};
use formula::{ClampPolicy, Formula};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::collections::BTreeMap;
use tracing::warn;

pub mod report;

pub use report::{ComponentScores, OverfittingAnalysis, OverfittingReport, RiskLevel};

/// Historical record for one strategy: its return series and cached metrics.
#[derive(Debug, Clone)]
pub struct StrategyHistory {
    pub returns: ReturnSeries,
    pub metrics: MetricMap,
}

/// Input collection keyed by strategy name.
pub type StrategyData = BTreeMap<String, StrategyHistory>;

const FALLBACK_ALLOCATION_PCT: f64 = 10.0;
const STABILITY_PERIODS: usize = 3;
/// At least ~10 observations per stability period.
const MIN_STABILITY_OBSERVATIONS: usize = STABILITY_PERIODS * 10;
const CV_SPLITS: usize = 3;
/// At least ~20 observations per cross-validation fold.
const MIN_CV_OBSERVATIONS: usize = (CV_SPLITS + 1) * 15;
const NOISE_LEVELS: [f64; 3] = [0.05, 0.10, 0.20];
const NOISE_DRAWS: usize = 10;

/// Component weights: stability 25, cross-validation 25, robustness 20,
/// correlation 20, extreme allocations 10.
const WEIGHTS: [f64; 5] = [0.25, 0.25, 0.20, 0.20, 0.10];

/// The overfitting detector.
#[derive(Debug, Default)]
pub struct OverfittingDetector {
    engine: MetricsEngine,
}

impl OverfittingDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzes `formula` against per-strategy history and the allocations
    /// it currently produces.
    pub fn analyze(
        &self,
        data: &StrategyData,
        formula: &str,
        current_allocations: &BTreeMap<String, f64>,
    ) -> OverfittingAnalysis {
        if data.len() < 2 {
            warn!("overfitting analysis needs at least two strategies");
            return OverfittingAnalysis::InsufficientData {
                reason: "at least two strategies are required for a robust analysis".to_string(),
            };
        }

        let parsed = Formula::parse(formula).ok();

        let Some(stability) = self.time_stability(data, &parsed) else {
            warn!("no strategy is long enough for the stability split");
            return OverfittingAnalysis::InsufficientData {
                reason: format!(
                    "no strategy has the {MIN_STABILITY_OBSERVATIONS} observations needed \
                     for per-period evaluation"
                ),
            };
        };

        let mut warnings = Vec::new();
        let cross_validation = match self.cross_validation(data, &parsed) {
            Some(score) => score,
            None => {
                warnings.push(
                    "not enough observations for forward cross-validation".to_string(),
                );
                0.0
            }
        };
        let robustness = self.robustness(data, &parsed);
        let (correlation_score, correlation) = self.correlation(data, current_allocations);
        let extreme = extreme_allocation_score(current_allocations);

        let components = ComponentScores {
            stability,
            cross_validation,
            robustness,
            correlation: correlation_score,
            extreme_allocations: extreme,
        };
        let healthy = stability * WEIGHTS[0]
            + cross_validation * WEIGHTS[1]
            + robustness * WEIGHTS[2]
            + correlation_score * WEIGHTS[3]
            + extreme * WEIGHTS[4];
        let overfitting_score = (100.0 - healthy).clamp(0.0, 100.0);

        if overfitting_score > 70.0 {
            warnings.push("high overfitting risk".to_string());
        }
        if components.stability < 30.0 {
            warnings.push("formula is unstable across time periods".to_string());
        }
        if components.cross_validation < 30.0 {
            warnings.push("poor generalization to unseen data".to_string());
        }
        if components.robustness < 30.0 {
            warnings.push("formula is fragile under metric perturbations".to_string());
        }
        if correlation.abs() > 0.8 {
            warnings.push("allocations excessively track past performance".to_string());
        }

        OverfittingAnalysis::Report(OverfittingReport {
            overfitting_score,
            risk_level: RiskLevel::from_score(overfitting_score),
            components,
            correlation,
            formula_complexity: parsed.as_ref().map_or(0, Formula::complexity),
            warnings,
        })
    }

    /// Splits each qualifying series into contiguous periods and scores how
    /// consistent the formula's allocation is across them. `None` when no
    /// strategy qualifies.
    fn time_stability(&self, data: &StrategyData, parsed: &Option<Formula>) -> Option<f64> {
        let mut scores = Vec::new();
        for history in data.values() {
            let returns = history.returns.as_slice();
            if returns.len() < MIN_STABILITY_OBSERVATIONS {
                continue;
            }

            let period_size = returns.len() / STABILITY_PERIODS;
            let allocations: Vec<f64> = (0..STABILITY_PERIODS)
                .map(|i| {
                    let start = i * period_size;
                    let end = if i == STABILITY_PERIODS - 1 {
                        returns.len()
                    } else {
                        start + period_size
                    };
                    self.period_allocation(&returns[start..end], parsed)
                })
                .collect();

            let cv = stats::std_dev(&allocations) / (stats::mean(&allocations) + 1e-6);
            scores.push((100.0 - cv * 100.0).max(0.0));
        }

        if scores.is_empty() {
            None
        } else {
            Some(stats::mean(&scores))
        }
    }

    /// Forward time-series splits: train on everything before the test
    /// block, penalize the train/test allocation gap.
    fn cross_validation(&self, data: &StrategyData, parsed: &Option<Formula>) -> Option<f64> {
        let mut scores = Vec::new();
        for history in data.values() {
            let returns = history.returns.as_slice();
            if returns.len() < MIN_CV_OBSERVATIONS {
                continue;
            }

            let fold = returns.len() / (CV_SPLITS + 1);
            let split_scores: Vec<f64> = (1..=CV_SPLITS)
                .map(|i| {
                    let train_end = i * fold;
                    let test_end = if i == CV_SPLITS {
                        returns.len()
                    } else {
                        (i + 1) * fold
                    };
                    let train = self.period_allocation(&returns[..train_end], parsed);
                    let test = self.period_allocation(&returns[train_end..test_end], parsed);
                    (100.0 - (train - test).abs() * 2.0).max(0.0)
                })
                .collect();
            scores.push(stats::mean(&split_scores));
        }

        if scores.is_empty() {
            None
        } else {
            Some(stats::mean(&scores))
        }
    }

    /// Injects relative Gaussian noise into each metric and scores how much
    /// the allocation wanders.
    fn robustness(&self, data: &StrategyData, parsed: &Option<Formula>) -> f64 {
        let mut rng = rand::rng();
        let mut scores = Vec::new();

        for history in data.values() {
            if history.returns.is_empty() {
                continue;
            }
            let baseline = formula_baseline(&self.engine.compute(&history.returns));

            let per_level: Vec<f64> = NOISE_LEVELS
                .iter()
                .map(|level| {
                    let noisy_allocations: Vec<f64> = (0..NOISE_DRAWS)
                        .map(|_| {
                            let noisy = perturb(&baseline, *level, &mut rng);
                            evaluate(parsed, &noisy)
                        })
                        .collect();
                    (100.0 - stats::variance(&noisy_allocations)).max(0.0)
                })
                .collect();
            scores.push(stats::mean(&per_level));
        }

        if scores.is_empty() { 0.0 } else { stats::mean(&scores) }
    }

    /// Pearson correlation between current allocations and total historical
    /// return. Strong tracking of past performance is evidence of
    /// curve-fitting; a constant formula has zero variance and scores clean.
    fn correlation(
        &self,
        data: &StrategyData,
        current_allocations: &BTreeMap<String, f64>,
    ) -> (f64, f64) {
        let mut allocations = Vec::new();
        let mut performances = Vec::new();
        for (name, history) in data {
            if let Some(allocation) = current_allocations.get(name) {
                allocations.push(*allocation);
                performances.push(history.returns.iter().sum::<f64>() * 100.0);
            }
        }

        if allocations.len() < 2 {
            return (50.0, 0.0);
        }

        let correlation = stats::pearson(&allocations, &performances);
        ((100.0 - correlation.abs() * 100.0).max(0.0), correlation)
    }

    fn period_allocation(&self, returns: &[f64], parsed: &Option<Formula>) -> f64 {
        let metrics = formula_baseline(&self.engine.compute(&ReturnSeries::new(returns.to_vec())));
        evaluate(parsed, &metrics)
    }
}

/// A cheap screen over the allocation map alone, without re-running the
/// diagnostics. Returns human-readable findings; empty means nothing stands
/// out.
pub fn quick_check(allocations: &BTreeMap<String, f64>) -> Vec<String> {
    let mut findings = Vec::new();
    if allocations.is_empty() {
        return findings;
    }
    let values: Vec<f64> = allocations.values().copied().collect();

    let extreme_count = values.iter().filter(|v| **v > 40.0 || **v < 0.0).count();
    if extreme_count > 0 {
        findings.push(format!("{extreme_count} extreme allocation(s)"));
    }

    let max_allocation = values.iter().fold(f64::MIN, |a, b| a.max(*b));
    if max_allocation > 50.0 {
        findings.push(format!("largest allocation is {max_allocation:.1}%"));
    }

    if values.len() > 1 {
        let spread = stats::std_dev(&values);
        if spread > 20.0 {
            findings.push(format!("allocation spread is {spread:.1} points"));
        }
    }

    findings
}

fn evaluate(parsed: &Option<Formula>, metrics: &MetricMap) -> f64 {
    match parsed {
        Some(formula) => formula.allocation_percent(
            metrics,
            ClampPolicy::Conservative,
            FALLBACK_ALLOCATION_PCT,
        ),
        None => FALLBACK_ALLOCATION_PCT,
    }
}

/// Fraction of allocations outside `[0, 50]`, penalized 150 points per unit.
fn extreme_allocation_score(allocations: &BTreeMap<String, f64>) -> f64 {
    if allocations.is_empty() {
        return 50.0;
    }
    let extreme = allocations
        .values()
        .filter(|v| **v > 50.0 || **v < 0.0)
        .count() as f64;
    (100.0 - extreme / allocations.len() as f64 * 150.0).max(0.0)
}

fn perturb<R: Rng + ?Sized>(metrics: &MetricMap, level: f64, rng: &mut R) -> MetricMap {
    metrics
        .iter()
        .map(|(name, value)| {
            let z: f64 = StandardNormal.sample(rng);
            (name.clone(), value + value.abs() * level * z)
        })
        .collect()
}
