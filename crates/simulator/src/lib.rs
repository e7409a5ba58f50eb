//! # Monte Carlo Risk Simulator
//!
//! Estimates the forward-looking risk profile of an allocation formula by
//! sampling synthetic metric vectors, evaluating the formula on each,
//! simulating a daily return path per trial, and reducing the terminal
//! outcomes to a risk summary.
//!
//! ## Randomness contract
//!
//! Trials draw from an unseeded, thread-local entropy source by design:
//! repeated runs are *not* bit-reproducible, only statistically convergent
//! as the trial count grows. Trials share no mutable state, so they run in
//! parallel without changing the observable distribution.

use analytics::stats;
use core_types::MetricMap;
use formula::{ClampPolicy, Formula};
use rand::Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub mod error;
pub mod results;
pub mod sampler;

pub use error::SimulationError;
pub use results::{DistributionStats, MonteCarloResults};
pub use sampler::MetricSampler;

/// Allocation used for a trial whose formula evaluation fails.
const FALLBACK_ALLOCATION_PCT: f64 = 5.0;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Daily drift and volatility at 100% allocation.
const FULL_ALLOCATION_DAILY_RETURN: f64 = 0.0008;
const FULL_ALLOCATION_DAILY_VOL: f64 = 0.025;

/// The Monte Carlo engine.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    risk_free_rate: f64,
}

impl MonteCarloEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a full simulation.
    ///
    /// * `formula` - the allocation formula; a formula that fails to parse
    ///   does not abort the run, every trial just takes the fallback
    ///   allocation.
    /// * `base_metrics` - optional per-strategy baseline in the nine-key
    ///   formula vocabulary; when present, trial metrics are sampled around
    ///   it instead of from the generic distributions.
    ///
    /// Fails fast only on structural misuse (zero trials, zero horizon,
    /// confidence outside (0, 1)).
    pub fn run_simulation(
        &self,
        formula: &str,
        n_trials: usize,
        horizon_days: usize,
        confidence: f64,
        base_metrics: Option<&MetricMap>,
    ) -> Result<MonteCarloResults, SimulationError> {
        if n_trials == 0 {
            return Err(SimulationError::NoTrials);
        }
        if horizon_days == 0 {
            return Err(SimulationError::EmptyHorizon);
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(SimulationError::InvalidConfidence(confidence));
        }

        let parsed = match Formula::parse(formula) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                warn!(%error, "formula rejected, all trials take the fallback allocation");
                None
            }
        };
        let sampler = MetricSampler::from_baseline(base_metrics);
        debug!(n_trials, horizon_days, "starting Monte Carlo run");

        let trials: Vec<(f64, f64)> = (0..n_trials)
            .into_par_iter()
            .map(|_| {
                let mut rng = rand::rng();
                let metrics = sampler.draw(&mut rng);
                let allocation = match &parsed {
                    Some(formula) => formula.allocation_percent(
                        &metrics,
                        ClampPolicy::Standard,
                        FALLBACK_ALLOCATION_PCT,
                    ),
                    None => FALLBACK_ALLOCATION_PCT,
                };
                let outcome = simulate_path(allocation, horizon_days, &mut rng);
                (allocation, outcome)
            })
            .collect();

        let allocations: Vec<f64> = trials.iter().map(|(a, _)| *a).collect();
        let outcomes: Vec<f64> = trials.iter().map(|(_, r)| *r).collect();
        Ok(self.reduce(&outcomes, &allocations, confidence))
    }

    fn reduce(&self, outcomes: &[f64], allocations: &[f64], confidence: f64) -> MonteCarloResults {
        let n = outcomes.len() as f64;
        let mean = stats::mean(outcomes);
        let std = stats::std_dev(outcomes);

        let excess: Vec<f64> = outcomes.iter().map(|r| r - self.risk_free_rate).collect();
        let sharpe = stats::mean(&excess) / (std + 1e-10);

        let var_level = (1.0 - confidence) * 100.0;
        let var = stats::percentile(outcomes, var_level);
        let tail: Vec<f64> = outcomes.iter().copied().filter(|r| *r <= var).collect();
        let cvar = stats::mean(&tail);

        // Drawdown over the equity path formed by compounding trial outcomes
        // in order; clipped at a 99% loss.
        let mut equity = 1.0;
        let mut peak = f64::MIN;
        let mut max_drawdown = 0.0_f64;
        for r in outcomes {
            equity *= 1.0 + r;
            peak = peak.max(equity);
            let drawdown = ((equity - peak) / peak).clamp(-0.99, 0.0);
            max_drawdown = max_drawdown.min(drawdown);
        }

        let percentiles: BTreeMap<u8, f64> = [5u8, 10, 25, 50, 75, 90, 95]
            .into_iter()
            .map(|p| (p, stats::percentile(outcomes, p as f64) * 100.0))
            .collect();

        MonteCarloResults {
            expected_return: mean * 100.0,
            volatility: std * 100.0,
            sharpe_ratio: sharpe,
            value_at_risk: var * 100.0,
            conditional_var: cvar * 100.0,
            max_drawdown: max_drawdown * 100.0,
            best_case: stats::percentile(outcomes, 95.0) * 100.0,
            worst_case: stats::percentile(outcomes, 5.0) * 100.0,
            probability_profit: outcomes.iter().filter(|r| **r > 0.0).count() as f64 / n * 100.0,
            probability_loss_50: outcomes.iter().filter(|r| **r < -0.5).count() as f64 / n * 100.0,
            probability_ruin: outcomes.iter().filter(|r| **r < -0.9).count() as f64 / n * 100.0,
            percentiles,
            distribution: DistributionStats {
                mean: mean * 100.0,
                median: stats::percentile(outcomes, 50.0) * 100.0,
                std_dev: std * 100.0,
                skewness: stats::skewness(outcomes),
                kurtosis: stats::excess_kurtosis(outcomes),
            },
            mean_allocation_pct: stats::mean(allocations),
            total_trials: outcomes.len(),
        }
    }
}

impl Default for MonteCarloEngine {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.005,
        }
    }
}

/// Simulates one forward path and returns the terminal cumulative return.
///
/// Expected daily return and volatility scale linearly with the allocation.
/// Allocations above 50% open a ruin gate whose probability grows with the
/// excess; a triggered ruin forces a large negative terminal return and
/// skips the path entirely. Otherwise the path is `horizon` independent
/// normal daily returns plus a Poisson count of tail-event shocks, skewed
/// negative and more so as the allocation rises. The compounded return is
/// floored at -100%.
fn simulate_path<R: Rng + ?Sized>(allocation_pct: f64, horizon: usize, rng: &mut R) -> f64 {
    let allocation = allocation_pct / 100.0;
    let daily_mean = allocation * FULL_ALLOCATION_DAILY_RETURN;
    let daily_vol = allocation * FULL_ALLOCATION_DAILY_VOL;

    if allocation > 0.5 {
        let daily_ruin_probability = (allocation - 0.5) * 0.02;
        if rng.random::<f64>() < daily_ruin_probability * horizon as f64 {
            return -allocation * rng.random_range(0.7..1.0);
        }
    }

    let mut daily_returns: Vec<f64> = (0..horizon)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            daily_mean + daily_vol * z
        })
        .collect();

    let tail_event_rate = 0.1 * horizon as f64 / TRADING_DAYS_PER_YEAR;
    if tail_event_rate > 0.0 {
        let n_tail_events = Poisson::new(tail_event_rate)
            .map(|poisson| poisson.sample(rng) as usize)
            .unwrap_or(0);
        for _ in 0..n_tail_events {
            let day = rng.random_range(0..horizon);
            if rng.random::<f64>() < 0.7 + allocation * 0.2 {
                daily_returns[day] -= allocation * rng.random_range(0.05..0.15);
            } else {
                daily_returns[day] += allocation * rng.random_range(0.03..0.08);
            }
        }
    }

    let cumulative = daily_returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
    cumulative.max(-1.0)
}
