//! # Stress Test Engine
//!
//! Applies fixed historical-crisis shocks to a baseline metric vector and
//! reports how a user's allocation formula responds: allocation change,
//! loss estimates, a compounding ruin probability over the scenario's
//! duration, an estimated recovery time, and a qualitative risk label.
//!
//! The scenario table is read-only configuration (see [`scenario`]); the
//! engine itself never fails: an unevaluable formula takes the conservative
//! fallback allocation and the run continues.

use core_types::MetricMap;
use formula::{ClampPolicy, allocation_percent};

pub mod results;
pub mod scenario;

pub use results::{ImpactAnalysis, RiskScore, StressResult};
pub use scenario::{SCENARIOS, StressScenario};

/// Allocation used when the formula cannot be evaluated.
const FALLBACK_ALLOCATION_PCT: f64 = 5.0;

/// The stress test engine.
#[derive(Debug, Default)]
pub struct StressTestEngine {}

impl StressTestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stresses `formula` under one named scenario, or under every scenario
    /// in the table when `scenario_name` is `None`. An unknown name simply
    /// selects nothing.
    ///
    /// `base_metrics` is the nine-key formula baseline from real strategy
    /// data; without it a documented set of ordinary-market defaults is used.
    pub fn run(
        &self,
        formula: &str,
        scenario_name: Option<&str>,
        base_metrics: Option<&MetricMap>,
    ) -> Vec<StressResult> {
        let baseline_metrics = baseline(base_metrics);
        let baseline_allocation = evaluate_allocation(formula, &baseline_metrics);

        SCENARIOS
            .iter()
            .filter(|s| scenario_name.is_none_or(|name| s.name == name))
            .map(|s| {
                let stressed_metrics = apply_stress(&baseline_metrics, s);
                let stressed_allocation = evaluate_allocation(formula, &stressed_metrics);
                analyze_impact(
                    s,
                    formula,
                    baseline_allocation,
                    stressed_allocation,
                    &baseline_metrics,
                    &stressed_metrics,
                )
            })
            .collect()
    }
}

/// Severity of a scenario in [0, 1]: the mean of five normalized shock
/// magnitudes, capped at 1.
pub fn scenario_severity(scenario: &StressScenario) -> f64 {
    let factors = [
        scenario.sharpe_impact.abs() / 5.0,
        scenario.omega_impact.abs() / 1.2,
        (scenario.volatility_multiplier - 1.0) / 9.0,
        (scenario.drawdown_multiplier - 1.0) / 7.0,
        scenario.win_rate_impact.abs() / 0.7,
    ];
    (factors.iter().sum::<f64>() / factors.len() as f64).min(1.0)
}

fn baseline(base_metrics: Option<&MetricMap>) -> MetricMap {
    if let Some(metrics) = base_metrics {
        return metrics.clone();
    }
    // Ordinary-market defaults when no strategy data is loaded.
    [
        ("sharpe", 0.4),
        ("omega", 1.05),
        ("volatility", 0.18),
        ("drawdown", 0.12),
        ("win_rate", 0.52),
        ("profit_factor", 1.15),
        ("total_return", 0.08),
        ("calmar", 0.6),
        ("sortino", 0.5),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Applies a scenario's shocks to the baseline vector, clamping each metric
/// to its sensible domain.
fn apply_stress(baseline: &MetricMap, scenario: &StressScenario) -> MetricMap {
    let get = |key: &str| baseline.get(key).copied().unwrap_or(0.0);
    let mut stressed = baseline.clone();

    stressed.insert(
        "sharpe".into(),
        (get("sharpe") + scenario.sharpe_impact).max(-3.0),
    );
    stressed.insert(
        "omega".into(),
        (get("omega") + scenario.omega_impact).max(0.1),
    );
    stressed.insert(
        "volatility".into(),
        get("volatility") * scenario.volatility_multiplier,
    );
    stressed.insert(
        "drawdown".into(),
        (get("drawdown") * scenario.drawdown_multiplier).min(0.95),
    );
    stressed.insert(
        "win_rate".into(),
        (get("win_rate") + scenario.win_rate_impact).max(0.05),
    );

    // Derived metrics move consistently with the primary shocks.
    stressed.insert(
        "profit_factor".into(),
        (get("profit_factor") * (1.0 + scenario.omega_impact)).max(0.2),
    );
    stressed.insert(
        "total_return".into(),
        get("total_return") * (1.0 + scenario.sharpe_impact * 0.3),
    );
    stressed.insert(
        "calmar".into(),
        (get("calmar") * (1.0 + scenario.sharpe_impact * 0.2)).max(0.1),
    );
    stressed.insert(
        "sortino".into(),
        (get("sortino") + scenario.sharpe_impact * 0.8).max(0.1),
    );

    stressed
}

fn evaluate_allocation(formula: &str, metrics: &MetricMap) -> f64 {
    allocation_percent(
        formula,
        metrics,
        ClampPolicy::Standard,
        FALLBACK_ALLOCATION_PCT,
    )
}

fn analyze_impact(
    scenario: &StressScenario,
    formula: &str,
    baseline_allocation: f64,
    stressed_allocation: f64,
    baseline_metrics: &MetricMap,
    stressed_metrics: &MetricMap,
) -> StressResult {
    let allocation_change_pct =
        (stressed_allocation - baseline_allocation) / baseline_allocation.max(0.01) * 100.0;

    let severity = scenario_severity(scenario);
    let allocation_ratio = stressed_allocation / 100.0;

    let expected_loss = allocation_ratio * severity * 0.3;
    let worst_case_loss = allocation_ratio * severity * 0.8;

    // Ruin compounds monthly over the scenario's duration.
    let monthly_ruin_probability = allocation_ratio.powi(2) * 0.02;
    let ruin_probability = (1.0
        - (1.0 - monthly_ruin_probability).powi(scenario.duration_months as i32))
    .min(0.95);

    let recovery_months =
        (scenario.duration_months as f64 * (1.0 + allocation_ratio * 2.0)) as u32;

    let get = |metrics: &MetricMap, key: &str| metrics.get(key).copied().unwrap_or(0.0);
    let baseline_vol = get(baseline_metrics, "volatility");
    let baseline_dd = get(baseline_metrics, "drawdown");
    let impact = ImpactAnalysis {
        sharpe_degradation: get(stressed_metrics, "sharpe") - get(baseline_metrics, "sharpe"),
        volatility_increase_pct: if baseline_vol == 0.0 {
            0.0
        } else {
            (get(stressed_metrics, "volatility") / baseline_vol - 1.0) * 100.0
        },
        drawdown_increase_pct: if baseline_dd == 0.0 {
            0.0
        } else {
            (get(stressed_metrics, "drawdown") / baseline_dd - 1.0) * 100.0
        },
        win_rate_drop_pct: (get(stressed_metrics, "win_rate")
            - get(baseline_metrics, "win_rate"))
            * 100.0,
    };

    StressResult {
        scenario_name: scenario.name.to_string(),
        formula: formula.to_string(),
        baseline_allocation,
        stressed_allocation,
        allocation_change_pct,
        expected_loss_pct: expected_loss * 100.0,
        worst_case_loss_pct: worst_case_loss * 100.0,
        ruin_probability_pct: ruin_probability * 100.0,
        recovery_months,
        risk_score: RiskScore::classify(
            stressed_allocation,
            ruin_probability * 100.0,
            worst_case_loss * 100.0,
        ),
        impact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_all_scenarios_by_default() {
        let results = StressTestEngine::new().run("sharpe * 10", None, None);
        assert_eq!(results.len(), SCENARIOS.len());
    }

    #[test]
    fn selects_a_single_scenario_by_name() {
        let results = StressTestEngine::new().run("sharpe * 10", Some("COVID-19 2020"), None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].scenario_name, "COVID-19 2020");
    }

    #[test]
    fn unknown_scenario_selects_nothing() {
        let results = StressTestEngine::new().run("sharpe * 10", Some("Y2K"), None);
        assert!(results.is_empty());
    }

    #[test]
    fn severity_is_monotone_in_shock_magnitudes() {
        // A scenario with strictly larger volatility and drawdown multipliers
        // (and no smaller other shocks) must not score a lower severity.
        let mild = StressScenario {
            name: "mild",
            description: "",
            period: "",
            sharpe_impact: -1.0,
            omega_impact: -0.2,
            volatility_multiplier: 1.5,
            drawdown_multiplier: 1.5,
            win_rate_impact: -0.1,
            duration_months: 6,
        };
        let harsh = StressScenario {
            volatility_multiplier: 4.0,
            drawdown_multiplier: 5.0,
            name: "harsh",
            ..mild
        };
        assert!(scenario_severity(&harsh) >= scenario_severity(&mild));

        // Also holds for the two table entries ordered this way.
        let fed = SCENARIOS.iter().find(|s| s.name == "Fed Tightening 2022").unwrap();
        let extreme = SCENARIOS.iter().find(|s| s.name == "Synthetic Extreme").unwrap();
        assert!(scenario_severity(extreme) >= scenario_severity(fed));
    }

    #[test]
    fn stressed_metrics_respect_domain_clamps() {
        let baseline = baseline(None);
        let extreme = SCENARIOS.iter().find(|s| s.name == "Synthetic Extreme").unwrap();
        let stressed = apply_stress(&baseline, extreme);
        assert!(stressed["drawdown"] <= 0.95);
        assert!(stressed["omega"] >= 0.1);
        assert!(stressed["win_rate"] >= 0.05);
        assert!(stressed["sharpe"] >= -3.0);
    }

    #[test]
    fn unevaluable_formula_takes_the_fallback() {
        let results = StressTestEngine::new().run("sharpe / (omega - omega)", None, None);
        for result in results {
            assert_eq!(result.baseline_allocation, FALLBACK_ALLOCATION_PCT);
        }
    }

    #[test]
    fn ruin_probability_compounds_with_duration() {
        let results = StressTestEngine::new().run("50", None, None);
        let short = results
            .iter()
            .find(|r| r.scenario_name == "Flash Crash 2010")
            .unwrap();
        let long = results
            .iter()
            .find(|r| r.scenario_name == "Synthetic Extreme")
            .unwrap();
        // Same stressed allocation, longer exposure: more chance of ruin.
        assert!(long.ruin_probability_pct > short.ruin_probability_pct);
        assert!(long.ruin_probability_pct <= 95.0);
    }
}
