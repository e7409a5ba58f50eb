use serde::Serialize;
use std::fmt;

/// The outcome of stressing one formula under one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct StressResult {
    pub scenario_name: String,
    pub formula: String,
    pub baseline_allocation: f64,
    pub stressed_allocation: f64,
    pub allocation_change_pct: f64,
    pub expected_loss_pct: f64,
    pub worst_case_loss_pct: f64,
    pub ruin_probability_pct: f64,
    pub recovery_months: u32,
    pub risk_score: RiskScore,
    pub impact: ImpactAnalysis,
}

/// How the shocked metric vector moved relative to the baseline.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactAnalysis {
    pub sharpe_degradation: f64,
    pub volatility_increase_pct: f64,
    pub drawdown_increase_pct: f64,
    pub win_rate_drop_pct: f64,
}

/// Five-tier qualitative risk label, driven by thresholds on the stressed
/// allocation, the ruin probability, and the worst-case loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskScore {
    VeryLow,
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskScore {
    /// All thresholds are on percentage-scaled values.
    pub fn classify(allocation: f64, ruin_probability: f64, worst_case_loss: f64) -> Self {
        if allocation <= 2.0 && ruin_probability <= 5.0 && worst_case_loss <= 10.0 {
            RiskScore::VeryLow
        } else if allocation <= 5.0 && ruin_probability <= 15.0 && worst_case_loss <= 25.0 {
            RiskScore::Low
        } else if allocation <= 15.0 && ruin_probability <= 35.0 && worst_case_loss <= 50.0 {
            RiskScore::Moderate
        } else if allocation <= 30.0 && ruin_probability <= 60.0 && worst_case_loss <= 75.0 {
            RiskScore::High
        } else {
            RiskScore::Extreme
        }
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskScore::VeryLow => "very low",
            RiskScore::Low => "low",
            RiskScore::Moderate => "moderate",
            RiskScore::High => "high",
            RiskScore::Extreme => "extreme",
        };
        write!(f, "{label}")
    }
}
