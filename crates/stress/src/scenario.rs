/// A historical-crisis shock: additive/multiplicative deltas to the baseline
/// metric vector and a duration.
///
/// The scenario set is configuration data, not code: a fixed, process-wide
/// read-only table, versioned with the crate and not user-editable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub period: &'static str,
    pub sharpe_impact: f64,
    pub omega_impact: f64,
    pub volatility_multiplier: f64,
    pub drawdown_multiplier: f64,
    pub win_rate_impact: f64,
    pub duration_months: u32,
}

/// The fixed scenario table.
pub const SCENARIOS: [StressScenario; 7] = [
    StressScenario {
        name: "Black Monday 1987",
        description: "The October 19, 1987 crash",
        period: "Oct 1987",
        sharpe_impact: -2.5,
        omega_impact: -0.6,
        volatility_multiplier: 3.2,
        drawdown_multiplier: 4.5,
        win_rate_impact: -0.35,
        duration_months: 6,
    },
    StressScenario {
        name: "Dot-com Crash 2000",
        description: "The internet bubble bursting",
        period: "2000-2002",
        sharpe_impact: -1.8,
        omega_impact: -0.45,
        volatility_multiplier: 2.1,
        drawdown_multiplier: 2.8,
        win_rate_impact: -0.25,
        duration_months: 24,
    },
    StressScenario {
        name: "Lehman Crisis 2008",
        description: "The global financial crisis",
        period: "Sep 2008 - Mar 2009",
        sharpe_impact: -3.2,
        omega_impact: -0.8,
        volatility_multiplier: 4.1,
        drawdown_multiplier: 5.2,
        win_rate_impact: -0.42,
        duration_months: 18,
    },
    StressScenario {
        name: "Flash Crash 2010",
        description: "The May 6, 2010 flash crash",
        period: "May 2010",
        sharpe_impact: -3.8,
        omega_impact: -0.7,
        volatility_multiplier: 6.2,
        drawdown_multiplier: 4.5,
        win_rate_impact: -0.48,
        duration_months: 1,
    },
    StressScenario {
        name: "COVID-19 2020",
        description: "Pandemic shutdowns",
        period: "Mar-Apr 2020",
        sharpe_impact: -2.1,
        omega_impact: -0.52,
        volatility_multiplier: 5.3,
        drawdown_multiplier: 3.8,
        win_rate_impact: -0.38,
        duration_months: 3,
    },
    StressScenario {
        name: "Fed Tightening 2022",
        description: "Aggressive interest-rate hikes",
        period: "2022-2023",
        sharpe_impact: -1.2,
        omega_impact: -0.28,
        volatility_multiplier: 1.9,
        drawdown_multiplier: 2.1,
        win_rate_impact: -0.18,
        duration_months: 12,
    },
    StressScenario {
        name: "Synthetic Extreme",
        description: "A combined worst-case scenario",
        period: "Hypothetical",
        sharpe_impact: -5.0,
        omega_impact: -1.2,
        volatility_multiplier: 10.0,
        drawdown_multiplier: 8.0,
        win_rate_impact: -0.7,
        duration_months: 36,
    },
];
