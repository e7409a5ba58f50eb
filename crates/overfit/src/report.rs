use serde::Serialize;

/// The outcome of an overfitting analysis.
///
/// The detector refuses to put a number on data that cannot support one;
/// callers must handle both arms.
#[derive(Debug, Clone, Serialize)]
pub enum OverfittingAnalysis {
    /// Fewer than two strategies, or no strategy long enough to split into
    /// evaluation periods.
    InsufficientData { reason: String },
    Report(OverfittingReport),
}

/// The composite diagnostic. `overfitting_score` runs 0-100, higher meaning
/// more evidence that the formula is curve-fit to its history.
#[derive(Debug, Clone, Serialize)]
pub struct OverfittingReport {
    pub overfitting_score: f64,
    pub risk_level: RiskLevel,
    pub components: ComponentScores,
    /// Raw Pearson correlation between current allocations and historical
    /// performance.
    pub correlation: f64,
    pub formula_complexity: u32,
    pub warnings: Vec<String>,
}

/// The five sub-scores, each 0-100 with higher meaning healthier.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentScores {
    pub stability: f64,
    pub cross_validation: f64,
    pub robustness: f64,
    pub correlation: f64,
    pub extreme_allocations: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(overfitting_score: f64) -> Self {
        if overfitting_score < 30.0 {
            RiskLevel::Low
        } else if overfitting_score < 60.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_boundaries() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(29.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(59.9), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::High);
    }
}
