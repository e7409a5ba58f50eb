//! Centralized zero-denominator policy.
//!
//! Several ratios share a denominator that can legitimately be zero (no
//! losing trades, zero variance, no drawdown). Each metric resolves that
//! case to a sentinel consistent with its natural bound instead of raising
//! or propagating NaN. The table lives here, in one place, so the engine,
//! the optimizer and every formula call site agree on what a degenerate
//! Omega (or Sortino, or profit factor) evaluates to.

/// The value a metric takes when its denominator vanishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// The ratio is meaningless without the denominator; report "no signal".
    Zero,
    /// The denominator measured adverse outcomes and there were none; the
    /// metric saturates at its favorable bound.
    PositiveInfinity,
    /// Mirror case for metrics bounded below.
    NegativeInfinity,
}

impl Sentinel {
    pub fn value(self) -> f64 {
        match self {
            Sentinel::Zero => 0.0,
            Sentinel::PositiveInfinity => f64::INFINITY,
            Sentinel::NegativeInfinity => f64::NEG_INFINITY,
        }
    }
}

/// Policy lookup by metric name. Metrics not listed resolve to zero.
pub fn policy(metric: &str) -> Sentinel {
    match metric {
        // No shortfalls below the threshold: the ratio saturates upward.
        "omega_ratio" => Sentinel::PositiveInfinity,
        // No losing periods at all.
        "profit_factor" | "payoff_ratio" => Sentinel::PositiveInfinity,
        // No returns below the target.
        "sortino_ratio" => Sentinel::PositiveInfinity,
        _ => Sentinel::Zero,
    }
}

/// The sentinel value for a metric's degenerate case.
pub fn degenerate(metric: &str) -> f64 {
    policy(metric).value()
}

/// Scrubs a computed metric: NaN (the product of degenerate arithmetic such
/// as `inf * 0`) collapses to the metric's sentinel. Finite values and the
/// infinities pass through untouched.
pub fn scrub(metric: &str, value: f64) -> f64 {
    if value.is_nan() {
        degenerate(metric)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omega_saturates_positive() {
        assert_eq!(policy("omega_ratio"), Sentinel::PositiveInfinity);
        assert_eq!(degenerate("omega_ratio"), f64::INFINITY);
    }

    #[test]
    fn unknown_metrics_default_to_zero() {
        assert_eq!(degenerate("sharpe_ratio"), 0.0);
        assert_eq!(degenerate("not_a_metric"), 0.0);
    }

    #[test]
    fn scrub_replaces_nan_only() {
        assert_eq!(scrub("sharpe_ratio", f64::NAN), 0.0);
        assert_eq!(scrub("omega_ratio", f64::NAN), f64::INFINITY);
        assert_eq!(scrub("sharpe_ratio", 1.5), 1.5);
        assert_eq!(scrub("omega_ratio", f64::INFINITY), f64::INFINITY);
    }
}
