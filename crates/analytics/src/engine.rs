use crate::sentinel;
use crate::stats;
use core_types::{MetricMap, ReturnSeries, Strategy};
use std::sync::Arc;
use tracing::debug;

const PERIODS_PER_YEAR: f64 = 252.0;
const RISK_FREE_RATE: f64 = 0.0;
const VAR_CONFIDENCE: f64 = 0.95;
const TAIL_PERCENTILE: f64 = 0.05;

/// A stateless calculator for deriving performance metrics from a return
/// series.
#[derive(Debug, Default)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the full metric map for a return series.
    ///
    /// An empty series yields an empty map; this is the only input check any
    /// consumer needs before sampling the result. Every ratio resolves its
    /// zero-denominator case through the [`sentinel`] policy table, so the
    /// map never contains NaN.
    pub fn compute(&self, returns: &ReturnSeries) -> MetricMap {
        let mut metrics = MetricMap::new();
        if returns.is_empty() {
            debug!("empty return series, no metrics computed");
            return metrics;
        }

        let r = returns.as_slice();
        self.return_metrics(r, &mut metrics);
        self.risk_metrics(r, &mut metrics);
        self.trade_metrics(r, &mut metrics);
        self.drawdown_ratios(r, &mut metrics);
        self.trend_metrics(r, &mut metrics);
        self.distribution_metrics(r, &mut metrics);
        metrics
    }

    /// Builds a [`Strategy`] with its metric cache populated from `returns`.
    ///
    /// This is the one constructor call sites should use: it guarantees the
    /// cached map matches the series, and replacing the returned `Arc` in a
    /// `StrategySet` is the atomic recompute-and-swap the data layer performs
    /// on reload.
    pub fn attach(&self, name: impl Into<String>, returns: ReturnSeries) -> Arc<Strategy> {
        let metrics = self.compute(&returns);
        Arc::new(Strategy::new(name, returns, metrics))
    }

    fn return_metrics(&self, r: &[f64], out: &mut MetricMap) {
        let total = total_return(r);
        insert(out, "total_return", total);
        insert(out, "annualized_return", annualized_return(r));
        insert(
            out,
            "volatility",
            stats::std_dev(r) * PERIODS_PER_YEAR.sqrt(),
        );

        // Sharpe: zero-variance series carry no signal.
        let excess: Vec<f64> = r
            .iter()
            .map(|v| v - RISK_FREE_RATE / PERIODS_PER_YEAR)
            .collect();
        let excess_std = stats::std_dev(&excess);
        let sharpe = if excess_std == 0.0 {
            0.0
        } else {
            stats::mean(&excess) / excess_std * PERIODS_PER_YEAR.sqrt()
        };
        insert(out, "sharpe_ratio", sharpe);

        insert(out, "sortino_ratio", sortino_ratio(r));
        insert(out, "omega_ratio", omega_ratio(r, 0.0));
    }

    fn risk_metrics(&self, r: &[f64], out: &mut MetricMap) {
        let max_dd = max_drawdown(r);
        insert(out, "max_drawdown", max_dd);

        let calmar = if max_dd == 0.0 {
            0.0
        } else {
            annualized_return(r) / max_dd.abs()
        };
        insert(out, "calmar_ratio", calmar);

        let var = stats::percentile(r, (1.0 - VAR_CONFIDENCE) * 100.0);
        insert(out, "value_at_risk", var);
        let tail: Vec<f64> = r.iter().copied().filter(|v| *v <= var).collect();
        insert(out, "conditional_var", stats::mean(&tail));

        // Downside deviation over min(r - target, 0), annualized.
        let downside: Vec<f64> = r.iter().map(|v| v.min(0.0)).collect();
        insert(
            out,
            "downside_deviation",
            stats::std_dev(&downside) * PERIODS_PER_YEAR.sqrt(),
        );
        let upside: Vec<f64> = r.iter().map(|v| v.max(0.0)).collect();
        insert(out, "upside_potential", stats::mean(&upside));
    }

    fn trade_metrics(&self, r: &[f64], out: &mut MetricMap) {
        let n = r.len() as f64;
        let win_rate = r.iter().filter(|v| **v > 0.0).count() as f64 / n;
        insert(out, "win_rate", win_rate);

        let gains: f64 = r.iter().filter(|v| **v > 0.0).sum();
        let losses: f64 = r.iter().filter(|v| **v < 0.0).sum::<f64>().abs();
        let profit_factor = if losses == 0.0 {
            sentinel::degenerate("profit_factor")
        } else {
            gains / losses
        };
        insert(out, "profit_factor", profit_factor);

        let payoff = payoff_ratio(r);
        insert(out, "payoff_ratio", payoff);
        insert(out, "kelly_criterion", kelly_criterion(win_rate, payoff));

        let wins: Vec<f64> = r.iter().copied().filter(|v| *v > 0.0).collect();
        let losers: Vec<f64> = r.iter().copied().filter(|v| *v < 0.0).collect();
        let avg_win = stats::mean(&wins);
        let avg_loss = stats::mean(&losers);
        insert(
            out,
            "expectancy",
            win_rate * avg_win + (1.0 - win_rate) * avg_loss,
        );

        insert(out, "cpc_index", win_rate * payoff * profit_factor);
    }

    fn drawdown_ratios(&self, r: &[f64], out: &mut MetricMap) {
        let dd = drawdown_series(r);
        let ann = annualized_return(r);
        let total = total_return(r);
        let max_dd = max_drawdown(r);

        insert(
            out,
            "recovery_factor",
            if max_dd == 0.0 { 0.0 } else { total / max_dd.abs() },
        );

        let avg_dd = stats::mean(&dd);
        insert(
            out,
            "sterling_ratio",
            if avg_dd == 0.0 { 0.0 } else { ann / avg_dd.abs() },
        );

        let burke_denom = dd.iter().map(|d| d * d).sum::<f64>().sqrt();
        insert(
            out,
            "burke_ratio",
            if burke_denom == 0.0 { 0.0 } else { ann / burke_denom },
        );

        // Ulcer performance index.
        let ulcer = stats::mean(&dd.iter().map(|d| d * d).collect::<Vec<_>>()).sqrt();
        insert(
            out,
            "martin_ratio",
            if ulcer == 0.0 { 0.0 } else { ann / ulcer },
        );

        let pain = stats::mean(&dd);
        insert(out, "pain_index", pain);
        insert(
            out,
            "gain_to_pain_ratio",
            if pain == 0.0 { 0.0 } else { total / pain },
        );
    }

    fn trend_metrics(&self, r: &[f64], out: &mut MetricMap) {
        let n = r.len();
        if n < 2 {
            insert(out, "d_ratio", 0.0);
            insert(out, "k_ratio", 0.0);
            insert(out, "r_squared", 0.0);
        } else {
            let cumsum = stats::cumulative_sum(r);
            let (slope, intercept) = stats::linear_fit(&cumsum);
            let residuals: Vec<f64> = cumsum
                .iter()
                .enumerate()
                .map(|(i, y)| y - (slope * i as f64 + intercept))
                .collect();

            let residual_std = stats::std_dev(&residuals);
            insert(
                out,
                "d_ratio",
                if residual_std == 0.0 { 0.0 } else { slope / residual_std },
            );

            insert(out, "k_ratio", k_ratio(&residuals, slope, n));

            let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let corr = stats::pearson(&xs, &cumsum);
            insert(out, "r_squared", corr * corr);
        }

        // With no benchmark series in the core, beta defaults to the market
        // and alpha/treynor/information collapse to their zero-benchmark
        // forms.
        let beta = 1.0;
        insert(out, "beta", beta);
        insert(out, "alpha", stats::mean(r) - RISK_FREE_RATE);
        insert(
            out,
            "treynor_ratio",
            (stats::mean(r) - RISK_FREE_RATE) / beta,
        );

        let tracking_error = stats::std_dev(r);
        insert(
            out,
            "information_ratio",
            if tracking_error == 0.0 {
                0.0
            } else {
                stats::mean(r) / tracking_error * PERIODS_PER_YEAR.sqrt()
            },
        );
    }

    fn distribution_metrics(&self, r: &[f64], out: &mut MetricMap) {
        insert(out, "skewness", stats::skewness(r));
        insert(out, "kurtosis", stats::excess_kurtosis(r));

        let right = stats::percentile(r, 100.0 - TAIL_PERCENTILE * 100.0);
        let left = stats::percentile(r, TAIL_PERCENTILE * 100.0);
        let tail_ratio = if left == 0.0 { 0.0 } else { (right / left).abs() };
        insert(out, "tail_ratio", tail_ratio);

        let profit_factor = out.get("profit_factor").copied().unwrap_or(0.0);
        let csr = if profit_factor > 1.0 {
            tail_ratio * (profit_factor - 1.0)
        } else {
            0.0
        };
        insert(out, "common_sense_ratio", csr);
    }
}

/// Product of `(1 + r)` over all observations, minus 1.
fn total_return(r: &[f64]) -> f64 {
    r.iter().map(|v| 1.0 + v).product::<f64>() - 1.0
}

fn annualized_return(r: &[f64]) -> f64 {
    let total = total_return(r);
    sentinel::scrub(
        "annualized_return",
        (1.0 + total).powf(PERIODS_PER_YEAR / r.len() as f64) - 1.0,
    )
}

fn sortino_ratio(r: &[f64]) -> f64 {
    let target = 0.0;
    let downside: Vec<f64> = r.iter().copied().filter(|v| *v < target).collect();
    if downside.is_empty() {
        return sentinel::degenerate("sortino_ratio");
    }
    let downside_std = stats::std_dev(&downside);
    if downside_std == 0.0 {
        return 0.0;
    }
    (stats::mean(r) - target) / downside_std * PERIODS_PER_YEAR.sqrt()
}

/// The anchor metric of the whole system. Every consumer (optimizer,
/// simulator, stress tester) must use this threshold convention.
pub fn omega_ratio(r: &[f64], threshold: f64) -> f64 {
    let gains: f64 = r
        .iter()
        .filter(|v| **v > threshold)
        .map(|v| v - threshold)
        .sum();
    let shortfalls: Vec<f64> = r
        .iter()
        .filter(|v| **v <= threshold)
        .map(|v| threshold - v)
        .collect();

    let loss_sum: f64 = shortfalls.iter().sum();
    if shortfalls.is_empty() || loss_sum == 0.0 {
        return sentinel::degenerate("omega_ratio");
    }
    gains / loss_sum
}

/// Maximum peak-to-trough decline of the cumulative equity curve; always
/// non-negative.
pub fn max_drawdown(r: &[f64]) -> f64 {
    drawdown_series(r).into_iter().fold(0.0, f64::max)
}

fn drawdown_series(r: &[f64]) -> Vec<f64> {
    let mut equity = 1.0;
    let mut peak = f64::MIN;
    r.iter()
        .map(|v| {
            equity *= 1.0 + v;
            peak = peak.max(equity);
            (peak - equity) / peak
        })
        .collect()
}

fn payoff_ratio(r: &[f64]) -> f64 {
    let wins: Vec<f64> = r.iter().copied().filter(|v| *v > 0.0).collect();
    let losses: Vec<f64> = r.iter().copied().filter(|v| *v < 0.0).collect();
    if losses.is_empty() {
        return sentinel::degenerate("payoff_ratio");
    }
    if wins.is_empty() {
        return 0.0;
    }
    stats::mean(&wins) / stats::mean(&losses).abs()
}

fn kelly_criterion(win_rate: f64, payoff: f64) -> f64 {
    if payoff == 0.0 {
        return 0.0;
    }
    // An infinite payoff (no losing trades) degrades to the analytic limit.
    if !payoff.is_finite() {
        return win_rate;
    }
    (payoff * win_rate - (1.0 - win_rate)) / payoff
}

fn k_ratio(residuals: &[f64], slope: f64, n: usize) -> f64 {
    if n < 3 {
        return 0.0;
    }
    let std_err = (residuals.iter().map(|e| e * e).sum::<f64>() / (n - 2) as f64).sqrt();
    if std_err == 0.0 || !std_err.is_finite() {
        return 0.0;
    }
    slope / (std_err * (n as f64).sqrt())
}

fn insert(out: &mut MetricMap, key: &str, value: f64) {
    out.insert(key.to_string(), sentinel::scrub(key, value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute(returns: Vec<f64>) -> MetricMap {
        MetricsEngine::new().compute(&ReturnSeries::new(returns))
    }

    #[test]
    fn empty_series_yields_empty_map() {
        assert!(compute(vec![]).is_empty());
    }

    #[test]
    fn total_return_compounds() {
        let metrics = compute(vec![0.10, -0.05]);
        // (1.10 * 0.95) - 1
        assert!((metrics["total_return"] - 0.045).abs() < 1e-12);
    }

    #[test]
    fn win_rate_stays_in_unit_interval_and_omega_non_negative() {
        let metrics = compute(vec![0.02, -0.01, 0.03, -0.02, 0.01]);
        let win_rate = metrics["win_rate"];
        assert!((0.0..=1.0).contains(&win_rate));
        assert!(metrics["omega_ratio"] >= 0.0);
    }

    #[test]
    fn all_positive_series_saturates_omega() {
        let metrics = compute(vec![0.01, 0.02, 0.03]);
        assert_eq!(metrics["omega_ratio"], f64::INFINITY);
        assert_eq!(metrics["profit_factor"], f64::INFINITY);
        assert_eq!(metrics["sortino_ratio"], f64::INFINITY);
        // Kelly must not degrade to NaN when the payoff saturates.
        assert!((metrics["kelly_criterion"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_has_zero_sharpe() {
        let metrics = compute(vec![0.01, 0.01, 0.01]);
        assert_eq!(metrics["sharpe_ratio"], 0.0);
        assert_eq!(metrics["volatility"], 0.0);
    }

    #[test]
    fn drawdown_of_monotone_gains_is_zero() {
        let metrics = compute(vec![0.01, 0.02, 0.01]);
        assert_eq!(metrics["max_drawdown"], 0.0);
        assert_eq!(metrics["calmar_ratio"], 0.0);
    }

    #[test]
    fn drawdown_matches_hand_computation() {
        // Equity: 1.10, 0.88, 0.968 -> peak 1.10, trough 0.88.
        let metrics = compute(vec![0.10, -0.20, 0.10]);
        assert!((metrics["max_drawdown"] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn no_metric_is_nan() {
        for series in [
            vec![0.01, 0.02, 0.03],
            vec![-0.01, -0.02],
            vec![0.0, 0.0, 0.0],
            vec![0.05],
        ] {
            for (name, value) in compute(series.clone()) {
                assert!(!value.is_nan(), "{name} is NaN for {series:?}");
            }
        }
    }

    #[test]
    fn positive_mean_series_has_positive_sharpe() {
        let metrics = compute(vec![0.01, -0.02, 0.03, -0.01, 0.02]);
        assert!(metrics["sharpe_ratio"] > 0.0);
    }
}
