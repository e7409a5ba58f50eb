use crate::ast::{BinaryOp, Expr, Func};
use crate::error::FormulaError;
use core_types::MetricMap;
use serde::{Deserialize, Serialize};

/// The clamp applied to a successful allocation evaluation.
///
/// Both bounds exist as named policies because call sites disagree on
/// purpose: the simulator and stress tester accept the full percentage
/// range, while the overfitting diagnostics cap at 50% to keep a single
/// runaway allocation from dominating every sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClampPolicy {
    /// Allocations in `[0, 100]` percent.
    Standard,
    /// Allocations in `[0, 50]` percent.
    Conservative,
}

impl ClampPolicy {
    pub fn apply(self, value: f64) -> f64 {
        let upper = match self {
            ClampPolicy::Standard => 100.0,
            ClampPolicy::Conservative => 50.0,
        };
        value.clamp(0.0, upper)
    }
}

/// A parsed allocation formula, ready for repeated evaluation.
///
/// Parsing once and evaluating per trial is what the Monte Carlo loop does;
/// evaluation is a pure function of the expression and the metric map, so
/// two calls with identical inputs produce bit-identical results.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
    source: String,
}

impl Formula {
    pub fn parse(input: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            expr: Expr::parse(input)?,
            source: input.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn complexity(&self) -> u32 {
        self.expr.complexity()
    }

    /// Evaluates the formula against a metric map.
    ///
    /// Division by zero, `log`/`sqrt` domain violations, missing metrics and
    /// NaN results are all reported as errors; the caller decides what value
    /// stands in.
    pub fn evaluate(&self, metrics: &MetricMap) -> Result<f64, FormulaError> {
        let value = eval_expr(&self.expr, metrics)?;
        if value.is_nan() {
            return Err(FormulaError::NonFinite);
        }
        Ok(value)
    }

    /// Evaluates to a clamped allocation percentage, recovering every failure
    /// with `fallback`. This is the entry point used inside batch loops: one
    /// bad formula or one degenerate metric vector must not abort the
    /// remaining trials.
    pub fn allocation_percent(&self, metrics: &MetricMap, policy: ClampPolicy, fallback: f64) -> f64 {
        match self.evaluate(metrics) {
            Ok(value) => policy.apply(value),
            Err(_) => fallback,
        }
    }
}

/// One-shot parse-and-evaluate.
pub fn evaluate(input: &str, metrics: &MetricMap) -> Result<f64, FormulaError> {
    Formula::parse(input)?.evaluate(metrics)
}

/// One-shot total-function evaluation to an allocation percentage.
pub fn allocation_percent(
    input: &str,
    metrics: &MetricMap,
    policy: ClampPolicy,
    fallback: f64,
) -> f64 {
    match Formula::parse(input) {
        Ok(formula) => formula.allocation_percent(metrics, policy, fallback),
        Err(_) => fallback,
    }
}

fn eval_expr(expr: &Expr, metrics: &MetricMap) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Metric(metric) => metrics
            .get(metric.name())
            .copied()
            .ok_or_else(|| FormulaError::MissingMetric(metric.name().to_string())),
        Expr::Neg(inner) => Ok(-eval_expr(inner, metrics)?),
        Expr::Binary { op, lhs, rhs } => {
            let left = eval_expr(lhs, metrics)?;
            let right = eval_expr(rhs, metrics)?;
            match op {
                BinaryOp::Add => Ok(left + right),
                BinaryOp::Sub => Ok(left - right),
                BinaryOp::Mul => Ok(left * right),
                BinaryOp::Div => {
                    if right == 0.0 {
                        Err(FormulaError::DivisionByZero)
                    } else {
                        Ok(left / right)
                    }
                }
            }
        }
        Expr::Call { func, args } => {
            let values: Vec<f64> = args
                .iter()
                .map(|arg| eval_expr(arg, metrics))
                .collect::<Result<_, _>>()?;
            match func {
                Func::Sqrt => {
                    if values[0] < 0.0 {
                        Err(FormulaError::Domain("sqrt"))
                    } else {
                        Ok(values[0].sqrt())
                    }
                }
                Func::Abs => Ok(values[0].abs()),
                Func::Log => {
                    if values[0] <= 0.0 {
                        Err(FormulaError::Domain("log"))
                    } else {
                        Ok(values[0].ln())
                    }
                }
                Func::Exp => Ok(values[0].exp()),
                Func::Max => Ok(values[0].max(values[1])),
                Func::Min => Ok(values[0].min(values[1])),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> MetricMap {
        let mut map = MetricMap::new();
        map.insert("sharpe".to_string(), 1.0);
        map.insert("omega".to_string(), 1.5);
        map.insert("drawdown".to_string(), 0.1);
        map.insert("volatility".to_string(), 0.2);
        map
    }

    #[test]
    fn evaluates_arithmetic() {
        let value = evaluate("sharpe * omega / drawdown", &metrics()).unwrap();
        assert!((value - 15.0).abs() < 1e-12);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let formula = Formula::parse("sqrt(omega) * 10 - volatility").unwrap();
        let map = metrics();
        let first = formula.evaluate(&map).unwrap();
        let second = formula.evaluate(&map).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn division_by_zero_falls_back() {
        let mut map = metrics();
        map.insert("drawdown".to_string(), 0.0);
        let result = evaluate("sharpe / drawdown", &map);
        assert_eq!(result, Err(FormulaError::DivisionByZero));

        let allocation = allocation_percent("sharpe / drawdown", &map, ClampPolicy::Standard, 5.0);
        assert_eq!(allocation, 5.0);
        assert!(!allocation.is_nan());
    }

    #[test]
    fn domain_errors_fall_back() {
        let mut map = metrics();
        map.insert("sharpe".to_string(), -1.0);
        assert_eq!(
            evaluate("sqrt(sharpe)", &map),
            Err(FormulaError::Domain("sqrt"))
        );
        assert_eq!(
            evaluate("log(0 * sharpe)", &map),
            Err(FormulaError::Domain("log"))
        );
        assert_eq!(
            allocation_percent("log(-sharpe - 1)", &map, ClampPolicy::Standard, 10.0),
            10.0
        );
    }

    #[test]
    fn missing_metric_falls_back() {
        let map = MetricMap::new();
        assert_eq!(
            allocation_percent("sharpe * 10", &map, ClampPolicy::Standard, 5.0),
            5.0
        );
    }

    #[test]
    fn clamp_policies_differ() {
        let map = metrics();
        // sharpe * 80 = 80.
        assert_eq!(
            allocation_percent("sharpe * 80", &map, ClampPolicy::Standard, 5.0),
            80.0
        );
        assert_eq!(
            allocation_percent("sharpe * 80", &map, ClampPolicy::Conservative, 5.0),
            50.0
        );
        assert_eq!(
            allocation_percent("-sharpe * 80", &map, ClampPolicy::Standard, 5.0),
            0.0
        );
    }

    #[test]
    fn infinite_metric_clamps_to_upper_bound() {
        let mut map = metrics();
        map.insert("omega".to_string(), f64::INFINITY);
        assert_eq!(
            allocation_percent("omega", &map, ClampPolicy::Standard, 5.0),
            100.0
        );
    }

    #[test]
    fn parse_failure_falls_back() {
        let map = metrics();
        assert_eq!(
            allocation_percent("import os", &map, ClampPolicy::Standard, 5.0),
            5.0
        );
        assert_eq!(
            allocation_percent("", &map, ClampPolicy::Standard, 5.0),
            5.0
        );
    }
}
