//! # Formula Evaluator
//!
//! Parses and evaluates user-authored allocation formulas: restricted
//! arithmetic expressions over a closed vocabulary of nine metric names and
//! six whitelisted functions. The formula string is the one piece of user
//! input that reaches deep into the engines, so the surface is deliberately
//! tiny: expressions only, no statements, no ambient state, and any token
//! outside the vocabulary is rejected at parse time.
//!
//! ## Failure semantics
//!
//! Parse and evaluation failures are never fatal to a caller's batch loop.
//! [`allocation_percent`] is the total-function entry point every engine
//! uses: it clamps a successful result to the call site's [`ClampPolicy`]
//! and returns the call site's fallback constant on any failure (unknown
//! identifier, division by zero, `log`/`sqrt` domain error, NaN result).
//! The fallback is a parameter, not a constant: the simulator and stress
//! tester pass 5.0, the overfitting detector 10.0.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;

pub use ast::{Expr, Func, Metric};
pub use error::FormulaError;
pub use eval::{ClampPolicy, Formula, allocation_percent, evaluate};

/// The closed identifier vocabulary accepted by the parser.
pub const VOCABULARY: [&str; 9] = [
    "sharpe",
    "omega",
    "volatility",
    "drawdown",
    "win_rate",
    "profit_factor",
    "total_return",
    "calmar",
    "sortino",
];
