//! # Analytics Engine
//!
//! Converts a return series into a mapping of named performance and risk
//! ratios. It acts as the "unbiased judge" of the system: every other engine
//! (optimizer, simulator, stress tester, overfitting detector) consumes its
//! output rather than recomputing ratios ad hoc.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It depends only on
//!   `core-types` (Layer 0) and has no knowledge of external systems.
//! - **Stateless Calculation:** [`MetricsEngine`] is a stateless calculator:
//!   a pure function from a return series to a metric map. Callers cache the
//!   result on the owning `Strategy`.
//! - **No failure channel:** Numeric degeneracy (zero variance, zero
//!   denominator) is recovered through the per-metric sentinel policy in
//!   [`sentinel`], never raised. The only input check is the empty series,
//!   which yields an empty map.
//!
//! ## Public API
//!
//! - `MetricsEngine`: the calculator.
//! - `formula_baseline`: the nine-key view consumed by formula call sites.
//! - `sentinel`: the centralized zero-denominator policy table.
//! - `stats`: scalar statistics helpers shared across the workspace.

pub mod baseline;
pub mod engine;
pub mod sentinel;
pub mod stats;

pub use baseline::{FORMULA_METRICS, formula_baseline};
pub use engine::{MetricsEngine, max_drawdown, omega_ratio};
