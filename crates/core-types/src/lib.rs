//! # Core Types
//!
//! The foundational data model shared by every analytics crate: return
//! series, strategies, strategy collections, and portfolios.
//!
//! ## Architectural Principles
//!
//! - **Layer 0:** This crate depends on nothing else in the workspace. Every
//!   engine (analytics, optimizer, simulator, ...) consumes these types and
//!   returns plain structured data, so the presentation and persistence
//!   layers never see an engine-internal type.
//! - **Immutable strategies:** A [`Strategy`] is frozen at construction.
//!   Recomputing metrics after a data reload means building a new `Strategy`
//!   and swapping the `Arc` in the owning [`StrategySet`], so a concurrent
//!   reader can never observe a half-written metric map.

pub mod portfolio;
pub mod series;
pub mod strategy;

// Re-export the core types to provide a clean public API.
pub use portfolio::{Portfolio, PortfolioSummary, ReturnMatrix, aligned_return_matrix};
pub use series::ReturnSeries;
pub use strategy::{MetricMap, Strategy, StrategySet};
