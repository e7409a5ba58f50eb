use thiserror::Error;

/// Structural misuse of the simulator. Unlike data conditions (bad formulas,
/// degenerate metrics), these indicate a programming error in the caller and
/// fail fast instead of degrading silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("trial count must be at least 1")]
    NoTrials,

    #[error("simulation horizon must be at least 1 day")]
    EmptyHorizon,

    #[error("confidence level must be strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),
}
