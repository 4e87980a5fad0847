//! Engine-level errors

use thiserror::Error;

/// Errors that stop an engine run
///
/// Bugs found in the program under test are not errors: they are recorded in
/// the report and exploration continues.
#[derive(Debug, Error)]
pub enum EngineError {
    // === Configuration ===
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The selected strategy needs input that was not supplied
    #[error("strategy '{strategy}' requires {requirement}")]
    MissingStrategyInput {
        /// Strategy name
        strategy: &'static str,
        /// What is missing
        requirement: &'static str,
    },

    // === Replay ===
    /// A replayed trace diverged and no fallback strategy was available
    #[error("trace is not reproducible at step {step}: {reason}")]
    NonReproducibleTrace {
        /// Index of the recorded step
        step: usize,
        /// Divergence description
        reason: String,
    },

    // === Harness ===
    /// The run was cancelled before any iteration completed
    #[error("engine run cancelled")]
    Cancelled,

    /// The background task running the engine failed
    #[error("engine task failed: {0}")]
    Harness(String),

    // === Persistence ===
    /// Reading or writing a trace file failed
    #[error("trace i/o failed: {0:#}")]
    TraceIo(#[from] anyhow::Error),
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
