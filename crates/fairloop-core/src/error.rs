//! # Error Taxonomy
//!
//! Errors crossing the boundary between the exploration engine and the actor
//! runtime under test.
//!
//! # Overview
//!
//! | Condition            | Representation                              | Recoverable |
//! |----------------------|---------------------------------------------|-------------|
//! | No enabled unit      | `SchedulingError::NoEnabledChoice`          | normal end  |
//! | Replay divergence    | `SchedulingError::NotReproducible`          | with suffix |
//! | Liveness violation   | `SchedulingError::Liveness`                 | per iteration |
//! | Assertion failure    | `ExecutionHalted` + `BugKind::Safety`       | per iteration |
//!
//! A fairness escape is not an error: the liveness checker handles it
//! internally and never surfaces it.

use crate::types::MonitorId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned by scheduling strategies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    // === Normal termination ===
    /// No unit is enabled (deadlock or program completion)
    #[error("no enabled schedulable unit")]
    NoEnabledChoice,

    /// The strategy has no further choices to offer this iteration
    #[error("strategy exhausted")]
    Exhausted,

    // === Replay ===
    /// Live execution diverged from the recorded trace
    #[error("trace is not reproducible at step {step}: {reason}")]
    NotReproducible {
        /// Index of the recorded step that could not be matched
        step: usize,
        /// Human readable description of the divergence
        reason: String,
    },

    // === Liveness ===
    /// A fair cycle kept monitors hot past the temperature threshold
    #[error(transparent)]
    Liveness(#[from] LivenessViolation),
}

impl SchedulingError {
    /// Shorthand for a replay divergence
    pub fn not_reproducible(step: usize, reason: impl Into<String>) -> Self {
        Self::NotReproducible {
            step,
            reason: reason.into(),
        }
    }

    /// Whether this error ends the iteration without a bug
    #[inline]
    pub fn is_quiescence(&self) -> bool {
        matches!(self, Self::NoEnabledChoice | Self::Exhausted)
    }
}

/// A monitor held hot along an infinite fair execution
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error(
    "monitor(s) {} detected potential liveness bug in hot state (temperature {temperature}, cycle of {cycle_len} steps)",
    display_monitors(.monitors)
)]
pub struct LivenessViolation {
    /// Monitors hot in every state of the cycle
    pub monitors: Vec<MonitorId>,
    /// Temperature reached when the violation fired
    pub temperature: usize,
    /// Number of steps in the replayed cycle
    pub cycle_len: usize,
}

impl LivenessViolation {
    /// Violation reported when the program terminates with a monitor still hot
    pub fn hot_at_termination(monitors: Vec<MonitorId>) -> Self {
        Self {
            monitors,
            temperature: 0,
            cycle_len: 0,
        }
    }
}

fn display_monitors(monitors: &[MonitorId]) -> String {
    monitors
        .iter()
        .map(|m| format!("'{}'", m))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Marker returned into runtime handlers once the scheduler stopped the run
///
/// Handlers propagate it with `?` so that no further program code executes
/// after an assertion failure or a detected violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("execution halted by the scheduler")]
pub struct ExecutionHalted;

/// Classification of a bug found during exploration
///
/// Codes are stable and survive report serialization.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BugKind {
    // === Safety (0x1000) ===
    /// `assert` failed inside the program under test
    Safety = 0x1000,

    // === Liveness (0x2000) ===
    /// Confirmed fair cycle with monitors stuck hot
    Liveness = 0x2000,
    /// Monitor still hot when the program terminated
    HotAtTermination = 0x2001,

    // === Replay (0x3000) ===
    /// Recorded trace could not be reproduced
    NonReproducible = 0x3000,

    // === Internal (0x9000) ===
    /// Program under test panicked or the strategy failed unexpectedly
    Internal = 0x9000,
}

impl BugKind {
    /// Convert a numeric code back to a kind (unknown codes map to `Internal`)
    pub fn from_code(code: u32) -> Self {
        match code {
            0x1000 => BugKind::Safety,
            0x2000 => BugKind::Liveness,
            0x2001 => BugKind::HotAtTermination,
            0x3000 => BugKind::NonReproducible,
            _ => BugKind::Internal,
        }
    }

    /// Numeric code
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Human-readable message
    pub fn message(&self) -> &'static str {
        match self {
            BugKind::Safety => "Safety violation",
            BugKind::Liveness => "Liveness violation",
            BugKind::HotAtTermination => "Monitor hot at termination",
            BugKind::NonReproducible => "Non-reproducible trace",
            BugKind::Internal => "Internal error",
        }
    }

    /// Whether the bug concerns unbounded (liveness) behavior
    pub fn is_liveness(&self) -> bool {
        matches!(self, BugKind::Liveness | BugKind::HotAtTermination)
    }
}

impl fmt::Display for BugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:04x}): {}", self, self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bug_kind_code_round_trip() {
        for kind in [
            BugKind::Safety,
            BugKind::Liveness,
            BugKind::HotAtTermination,
            BugKind::NonReproducible,
            BugKind::Internal,
        ] {
            assert_eq!(BugKind::from_code(kind.code()), kind);
            assert!(!kind.message().is_empty());
        }
        assert_eq!(BugKind::from_code(42), BugKind::Internal);
    }

    #[test]
    fn liveness_kinds() {
        assert!(BugKind::Liveness.is_liveness());
        assert!(BugKind::HotAtTermination.is_liveness());
        assert!(!BugKind::Safety.is_liveness());
    }

    #[test]
    fn liveness_violation_names_monitors() {
        let violation = LivenessViolation {
            monitors: vec![MonitorId::new("M"), MonitorId::new("N")],
            temperature: 40,
            cycle_len: 4,
        };
        let text = violation.to_string();
        assert!(text.contains("'M', 'N'"));
        assert!(text.contains("temperature 40"));

        let err: SchedulingError = violation.into();
        assert!(matches!(err, SchedulingError::Liveness(_)));
        assert!(!err.is_quiescence());
    }

    #[test]
    fn quiescence_errors() {
        assert!(SchedulingError::NoEnabledChoice.is_quiescence());
        assert!(SchedulingError::Exhausted.is_quiescence());
        assert!(!SchedulingError::not_reproducible(3, "type mismatch").is_quiescence());
    }
}
