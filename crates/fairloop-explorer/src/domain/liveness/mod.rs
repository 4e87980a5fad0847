//! Liveness Checking
//!
//! # Overview
//!
//! A liveness bug is an infinite execution in which some monitor stays hot
//! forever. Exploration is finite, so the checker looks for a repeated
//! program state instead: the steps between two occurrences of the same
//! fingerprint form a candidate cycle that the program could repeat forever.
//!
//! # Algorithm
//!
//! ```text
//! exploring ──repeat + fair cycle + hot monitors──▶ replaying
//!     ▲                                                │
//!     └──────── escape (cooled / diverged) ────────────┤
//!                                                      │
//!                             temperature ≥ threshold ─▶ LivenessViolation
//! ```
//!
//! - [`fairness`]: pure checks over a candidate cycle.
//! - [`cycle_detection`]: the strategy decorator driving the state machine.

pub mod cycle_detection;
pub mod fairness;

pub use cycle_detection::CycleDetectionStrategy;
pub use fairness::{hot_monitors, is_nondeterminism_fair, is_scheduling_fair};

use crate::domain::state_cache::State;
use crate::domain::trace::ScheduleStep;

/// One step of a candidate cycle with the state captured after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStep {
    /// Recorded choice
    pub step: ScheduleStep,
    /// State captured after the choice executed
    pub state: State,
}
