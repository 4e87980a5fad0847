//! Dynamic Partial-Order Reduction
//!
//! # Overview
//!
//! Depth-first exploration that skips interleavings equivalent to one already
//! explored. Two schedules are equivalent when they differ only in the order
//! of INDEPENDENT steps; DPOR explores one representative per class.
//!
//! # Dependency
//!
//! Steps are dependent when they come from different units and act on the
//! same target (the `pending` operation the runtime declares for a unit).
//! A unit with no declared operation is dependent with every other step.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ DporStrategy     │  stack-based DFS
//! ├──────────────────┤
//! │ - stack          │  one frame per choice point
//! │   - enabled      │  units enabled at the frame
//! │   - backtrack    │  units still to explore at the frame
//! │   - done         │  units already explored at the frame
//! │ - unit_clocks    │  causality per unit slot
//! └──────────────────┘
//! ```
//!
//! # Feature Gating
//!
//! Compiled with the `dpor` feature (on by default).

pub mod strategy;
pub mod vector_clock;

pub use strategy::{DporStats, DporStrategy, UnitSet};
pub use vector_clock::VectorClock;

/// Maximum number of distinct units a DPOR run can track
pub const MAX_UNITS: usize = 64;
