//! Bug Minimization
//!
//! # Overview
//!
//! Given the trace of a buggy iteration, find the shortest prefix that still
//! makes the bug inevitable: replay `k` recorded choices exactly, let a
//! suffix strategy explore freely from there, and binary-search `k`.
//!
//! ```text
//! trace:  [s0 s1 s2 ... s36 | s37 ... s99]
//!          ── replayed ──   │ ── suffix ──
//!                           └ critical transition
//! ```
//!
//! - [`bounds`]: the pure search cursor.
//! - [`critical_transition`]: the strategy replaying prefixes.

pub mod bounds;
pub mod critical_transition;

#[cfg(kani)]
mod proofs;

pub use bounds::SearchBounds;
pub use critical_transition::CriticalTransitionStrategy;
