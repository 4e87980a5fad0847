//! Vector Clock
//!
//! Tracks the happens-before relation between steps of one execution.
//!
//! # Theory
//!
//! Given steps e1 and e2:
//! - e1 happens-before e2 if VC(e1) < VC(e2)
//! - e1 and e2 are concurrent if neither happens-before the other
//!
//! Entries are indexed by the dense slot a unit received when DPOR first saw
//! it, so the clock is a fixed array with no heap allocation.

use super::MAX_UNITS;
use std::fmt;

/// Logical clock vector, one entry per unit slot
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VectorClock {
    clocks: [u32; MAX_UNITS],
}

impl VectorClock {
    /// All-zero clock
    #[inline]
    pub const fn new() -> Self {
        Self {
            clocks: [0; MAX_UNITS],
        }
    }

    /// Advance the entry of `slot`
    #[inline]
    pub fn tick(&mut self, slot: usize) {
        if slot < MAX_UNITS {
            self.clocks[slot] = self.clocks[slot].saturating_add(1);
        }
    }

    /// Element-wise maximum with `other`
    ///
    /// ```text
    /// self:  [3, 1, 2]
    /// other: [2, 5, 1]
    /// result:[3, 5, 2]
    /// ```
    #[inline]
    pub fn merge(&mut self, other: &VectorClock) {
        for (mine, theirs) in self.clocks.iter_mut().zip(other.clocks.iter()) {
            *mine = (*mine).max(*theirs);
        }
    }

    /// Every entry is `<=` the matching entry of `other`
    pub fn dominated_by(&self, other: &VectorClock) -> bool {
        self.clocks.iter().zip(other.clocks.iter()).all(|(a, b)| a <= b)
    }

    /// Strict happens-before: dominated and not equal
    ///
    /// ```text
    /// [1, 2, 3] happens-before [2, 3, 4]  ✓
    /// [1, 2, 3] happens-before [1, 2, 3]  ✗
    /// [1, 3, 3] happens-before [2, 2, 4]  ✗
    /// ```
    pub fn happens_before(&self, other: &VectorClock) -> bool {
        self.dominated_by(other) && self != other
    }

    /// Neither clock happens-before the other
    #[inline]
    pub fn concurrent(&self, other: &VectorClock) -> bool {
        !self.happens_before(other) && !other.happens_before(self)
    }

    /// Entry of `slot`
    #[inline]
    pub fn get(&self, slot: usize) -> u32 {
        self.clocks.get(slot).copied().unwrap_or(0)
    }
}

impl Default for VectorClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self
            .clocks
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |last| last + 1);
        write!(f, "VC{:?}", &self.clocks[..used])
    }
}
