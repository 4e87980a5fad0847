//! Binary-search cursor over trace prefix lengths

use serde::{Deserialize, Serialize};

/// Search interval `[left, right)` with its midpoint
///
/// # Invariants
///
/// - `left <= current <= right`
/// - `last_found`, when set, is a prefix length for which the bug reproduced
///   and `right <= last_found`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBounds {
    left: usize,
    right: usize,
    current: usize,
    last_found: Option<usize>,
}

impl SearchBounds {
    /// Search over prefixes of a trace of `len` steps
    pub fn new(len: usize) -> Self {
        Self {
            left: 0,
            right: len,
            current: len / 2,
            last_found: None,
        }
    }

    /// Restrict the search to `[left, right)`
    ///
    /// Out-of-order arguments are swapped.
    pub fn set(&mut self, left: usize, right: usize) {
        let (left, right) = if left <= right { (left, right) } else { (right, left) };
        self.left = left;
        self.right = right;
        self.current = left + (right - left) / 2;
    }

    /// Record the outcome at the current midpoint and halve the interval
    ///
    /// Returns `false` once the interval is empty.
    pub fn update(&mut self, bug_found: bool) -> bool {
        if bug_found {
            self.right = self.current;
            self.last_found = Some(self.current);
        } else {
            self.left = (self.current + 1).min(self.right);
        }
        self.current = self.left + (self.right - self.left) / 2;
        self.left < self.right
    }

    /// Close the search at `steps` without bisecting
    ///
    /// Used when only one prefix length is meaningful.
    pub fn close_at(&mut self, steps: usize, bug_found: bool) {
        self.left = steps;
        self.right = steps;
        self.current = steps;
        if bug_found {
            self.last_found = Some(steps);
        }
    }

    /// Lower bound
    #[inline]
    pub fn left(&self) -> usize {
        self.left
    }

    /// Upper bound (exclusive)
    #[inline]
    pub fn right(&self) -> usize {
        self.right
    }

    /// Prefix length tried next
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Last prefix length that reproduced the bug
    #[inline]
    pub fn last_found(&self) -> Option<usize> {
        self.last_found
    }

    /// Whether the interval is empty
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.left >= self.right
    }
}
