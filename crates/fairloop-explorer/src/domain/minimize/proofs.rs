//! Kani proofs for the binary-search cursor
//!
//! The cursor is pure integer arithmetic, so the harnesses cover every
//! interval up to a small bound.

#![cfg(kani)]

use super::bounds::SearchBounds;

// ============================================================================
// SearchBounds Proofs
// ============================================================================

/// The midpoint never leaves the interval
///
/// # Properties Verified
///
/// 1. `left <= current <= right` after construction
/// 2. The same holds after any single update
#[kani::proof]
fn proof_current_within_bounds() {
    let len: usize = kani::any();
    kani::assume(len <= 1024);
    let found: bool = kani::any();

    let mut bounds = SearchBounds::new(len);
    kani::assert(bounds.left() <= bounds.current(), "left <= current");
    kani::assert(bounds.current() <= bounds.right(), "current <= right");

    bounds.update(found);
    kani::assert(bounds.left() <= bounds.current(), "left <= current after update");
    kani::assert(bounds.current() <= bounds.right(), "current <= right after update");
}

/// Every non-converged update strictly shrinks the interval
#[kani::proof]
#[kani::unwind(2)]
fn proof_update_shrinks_interval() {
    let left: usize = kani::any();
    let right: usize = kani::any();
    kani::assume(left < right && right <= 1024);
    let found: bool = kani::any();

    let mut bounds = SearchBounds::new(0);
    bounds.set(left, right);
    let before = bounds.right() - bounds.left();
    bounds.update(found);
    let after = bounds.right() - bounds.left();

    kani::assert(after < before, "interval shrinks");
}

/// A reported bound is never above the upper bound
#[kani::proof]
fn proof_last_found_bounds_right() {
    let len: usize = kani::any();
    kani::assume(len > 0 && len <= 1024);

    let mut bounds = SearchBounds::new(len);
    bounds.update(true);

    match bounds.last_found() {
        Some(found) => kani::assert(bounds.right() <= found, "right <= last_found"),
        None => kani::assert(false, "bug was recorded"),
    }
}
