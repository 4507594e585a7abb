//! Scratch memory for per-target GMLS work.
//!
//! ## Purpose
//!
//! This module provides the reusable storage primitives behind the
//! per-worker workspaces: growable [`Slot`] vectors and the per-lane partial
//! sums of the moment-matrix reduction.
//!
//! ## Design notes
//!
//! * **Lazy expansion**: Slots grow on demand and never shrink, stabilizing
//!   at the size of the largest neighborhood seen.
//! * **Team scratch**: [`TeamScratch`] holds one partial sum per lane. Lanes
//!   write only their own slot; a single commit step reads all slots.
//!
//! ## Invariants
//!
//! * Buffers are only logically cleared between targets.
//! * `TeamScratch::partials.len() == team_size`.
//!
//! ## Non-goals
//!
//! * Thread-local automatic caching (workspaces are created by `map_init`).

use core::ops::{Deref, DerefMut};
use num_traits::Float;

// ============================================================================
// Slot
// ============================================================================

/// Growable scratch vector reused across targets.
#[derive(Debug, Clone)]
pub struct Slot<T>(Vec<T>);

impl<T> Slot<T> {
    /// Empty slot pre-sized for the largest expected neighborhood.
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }
}

impl<T: Copy> Slot<T> {
    /// Clear the slot and refill it with `len` copies of `value`.
    #[inline]
    pub fn reset(&mut self, len: usize, value: T) {
        self.0.clear();
        self.0.resize(len, value);
    }
}

impl<T> Deref for Slot<T> {
    type Target = Vec<T>;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Slot<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// ============================================================================
// Team Scratch
// ============================================================================

/// Per-lane partial sums of one moment-matrix reduction.
#[derive(Debug, Clone)]
pub struct TeamScratch<T> {
    /// One partial sum per lane.
    pub partials: Vec<T>,
}

impl<T: Float> TeamScratch<T> {
    /// Create scratch for `team_size` lanes.
    pub fn new(team_size: usize) -> Self {
        Self {
            partials: vec![T::zero(); team_size.max(1)],
        }
    }

    /// Number of lanes.
    #[inline]
    pub fn team_size(&self) -> usize {
        self.partials.len()
    }

    /// Sum the lane partials in lane order and zero them for the next entry.
    #[inline]
    pub fn commit(&mut self) -> T {
        let mut total = T::zero();
        for p in self.partials.iter_mut() {
            total = total + *p;
            *p = T::zero();
        }
        total
    }
}
