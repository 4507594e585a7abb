//! Workspace for reusable per-target GMLS buffers.
//!
//! This module provides a pre-allocated workspace so that assembling one
//! target's local systems does not allocate transient scratch. Each rayon
//! worker receives its own workspace through `map_init`.

use num_traits::Float;

use crate::primitives::buffer::{Slot, TeamScratch};

/// Pre-allocated buffers for processing one target at a time.
#[derive(Debug, Clone)]
pub struct GmlsWorkspace<T> {
    /// Ambient neighbor offsets from the target (row-major).
    pub offsets: Slot<T>,
    /// Offsets in tangent coordinates (row-major, manifold only).
    pub local: Slot<T>,
    /// Kernel weights per neighbor.
    pub weights: Slot<T>,
    /// Basis values at one evaluation point.
    pub basis_row: Slot<T>,
    /// Operator image on the basis.
    pub image: Slot<T>,
    /// Column-major design matrix handed to the moment assembler.
    pub columns: Slot<T>,
    /// Small moment matrix (row-major).
    pub moment: Slot<T>,
    /// Partial sums for the moment-matrix reduction.
    pub team: TeamScratch<T>,
}

impl<T: Float> GmlsWorkspace<T> {
    /// Create a workspace with capacities matching the expected problem.
    ///
    /// - `max_neighbors`: longest neighbor list.
    /// - `dims`: ambient dimension.
    /// - `basis_size`: number of basis functions.
    /// - `team_size`: reduction lanes.
    pub fn new(max_neighbors: usize, dims: usize, basis_size: usize, team_size: usize) -> Self {
        Self {
            offsets: Slot::new(max_neighbors * dims),
            local: Slot::new(max_neighbors * dims),
            weights: Slot::new(max_neighbors),
            basis_row: Slot::new(basis_size),
            image: Slot::new(basis_size),
            columns: Slot::new(max_neighbors * dims),
            moment: Slot::new(dims * dims),
            team: TeamScratch::new(team_size),
        }
    }
}
