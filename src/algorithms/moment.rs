//! Moment-matrix assembly `M = PᵀWP`.
//!
//! ## Purpose
//!
//! This module assembles the symmetric weighted moment matrix of a design
//! matrix `P` (`rows × cols`, column-major) with row weights `W`. In
//! manifold mode it produces the covariance of raw neighbor offsets from
//! which the tangent frame is extracted.
//!
//! ## Design notes
//!
//! * **Team reduction**: The rows are split into `team_size` contiguous
//!   lanes. Each lane reduces its slice of `Σ_k P(k,i) W_k P(k,j)` into its
//!   own slot of [`TeamScratch`] with the SIMD `weighted_dot` kernel.
//! * **Single commit**: After all lanes finish (a join), one step sums the
//!   lane partials in lane order and writes both `M(i,j)` and `M(j,i)`.
//!   The scratch is zeroed by the commit before the next entry reuses it.
//! * **Diagonal first**: Diagonal entries are reduced in their own pass.
//! * **Parallel lanes**: Lanes run on the rayon pool only for long row
//!   ranges; short ones run in lane order on the calling thread.
//!
//! ## Invariants
//!
//! * The result is exactly symmetric.
//! * Lane order is fixed, so results are deterministic for a given team size.

use rayon::prelude::*;

use crate::math::linalg::FloatLinalg;
use crate::primitives::buffer::TeamScratch;

/// Row count from which lanes are reduced on the rayon pool.
pub const PARALLEL_LANE_ROWS: usize = 1 << 12;

/// Assembles `PᵀWP` with a team of reduction lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MomentAssembler {
    team_size: usize,
}

impl MomentAssembler {
    /// Create an assembler with `team_size` lanes (at least one).
    pub fn new(team_size: usize) -> Self {
        Self {
            team_size: team_size.max(1),
        }
    }

    /// Number of lanes.
    #[inline]
    pub fn team_size(&self) -> usize {
        self.team_size
    }

    /// Assemble `out = PᵀWP` (`cols × cols`, row-major).
    pub fn assemble<T: FloatLinalg>(
        &self,
        p: &[T],
        rows: usize,
        cols: usize,
        weights: &[T],
        scratch: &mut TeamScratch<T>,
        out: &mut [T],
    ) {
        if scratch.team_size() != self.team_size {
            *scratch = TeamScratch::new(self.team_size);
        }
        let column = |i: usize| &p[i * rows..(i + 1) * rows];

        for i in 0..cols {
            self.reduce(column(i), column(i), weights, scratch);
            out[i * cols + i] = scratch.commit();
        }
        for i in 0..cols {
            for j in (i + 1)..cols {
                self.reduce(column(i), column(j), weights, scratch);
                let v = scratch.commit();
                out[i * cols + j] = v;
                out[j * cols + i] = v;
            }
        }
    }

    fn reduce<T: FloatLinalg>(&self, a: &[T], b: &[T], w: &[T], scratch: &mut TeamScratch<T>) {
        let rows = a.len();
        let chunk = rows.div_ceil(self.team_size).max(1);
        let lane = |l: usize| {
            let start = (l * chunk).min(rows);
            let end = ((l + 1) * chunk).min(rows);
            T::weighted_dot(&a[start..end], &b[start..end], &w[start..end])
        };

        if rows >= PARALLEL_LANE_ROWS && self.team_size > 1 {
            scratch
                .partials
                .par_iter_mut()
                .enumerate()
                .for_each(|(l, slot)| *slot = lane(l));
        } else {
            for (l, slot) in scratch.partials.iter_mut().enumerate() {
                *slot = lane(l);
            }
        }
    }
}
