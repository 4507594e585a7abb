//! Linear algebra backend abstraction for GMLS.
//!
//! ## Purpose
//!
//! This module bridges the crate's generic `Float` code to nalgebra's dense
//! QR and SVD factorizations, and provides the SIMD dot-product kernel used
//! by the moment-matrix reduction.
//!
//! ## Design notes
//!
//! * **QR** (Householder): fast, requires full column rank. Rank is judged
//!   from the diagonal of R relative to its largest entry; a deficient
//!   system is reported, never solved.
//! * **SVD**: singular values below `rel_tol · σ_max` are zeroed, giving the
//!   minimum-norm least-squares solution. The numerical rank is returned.
//! * Generic over `FloatLinalg` types (f32 and f64) which delegate to nalgebra.
//!
//! ## Invariants
//!
//! * Matrices cross the bridge column-major.
//! * A returned solution is never produced from a system judged singular.

use core::fmt::Debug;
use num_traits::Float;

// ============================================================================
// Solver Selection
// ============================================================================

/// Dense factorization used for every local least-squares system.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenseSolverType {
    /// Householder QR; requires full column rank.
    #[default]
    QR,
    /// SVD pseudoinverse; tolerates rank deficiency.
    SVD,
}

/// Failure of a single dense solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankDeficiency {
    /// Numerical rank found.
    pub rank: usize,
}

/// Solution of `min ‖A X − B‖` for all columns of `B`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresSolution<T> {
    /// `cols × rhs_cols` solution, column-major.
    pub x: Vec<T>,
    /// Numerical rank of `A`.
    pub rank: usize,
}

// ============================================================================
// FloatLinalg Trait
// ============================================================================

/// Helper trait to bridge generic Float types to the nalgebra backend.
pub trait FloatLinalg: Float + Debug + Send + Sync + 'static {
    /// Solve `min ‖A X − B‖` with `A` (`rows × cols`) and `B`
    /// (`rows × rhs_cols`), both column-major.
    fn solve_least_squares(
        a: &[Self],
        rows: usize,
        cols: usize,
        b: &[Self],
        rhs_cols: usize,
        solver: DenseSolverType,
        rel_tol: Self,
    ) -> Result<LeastSquaresSolution<Self>, RankDeficiency>;

    /// Compute `Σ a_k w_k b_k`.
    fn weighted_dot(a: &[Self], b: &[Self], w: &[Self]) -> Self;
}

impl FloatLinalg for f64 {
    #[inline]
    fn solve_least_squares(
        a: &[Self],
        rows: usize,
        cols: usize,
        b: &[Self],
        rhs_cols: usize,
        solver: DenseSolverType,
        rel_tol: Self,
    ) -> Result<LeastSquaresSolution<Self>, RankDeficiency> {
        nalgebra_backend::least_squares(a, rows, cols, b, rhs_cols, solver, rel_tol)
    }

    #[inline]
    fn weighted_dot(a: &[Self], b: &[Self], w: &[Self]) -> Self {
        simd::weighted_dot_f64(a, b, w)
    }
}

impl FloatLinalg for f32 {
    #[inline]
    fn solve_least_squares(
        a: &[Self],
        rows: usize,
        cols: usize,
        b: &[Self],
        rhs_cols: usize,
        solver: DenseSolverType,
        rel_tol: Self,
    ) -> Result<LeastSquaresSolution<Self>, RankDeficiency> {
        nalgebra_backend::least_squares(a, rows, cols, b, rhs_cols, solver, rel_tol)
    }

    #[inline]
    fn weighted_dot(a: &[Self], b: &[Self], w: &[Self]) -> Self {
        simd::weighted_dot_f32(a, b, w)
    }
}

// ============================================================================
// SIMD Kernels
// ============================================================================

/// Lane-parallel dot products.
pub mod simd {
    use wide::{f32x4, f64x2};

    /// `Σ a_k w_k b_k` using f64x2 lanes.
    pub fn weighted_dot_f64(a: &[f64], b: &[f64], w: &[f64]) -> f64 {
        let n = a.len().min(b.len()).min(w.len());
        let mut acc = f64x2::splat(0.0);
        let mut i = 0;
        while i + 2 <= n {
            let va = f64x2::new([a[i], a[i + 1]]);
            let vb = f64x2::new([b[i], b[i + 1]]);
            let vw = f64x2::new([w[i], w[i + 1]]);
            acc += va * vw * vb;
            i += 2;
        }
        let mut sum = acc.reduce_add();
        for k in i..n {
            sum += a[k] * w[k] * b[k];
        }
        sum
    }

    /// `Σ a_k w_k b_k` using f32x4 lanes.
    pub fn weighted_dot_f32(a: &[f32], b: &[f32], w: &[f32]) -> f32 {
        let n = a.len().min(b.len()).min(w.len());
        let mut acc = f32x4::splat(0.0);
        let mut i = 0;
        while i + 4 <= n {
            let va = f32x4::new([a[i], a[i + 1], a[i + 2], a[i + 3]]);
            let vb = f32x4::new([b[i], b[i + 1], b[i + 2], b[i + 3]]);
            let vw = f32x4::new([w[i], w[i + 1], w[i + 2], w[i + 3]]);
            acc += va * vw * vb;
            i += 4;
        }
        let mut sum = acc.reduce_add();
        for k in i..n {
            sum += a[k] * w[k] * b[k];
        }
        sum
    }
}

// ============================================================================
// Nalgebra Backend Implementation
// ============================================================================

/// Nalgebra-based dense least-squares solves.
pub mod nalgebra_backend {
    use super::{DenseSolverType, LeastSquaresSolution, RankDeficiency};
    use nalgebra::{DMatrix, RealField};

    /// Solve `min ‖A X − B‖` with the requested factorization.
    pub fn least_squares<R: RealField + Copy>(
        a: &[R],
        rows: usize,
        cols: usize,
        b: &[R],
        rhs_cols: usize,
        solver: DenseSolverType,
        rel_tol: R,
    ) -> Result<LeastSquaresSolution<R>, RankDeficiency> {
        let a = DMatrix::from_column_slice(rows, cols, a);
        let b = DMatrix::from_column_slice(rows, rhs_cols, b);
        match solver {
            DenseSolverType::QR => qr_solve(a, &b, rel_tol),
            DenseSolverType::SVD => svd_solve(a, &b, rel_tol),
        }
    }

    fn qr_solve<R: RealField + Copy>(
        a: DMatrix<R>,
        b: &DMatrix<R>,
        rel_tol: R,
    ) -> Result<LeastSquaresSolution<R>, RankDeficiency> {
        let (rows, cols) = a.shape();
        if rows < cols {
            return Err(RankDeficiency { rank: rows });
        }

        let qr = a.qr();
        let r = qr.r();
        let diag_max = (0..cols)
            .map(|i| r[(i, i)].abs())
            .fold(nalgebra::zero::<R>(), |m, v| if v > m { v } else { m });
        let rank = (0..cols)
            .filter(|&i| r[(i, i)].abs() > rel_tol * diag_max)
            .count();
        if rank < cols {
            return Err(RankDeficiency { rank });
        }

        let qtb = qr.q().transpose() * b;
        let x = r
            .solve_upper_triangular(&qtb)
            .ok_or(RankDeficiency { rank })?;
        Ok(LeastSquaresSolution {
            x: x.as_slice().to_vec(),
            rank,
        })
    }

    fn svd_solve<R: RealField + Copy>(
        a: DMatrix<R>,
        b: &DMatrix<R>,
        rel_tol: R,
    ) -> Result<LeastSquaresSolution<R>, RankDeficiency> {
        let svd = a.svd(true, true);
        let sigma_max = svd
            .singular_values
            .iter()
            .fold(nalgebra::zero::<R>(), |m, &v| if v > m { v } else { m });
        let eps = rel_tol * sigma_max;
        let rank = svd.singular_values.iter().filter(|&&s| s > eps).count();
        if rank == 0 {
            return Err(RankDeficiency { rank });
        }

        let x = svd.solve(b, eps).map_err(|_| RankDeficiency { rank })?;
        Ok(LeastSquaresSolution {
            x: x.as_slice().to_vec(),
            rank,
        })
    }
}
