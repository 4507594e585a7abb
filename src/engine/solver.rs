//! Batched dense least-squares solves.
//!
//! ## Purpose
//!
//! This module solves the independent local systems of every target in one
//! batch call, and verifies once per process that the dense solve backend
//! gives correct answers when invoked concurrently.
//!
//! ## Design notes
//!
//! * **One parallel-for**: Systems share nothing, so the batch is a single
//!   rayon `par_iter` (or a plain loop when parallelism is off).
//! * **Explicit policy**: The factorization is chosen per configuration.
//!   QR reports rank deficiency; SVD returns the minimum-norm solution. With
//!   `svd_fallback` a QR failure is retried with SVD.
//! * **Diagonal right-hand sides**: GMLS systems solve `A X = diag(√w)`.
//!   The diagonal is stored compactly and expanded only inside the worker.
//!
//! ## Invariants
//!
//! * The output has one entry per input system, in input order.
//! * A system whose input is already a failure stays that failure.

use std::sync::OnceLock;

use log::{debug, error};
use rayon::prelude::*;

use crate::math::linalg::{DenseSolverType, FloatLinalg};
use crate::primitives::errors::{GmlsError, TargetError};

/// Number of concurrent copies in the thread-safety self-test.
pub const SELF_TEST_COPIES: usize = 20;

/// Factorization policy of the batched solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings<T> {
    /// Primary factorization.
    pub solver: DenseSolverType,
    /// Retry rank-deficient QR systems with SVD.
    pub svd_fallback: bool,
    /// Singular values (or `|R_ii|`) below this fraction of the largest are
    /// treated as zero.
    pub relative_tolerance: T,
}

/// Multiple of machine epsilon below which a relative pivot counts as zero.
pub const RANK_EPSILON_FACTOR: f64 = 100.0;

/// Default relative rank cut-off: 1e-12, raised to `100 ε` for types whose
/// epsilon makes 1e-12 unreachable.
pub fn default_relative_tolerance<T: FloatLinalg>() -> T {
    let floor: T = crate::math::constant(1e-12);
    let scaled: T = T::epsilon() * crate::math::constant(RANK_EPSILON_FACTOR);
    floor.max(scaled)
}

impl<T: FloatLinalg> Default for SolverSettings<T> {
    fn default() -> Self {
        Self {
            solver: DenseSolverType::QR,
            svd_fallback: false,
            relative_tolerance: default_relative_tolerance(),
        }
    }
}

/// Right-hand side of a local system.
#[derive(Debug, Clone, PartialEq)]
pub enum RightHandSide<T> {
    /// Dense `rows × cols` matrix, column-major.
    Dense {
        /// Entries.
        values: Vec<T>,
        /// Number of columns.
        cols: usize,
    },
    /// Square diagonal matrix given by its diagonal.
    Diagonal(Vec<T>),
}

impl<T: FloatLinalg> RightHandSide<T> {
    /// Number of right-hand-side columns.
    #[inline]
    pub fn cols(&self) -> usize {
        match self {
            Self::Dense { cols, .. } => *cols,
            Self::Diagonal(d) => d.len(),
        }
    }

    fn to_dense(&self, rows: usize) -> Vec<T> {
        match self {
            Self::Dense { values, .. } => values.clone(),
            Self::Diagonal(d) => {
                let mut out = vec![T::zero(); rows * d.len()];
                for (i, &v) in d.iter().enumerate() {
                    out[i * rows + i] = v;
                }
                out
            }
        }
    }
}

/// One local least-squares problem `min ‖A X − B‖`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresSystem<T> {
    /// Design matrix `A`, column-major.
    pub design: Vec<T>,
    /// Rows of `A`.
    pub rows: usize,
    /// Columns of `A`.
    pub cols: usize,
    /// Right-hand side `B`.
    pub rhs: RightHandSide<T>,
}

/// Solution of one local system.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedSystem<T> {
    /// `X`, `cols × rhs_cols`, column-major.
    pub coefficients: Vec<T>,
    /// Rows of `X` (columns of `A`).
    pub cols: usize,
    /// Numerical rank of `A`.
    pub rank: usize,
}

impl<T: Copy> SolvedSystem<T> {
    /// Entry `X(m, r)`.
    #[inline]
    pub fn get(&self, m: usize, r: usize) -> T {
        self.coefficients[r * self.cols + m]
    }
}

// ============================================================================
// Batched Solver
// ============================================================================

/// Solves many independent local systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchedSolver<T> {
    settings: SolverSettings<T>,
    parallel: bool,
}

impl<T: FloatLinalg> BatchedSolver<T> {
    /// Create a solver with the given policy.
    pub fn new(settings: SolverSettings<T>, parallel: bool) -> Self {
        Self { settings, parallel }
    }

    /// Policy in use.
    #[inline]
    pub fn settings(&self) -> &SolverSettings<T> {
        &self.settings
    }

    /// Solve a single system.
    pub fn solve(&self, system: &LeastSquaresSystem<T>) -> Result<SolvedSystem<T>, TargetError> {
        let b = system.rhs.to_dense(system.rows);
        let rhs_cols = system.rhs.cols();
        let attempt = |solver| {
            T::solve_least_squares(
                &system.design,
                system.rows,
                system.cols,
                &b,
                rhs_cols,
                solver,
                self.settings.relative_tolerance,
            )
        };

        let result = match attempt(self.settings.solver) {
            Err(_)
                if self.settings.solver == DenseSolverType::QR && self.settings.svd_fallback =>
            {
                attempt(DenseSolverType::SVD)
            }
            other => other,
        };

        result
            .map(|s| SolvedSystem {
                coefficients: s.x,
                cols: system.cols,
                rank: s.rank,
            })
            .map_err(|e| TargetError::SingularSystem {
                rank: e.rank,
                columns: system.cols,
            })
    }

    /// Solve every system of the batch.
    pub fn solve_batch(
        &self,
        systems: &[Result<LeastSquaresSystem<T>, TargetError>],
    ) -> Vec<Result<SolvedSystem<T>, TargetError>> {
        let one = |s: &Result<LeastSquaresSystem<T>, TargetError>| match s {
            Ok(system) => self.solve(system),
            Err(e) => Err(*e),
        };
        if self.parallel {
            systems.par_iter().map(one).collect()
        } else {
            systems.iter().map(one).collect()
        }
    }
}

// ============================================================================
// Thread-safety Self-test
// ============================================================================

/// Solve [`SELF_TEST_COPIES`] copies of a rank-one system concurrently and
/// check every copy against its known minimum-norm solution.
///
/// Each copy is `A = 1` (100 × 50) with `B = 1` (100 × 100); the
/// minimum-norm solution has every entry equal to `1/50`. The diagonal of
/// every solution is checked to within `1e-10`.
pub fn verify_thread_safety() -> Result<(), GmlsError> {
    let (rows, cols) = (100, 50);
    let system = LeastSquaresSystem {
        design: vec![1.0f64; rows * cols],
        rows,
        cols,
        rhs: RightHandSide::Dense {
            values: vec![1.0; rows * rows],
            cols: rows,
        },
    };
    let systems = vec![Ok(system); SELF_TEST_COPIES];
    let settings = SolverSettings {
        solver: DenseSolverType::SVD,
        svd_fallback: false,
        relative_tolerance: 1e-12,
    };
    let results = BatchedSolver::new(settings, true).solve_batch(&systems);

    let expected = 1.0 / cols as f64;
    let wrong_entries: usize = results
        .iter()
        .map(|r| match r {
            Ok(solved) => (0..cols)
                .filter(|&j| (solved.get(j, j) - expected).abs() > 1e-10)
                .count(),
            Err(_) => cols,
        })
        .sum();

    if wrong_entries > 0 {
        error!(
            "dense solver self-test failed: {wrong_entries} wrong entries across {SELF_TEST_COPIES} concurrent solves"
        );
        return Err(GmlsError::ThreadSafetyViolation { wrong_entries });
    }
    debug!("dense solver self-test passed ({SELF_TEST_COPIES} concurrent solves)");
    Ok(())
}

/// [`verify_thread_safety`], run at most once per process.
pub fn verify_thread_safety_cached() -> Result<(), GmlsError> {
    static RESULT: OnceLock<Result<(), GmlsError>> = OnceLock::new();
    RESULT.get_or_init(verify_thread_safety).clone()
}
