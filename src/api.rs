//! High-level API for GMLS stencil generation.
//!
//! ## Purpose
//!
//! This module provides the user-facing entry point: a fluent builder that
//! collects the reconstruction, geometry and solver settings, and the model
//! it builds, which generates alpha tables for concrete point sets.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with defaults for everything except the
//!   dimension and the operator list.
//! * **Validated**: Every parameter is validated when `.build()` is called;
//!   geometric inputs are validated on each generation call.
//! * **Type-Safe**: Generic over `Float` types (`f32`, `f64`).
//!
//! ### Configuration Flow
//!
//! 1. Create a [`GmlsBuilder`] via `Gmls::new()` (prelude).
//! 2. Chain configuration methods (`.dimensions()`, `.degree()`, ...).
//! 3. Call `.build()` to get a [`GmlsModel`].
//! 4. Call [`GmlsModel::generate_alphas`] per point configuration, then
//!    [`AlphaTable::apply`] per data set.

use crate::engine::executor::GmlsExecutor;
use crate::engine::solver::verify_thread_safety_cached;
use crate::engine::validator::Validator;
use crate::math::linalg::FloatLinalg;

// Publicly re-exported types
pub use crate::algorithms::basis::ReconstructionSpace;
pub use crate::algorithms::operators::TargetOperation;
pub use crate::engine::alphas::AlphaTable;
pub use crate::engine::executor::GmlsConfig;
pub use crate::engine::output::OperatorEstimate;
pub use crate::engine::solver::SolverSettings;
pub use crate::math::eigen::{EigenSettings, TangentFrame};
pub use crate::math::kernel::WeightingFunction;
pub use crate::math::linalg::DenseSolverType;
pub use crate::primitives::errors::{GmlsError, TargetError};
pub use crate::primitives::neighbors::{NeighborLists, PointCloud};

/// Default polynomial degree of the reconstruction.
pub const DEFAULT_DEGREE: usize = 2;

/// Default polynomial degree of the manifold height fit.
pub const DEFAULT_CURVATURE_DEGREE: usize = 2;

/// Default number of reduction lanes.
pub const DEFAULT_TEAM_SIZE: usize = 4;

/// Number of basis functions of a scalar polynomial space of total degree
/// `degree` in `dimensions` variables.
///
/// A target needs at least this many neighbors for a scalar fit.
pub fn unisolvency_size(degree: usize, dimensions: usize) -> usize {
    crate::math::polynomial::unisolvency_size(degree, dimensions)
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for GMLS configuration.
#[derive(Debug, Clone)]
pub struct GmlsBuilder<T: FloatLinalg> {
    /// Polynomial degree of the reconstruction.
    pub degree: Option<usize>,

    /// Ambient dimension (1, 2 or 3).
    pub dimensions: Option<usize>,

    /// Reconstruction space.
    pub reconstruction_space: Option<ReconstructionSpace>,

    /// Targets lie on a manifold of codimension one.
    pub manifold: Option<bool>,

    /// Polynomial degree of the manifold height fit.
    pub curvature_degree: Option<usize>,

    /// Kernel of the reconstruction fit.
    pub weighting_function: Option<WeightingFunction>,

    /// Kernel of the tangent and curvature estimation.
    pub curvature_weighting_function: Option<WeightingFunction>,

    /// Dense factorization.
    pub solver: Option<DenseSolverType>,

    /// Retry rank-deficient QR systems with SVD.
    pub svd_fallback: Option<bool>,

    /// Relative rank tolerance of the dense solve.
    pub svd_relative_tolerance: Option<T>,

    /// Power iteration tolerance.
    pub eigen_tolerance: Option<T>,

    /// Power iteration bound.
    pub eigen_max_iterations: Option<usize>,

    /// Lanes of the moment-matrix reduction.
    pub team_size: Option<usize>,

    /// Longest accepted neighbor list.
    pub max_neighbors: Option<usize>,

    /// Operators to generate.
    pub operators: Option<Vec<TargetOperation>>,

    /// Run the dense-solver self-test before the first generation.
    pub verify_thread_safety: Option<bool>,

    /// Parallel execution hint.
    #[doc(hidden)]
    pub parallel: Option<bool>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl<T: FloatLinalg> Default for GmlsBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatLinalg> GmlsBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            degree: None,
            dimensions: None,
            reconstruction_space: None,
            manifold: None,
            curvature_degree: None,
            weighting_function: None,
            curvature_weighting_function: None,
            solver: None,
            svd_fallback: None,
            svd_relative_tolerance: None,
            eigen_tolerance: None,
            eigen_max_iterations: None,
            team_size: None,
            max_neighbors: None,
            operators: None,
            verify_thread_safety: None,
            parallel: None,
            duplicate_param: None,
        }
    }

    /// Set the polynomial degree of the reconstruction.
    pub fn degree(mut self, degree: usize) -> Self {
        if self.degree.is_some() {
            self.duplicate_param = Some("degree");
        }
        self.degree = Some(degree);
        self
    }

    /// Set the ambient dimension.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        if self.dimensions.is_some() {
            self.duplicate_param = Some("dimensions");
        }
        self.dimensions = Some(dimensions);
        self
    }

    /// Set the reconstruction space.
    pub fn reconstruction_space(mut self, space: ReconstructionSpace) -> Self {
        if self.reconstruction_space.is_some() {
            self.duplicate_param = Some("reconstruction_space");
        }
        self.reconstruction_space = Some(space);
        self
    }

    /// Treat targets as lying on a manifold of codimension one.
    pub fn manifold(mut self) -> Self {
        if self.manifold.is_some() {
            self.duplicate_param = Some("manifold");
        }
        self.manifold = Some(true);
        self
    }

    /// Set the polynomial degree of the manifold height fit.
    pub fn curvature_degree(mut self, degree: usize) -> Self {
        if self.curvature_degree.is_some() {
            self.duplicate_param = Some("curvature_degree");
        }
        self.curvature_degree = Some(degree);
        self
    }

    /// Set the kernel of the reconstruction fit.
    pub fn weighting_function(mut self, wf: WeightingFunction) -> Self {
        if self.weighting_function.is_some() {
            self.duplicate_param = Some("weighting_function");
        }
        self.weighting_function = Some(wf);
        self
    }

    /// Set the kernel of the tangent and curvature estimation.
    pub fn curvature_weighting_function(mut self, wf: WeightingFunction) -> Self {
        if self.curvature_weighting_function.is_some() {
            self.duplicate_param = Some("curvature_weighting_function");
        }
        self.curvature_weighting_function = Some(wf);
        self
    }

    /// Set the dense factorization.
    pub fn solver(mut self, solver: DenseSolverType) -> Self {
        if self.solver.is_some() {
            self.duplicate_param = Some("solver");
        }
        self.solver = Some(solver);
        self
    }

    /// Retry rank-deficient QR systems with SVD.
    pub fn svd_fallback(mut self, enabled: bool) -> Self {
        if self.svd_fallback.is_some() {
            self.duplicate_param = Some("svd_fallback");
        }
        self.svd_fallback = Some(enabled);
        self
    }

    /// Set the relative rank tolerance of the dense solve.
    pub fn svd_relative_tolerance(mut self, tol: T) -> Self {
        if self.svd_relative_tolerance.is_some() {
            self.duplicate_param = Some("svd_relative_tolerance");
        }
        self.svd_relative_tolerance = Some(tol);
        self
    }

    /// Set the power iteration tolerance.
    pub fn eigen_tolerance(mut self, tol: T) -> Self {
        if self.eigen_tolerance.is_some() {
            self.duplicate_param = Some("eigen_tolerance");
        }
        self.eigen_tolerance = Some(tol);
        self
    }

    /// Set the power iteration bound.
    pub fn eigen_max_iterations(mut self, iterations: usize) -> Self {
        if self.eigen_max_iterations.is_some() {
            self.duplicate_param = Some("eigen_max_iterations");
        }
        self.eigen_max_iterations = Some(iterations);
        self
    }

    /// Set the number of lanes of the moment-matrix reduction.
    pub fn team_size(mut self, size: usize) -> Self {
        if self.team_size.is_some() {
            self.duplicate_param = Some("team_size");
        }
        self.team_size = Some(size);
        self
    }

    /// Reject neighbor lists longer than `max`.
    pub fn max_neighbors(mut self, max: usize) -> Self {
        if self.max_neighbors.is_some() {
            self.duplicate_param = Some("max_neighbors");
        }
        self.max_neighbors = Some(max);
        self
    }

    /// Set the operators to generate.
    pub fn operators(mut self, operators: &[TargetOperation]) -> Self {
        if self.operators.is_some() {
            self.duplicate_param = Some("operators");
        }
        self.operators = Some(operators.to_vec());
        self
    }

    /// Enable or disable the dense-solver self-test.
    pub fn verify_thread_safety(mut self, enabled: bool) -> Self {
        if self.verify_thread_safety.is_some() {
            self.duplicate_param = Some("verify_thread_safety");
        }
        self.verify_thread_safety = Some(enabled);
        self
    }

    /// Set parallel execution mode.
    pub fn parallel(mut self, parallel: bool) -> Self {
        if self.parallel.is_some() {
            self.duplicate_param = Some("parallel");
        }
        self.parallel = Some(parallel);
        self
    }

    /// Validate the configuration and build the model.
    pub fn build(self) -> Result<GmlsModel<T>, GmlsError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;

        let dimensions = self
            .dimensions
            .ok_or(GmlsError::MissingInput("dimensions"))?;
        let manifold = self.manifold.unwrap_or(false);
        Validator::validate_dimensions(dimensions, manifold)?;

        let degree = self.degree.unwrap_or(DEFAULT_DEGREE);
        Validator::validate_degree(degree)?;
        let curvature_degree = self.curvature_degree.unwrap_or(DEFAULT_CURVATURE_DEGREE);
        Validator::validate_degree(curvature_degree)?;

        let space = self.reconstruction_space.unwrap_or_default();
        Validator::validate_space(space, dimensions, manifold)?;

        let mut solver = SolverSettings::default();
        solver.solver = self.solver.unwrap_or_default();
        solver.svd_fallback = self.svd_fallback.unwrap_or(false);
        if let Some(tol) = self.svd_relative_tolerance {
            Validator::validate_tolerance(tol)?;
            solver.relative_tolerance = tol;
        }

        let mut eigen = EigenSettings::default();
        if let Some(tol) = self.eigen_tolerance {
            Validator::validate_tolerance(tol)?;
            eigen.tolerance = tol;
        }
        if let Some(iterations) = self.eigen_max_iterations {
            Validator::validate_iterations(iterations)?;
            eigen.max_iterations = iterations;
        }

        let team_size = self.team_size.unwrap_or(DEFAULT_TEAM_SIZE);
        Validator::validate_team_size(team_size)?;

        let mut operations: Vec<TargetOperation> = Vec::new();
        for op in self.operators.unwrap_or_default() {
            if !operations.contains(&op) {
                operations.push(op);
            }
        }
        Validator::validate_operations(&operations, space, degree, dimensions, manifold)?;

        if self.verify_thread_safety.unwrap_or(true) {
            verify_thread_safety_cached()?;
        }

        Ok(GmlsModel {
            config: GmlsConfig {
                degree,
                dimensions,
                space,
                manifold,
                curvature_degree,
                weighting: self.weighting_function.unwrap_or_default(),
                curvature_weighting: self.curvature_weighting_function.unwrap_or_default(),
                solver,
                eigen,
                team_size,
                parallel: self.parallel.unwrap_or(true),
                max_neighbors: self.max_neighbors,
                operations,
            },
        })
    }
}

// ============================================================================
// Model
// ============================================================================

/// A validated GMLS configuration, ready to generate stencils.
#[derive(Debug, Clone, PartialEq)]
pub struct GmlsModel<T> {
    config: GmlsConfig<T>,
}

impl<T: FloatLinalg> GmlsModel<T> {
    /// Resolved configuration.
    #[inline]
    pub fn config(&self) -> &GmlsConfig<T> {
        &self.config
    }

    /// Operators this model generates.
    #[inline]
    pub fn operations(&self) -> &[TargetOperation] {
        &self.config.operations
    }

    /// Number of basis functions of the reconstruction.
    pub fn basis_size(&self) -> usize {
        crate::algorithms::basis::PolynomialBasis::new(
            self.config.space,
            self.config.degree,
            self.config.variables(),
        )
        .size()
    }

    /// Fewest neighbors a target needs for its fit.
    pub fn min_neighbors(&self) -> usize {
        let basis = crate::algorithms::basis::PolynomialBasis::new(
            self.config.space,
            self.config.degree,
            self.config.variables(),
        );
        if self.config.manifold {
            basis.min_neighbors().max(unisolvency_size(
                self.config.curvature_degree,
                self.config.variables(),
            ))
        } else {
            basis.min_neighbors()
        }
    }

    fn validate_inputs(
        &self,
        sources: &PointCloud<T>,
        targets: &PointCloud<T>,
        neighbors: &NeighborLists,
        windows: &[T],
    ) -> Result<(), GmlsError> {
        let d = self.config.dimensions;
        Validator::validate_points(sources, d, "sources")?;
        Validator::validate_points(targets, d, "targets")?;
        Validator::validate_neighbors(
            neighbors,
            sources.len(),
            targets.len(),
            self.config.max_neighbors,
        )?;
        Validator::validate_windows(windows, targets.len())
    }

    /// Generate the stencils of every configured operator at every target.
    ///
    /// Per-target numerical failures do not fail the call; they are
    /// recorded in the returned table.
    pub fn generate_alphas(
        &self,
        sources: &PointCloud<T>,
        targets: &PointCloud<T>,
        neighbors: &NeighborLists,
        windows: &[T],
    ) -> Result<AlphaTable<T>, GmlsError> {
        self.validate_inputs(sources, targets, neighbors, windows)?;
        let executor = GmlsExecutor::new(&self.config, sources, targets, neighbors, windows);
        Ok(executor.generate())
    }

    /// Recompute the tangent frame of one target for inspection.
    pub fn tangent_frame(
        &self,
        sources: &PointCloud<T>,
        targets: &PointCloud<T>,
        neighbors: &NeighborLists,
        windows: &[T],
        target: usize,
    ) -> Result<TangentFrame<T>, GmlsError> {
        Validator::validate_dimensions(self.config.dimensions, true)?;
        self.validate_inputs(sources, targets, neighbors, windows)?;
        if target >= targets.len() {
            return Err(GmlsError::InvalidTarget {
                target,
                n_targets: targets.len(),
            });
        }
        let executor = GmlsExecutor::new(&self.config, sources, targets, neighbors, windows);
        let mut workspace = executor.workspace();
        executor
            .tangent_frame(target, &mut workspace)
            .map_err(|error| GmlsError::TargetFailed { target, error })
    }
}
