//! Execution engine for GMLS stencil generation.
//!
//! ## Purpose
//!
//! This module orchestrates one generation pass: it turns source and target
//! coordinates, neighbor lists and window sizes into an [`AlphaTable`].
//!
//! ## Design notes
//!
//! * **Phased batches**: Every phase is a data-parallel map over targets
//!   followed, where needed, by one batched solve:
//!   1. (manifold) tangent frame and curvature system per target,
//!   2. (manifold) batched curvature solve, then local geometry,
//!   3. reconstruction system per target,
//!   4. batched reconstruction solve,
//!   5. alphas per target and operator.
//! * **Per-thread workspaces**: Each rayon worker gets its own
//!   [`GmlsWorkspace`] through `map_init`.
//! * **Failure isolation**: Every per-target step returns
//!   `Result<_, TargetError>`; a failure is carried through the remaining
//!   phases untouched and never affects other targets.
//!
//! ## Key concepts
//!
//! * **Weighted system**: With `A = diag(√w) P` the solve `A X = diag(√w)`
//!   yields `X`, the map from neighbor values to basis coefficients.
//! * **Alphas**: For an operator image `b` on the basis, the stencil entry
//!   of neighbor `k` and input component `j` is `Σ_m b_m X(m, row(k, j))`.
//!
//! ## Invariants
//!
//! * Inputs have been validated (see `validator`).
//! * Offsets are scaled by the target's window before basis evaluation.
//!
//! ## Non-goals
//!
//! * This module does not search for neighbors.
//! * This module does not validate inputs.

use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::algorithms::basis::{PolynomialBasis, ReconstructionSpace};
use crate::algorithms::manifold::ManifoldGeometry;
use crate::algorithms::moment::MomentAssembler;
use crate::algorithms::operators::{TargetOperation, basis_image};
use crate::engine::alphas::{AlphaTable, TargetAlphas};
use crate::engine::solver::{
    BatchedSolver, LeastSquaresSystem, RightHandSide, SolvedSystem, SolverSettings,
};
use crate::engine::workspace::GmlsWorkspace;
use crate::math::eigen::{self, EigenSettings, TangentFrame};
use crate::math::kernel::WeightingFunction;
use crate::math::linalg::FloatLinalg;
use crate::primitives::errors::TargetError;
use crate::primitives::neighbors::{NeighborLists, PointCloud};

// ============================================================================
// Configuration
// ============================================================================

/// Resolved configuration of a GMLS pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GmlsConfig<T> {
    /// Polynomial degree of the reconstruction.
    pub degree: usize,
    /// Ambient dimension.
    pub dimensions: usize,
    /// Reconstruction space.
    pub space: ReconstructionSpace,
    /// Whether targets lie on a manifold of codimension one.
    pub manifold: bool,
    /// Polynomial degree of the manifold height fit.
    pub curvature_degree: usize,
    /// Kernel of the reconstruction fit.
    pub weighting: WeightingFunction,
    /// Kernel of the tangent and curvature estimation.
    pub curvature_weighting: WeightingFunction,
    /// Dense solve policy.
    pub solver: SolverSettings<T>,
    /// Power iteration controls.
    pub eigen: EigenSettings<T>,
    /// Lanes of the moment-matrix reduction.
    pub team_size: usize,
    /// Run phases on the rayon pool.
    pub parallel: bool,
    /// Longest accepted neighbor list.
    pub max_neighbors: Option<usize>,
    /// Operators to generate.
    pub operations: Vec<TargetOperation>,
}

impl<T> GmlsConfig<T> {
    /// Number of polynomial variables (intrinsic dimension on a manifold).
    #[inline]
    pub fn variables(&self) -> usize {
        if self.manifold {
            self.dimensions - 1
        } else {
            self.dimensions
        }
    }
}

// ============================================================================
// Executor
// ============================================================================

// Output of the first manifold phase for one target.
struct CurvatureSetup<T> {
    frame: TangentFrame<T>,
    heights: Vec<T>,
}

/// One generation pass over a fixed set of inputs.
pub struct GmlsExecutor<'a, T: FloatLinalg> {
    config: &'a GmlsConfig<T>,
    sources: &'a PointCloud<T>,
    targets: &'a PointCloud<T>,
    neighbors: &'a NeighborLists,
    windows: &'a [T],
    basis: PolynomialBasis,
    curvature_basis: PolynomialBasis,
    solver: BatchedSolver<T>,
    assembler: MomentAssembler,
}

impl<'a, T: FloatLinalg> GmlsExecutor<'a, T> {
    /// Prepare a pass. Inputs must already be validated.
    pub fn new(
        config: &'a GmlsConfig<T>,
        sources: &'a PointCloud<T>,
        targets: &'a PointCloud<T>,
        neighbors: &'a NeighborLists,
        windows: &'a [T],
    ) -> Self {
        let basis = PolynomialBasis::new(config.space, config.degree, config.variables());
        let curvature_basis = PolynomialBasis::scalar(config.curvature_degree, config.variables());
        Self {
            config,
            sources,
            targets,
            neighbors,
            windows,
            basis,
            curvature_basis,
            solver: BatchedSolver::new(config.solver, config.parallel),
            assembler: MomentAssembler::new(config.team_size),
        }
    }

    /// Reconstruction basis of this pass.
    #[inline]
    pub fn basis(&self) -> &PolynomialBasis {
        &self.basis
    }

    /// Fewest neighbors a target needs.
    pub fn required_neighbors(&self) -> usize {
        if self.config.manifold {
            self.basis
                .min_neighbors()
                .max(self.curvature_basis.min_neighbors())
        } else {
            self.basis.min_neighbors()
        }
    }

    /// A workspace sized for this pass.
    pub fn workspace(&self) -> GmlsWorkspace<T> {
        GmlsWorkspace::new(
            self.neighbors.max_neighbors(),
            self.config.dimensions,
            self.basis.size().max(self.curvature_basis.size()),
            self.config.team_size,
        )
    }

    fn map_targets<R, F>(&self, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize, &mut GmlsWorkspace<T>) -> R + Sync + Send,
    {
        let n = self.targets.len();
        if self.config.parallel {
            (0..n)
                .into_par_iter()
                .map_init(|| self.workspace(), |ws, t| f(t, ws))
                .collect()
        } else {
            let mut ws = self.workspace();
            (0..n).map(|t| f(t, &mut ws)).collect()
        }
    }

    // ------------------------------------------------------------------------
    // Per-target steps
    // ------------------------------------------------------------------------

    fn gather_offsets(&self, t: usize, ws: &mut GmlsWorkspace<T>) {
        let d = self.config.dimensions;
        let xt = self.targets.point(t);
        ws.offsets.clear();
        for &s in self.neighbors.neighbors(t) {
            let xs = self.sources.point(s);
            for i in 0..d {
                ws.offsets.push(xs[i] - xt[i]);
            }
        }
    }

    fn check_support(&self, t: usize, ws: &GmlsWorkspace<T>) -> Result<(), TargetError> {
        let k = self.neighbors.count(t);
        let required = self.required_neighbors();
        if k < required {
            return Err(TargetError::InsufficientSupport {
                neighbors: k,
                required,
            });
        }

        // All neighbors at one location leave only one independent row.
        let d = self.config.dimensions;
        let tol = T::epsilon() * self.windows[t];
        let first = &ws.offsets[..d];
        let coincident = ws.offsets.chunks_exact(d).all(|o| {
            o.iter()
                .zip(first.iter())
                .all(|(&a, &b)| (a - b).abs() <= tol)
        });
        if coincident && self.basis.size() > 1 {
            return Err(TargetError::SingularSystem {
                rank: self.basis.row_components().min(self.basis.size()),
                columns: self.basis.size(),
            });
        }
        Ok(())
    }

    /// Tangent frame of target `t` from the curvature-weighted covariance of
    /// its neighbor offsets.
    pub fn tangent_frame(
        &self,
        t: usize,
        ws: &mut GmlsWorkspace<T>,
    ) -> Result<TangentFrame<T>, TargetError> {
        let d = self.config.dimensions;
        let h = self.windows[t];
        let k = self.neighbors.count(t);
        self.gather_offsets(t, ws);

        ws.weights.clear();
        ws.columns.reset(k * d, T::zero());
        for (row, o) in ws.offsets.chunks_exact(d).enumerate() {
            ws.weights
                .push(self.config.curvature_weighting.weight_of_offset(o, h));
            for (i, &v) in o.iter().enumerate() {
                ws.columns[i * k + row] = v;
            }
        }

        ws.moment.reset(d * d, T::zero());
        self.assembler.assemble(
            ws.columns.as_slice(),
            k,
            d,
            ws.weights.as_slice(),
            &mut ws.team,
            ws.moment.as_mut_slice(),
        );
        eigen::tangent_frame(ws.moment.as_slice(), d, &self.config.eigen)
    }

    // Projects offsets into the frame: tangent coordinates into `ws.local`,
    // heights returned.
    fn project(&self, frame: &TangentFrame<T>, ws: &mut GmlsWorkspace<T>) -> Vec<T> {
        let d = self.config.dimensions;
        let q = d - 1;
        let k = ws.offsets.len() / d;
        ws.local.reset(k * q, T::zero());
        let mut heights = Vec::with_capacity(k);
        for (o, u) in ws
            .offsets
            .chunks_exact(d)
            .zip(ws.local.chunks_exact_mut(q))
        {
            heights.push(frame.project(o, u));
        }
        heights
    }

    fn curvature_setup(
        &self,
        t: usize,
        ws: &mut GmlsWorkspace<T>,
    ) -> Result<(CurvatureSetup<T>, LeastSquaresSystem<T>), TargetError> {
        self.gather_offsets(t, ws);
        self.check_support(t, ws)?;
        let frame = self.tangent_frame(t, ws)?;
        let heights = self.project(&frame, ws);

        let d = self.config.dimensions;
        let q = d - 1;
        let h = self.windows[t];
        let k = heights.len();
        let cols = self.curvature_basis.size();

        let mut design = vec![T::zero(); k * cols];
        let mut diagonal = Vec::with_capacity(k);
        let mut scaled = [T::zero(); 2];
        ws.basis_row.reset(cols, T::zero());
        for row in 0..k {
            let w = self
                .config
                .curvature_weighting
                .weight_of_offset(&ws.offsets[row * d..(row + 1) * d], h);
            let sw = w.sqrt();
            for i in 0..q {
                scaled[i] = ws.local[row * q + i] / h;
            }
            self.curvature_basis
                .evaluate(&scaled[..q], 0, ws.basis_row.as_mut_slice());
            for m in 0..cols {
                design[m * k + row] = sw * ws.basis_row[m];
            }
            diagonal.push(sw);
        }

        let system = LeastSquaresSystem {
            design,
            rows: k,
            cols,
            rhs: RightHandSide::Diagonal(diagonal),
        };
        Ok((CurvatureSetup { frame, heights }, system))
    }

    fn geometry(
        &self,
        t: usize,
        setup: &CurvatureSetup<T>,
        solved: &SolvedSystem<T>,
    ) -> ManifoldGeometry<T> {
        let coefficients: Vec<T> = (0..self.curvature_basis.size())
            .map(|m| {
                setup
                    .heights
                    .iter()
                    .enumerate()
                    .fold(T::zero(), |acc, (k, &eta)| acc + solved.get(m, k) * eta)
            })
            .collect();
        ManifoldGeometry::from_height_fit(
            setup.frame,
            &self.curvature_basis,
            &coefficients,
            self.windows[t],
        )
    }

    fn reconstruction_system(
        &self,
        t: usize,
        frame: Option<&TangentFrame<T>>,
        ws: &mut GmlsWorkspace<T>,
    ) -> Result<LeastSquaresSystem<T>, TargetError> {
        let d = self.config.dimensions;
        let h = self.windows[t];
        self.gather_offsets(t, ws);
        self.check_support(t, ws)?;
        if let Some(frame) = frame {
            self.project(frame, ws);
        }

        let k = self.neighbors.count(t);
        let rb = self.basis.row_components();
        let cols = self.basis.size();
        let rows = k * rb;
        let vars = self.config.variables();

        let mut design = vec![T::zero(); rows * cols];
        let mut diagonal = Vec::with_capacity(rows);
        let mut scaled = [T::zero(); 3];
        ws.basis_row.reset(cols, T::zero());
        for n in 0..k {
            let offset = &ws.offsets[n * d..(n + 1) * d];
            let sw = self.config.weighting.weight_of_offset(offset, h).sqrt();
            let point = if frame.is_some() {
                &ws.local[n * vars..(n + 1) * vars]
            } else {
                offset
            };
            for (s, &p) in scaled.iter_mut().zip(point.iter()) {
                *s = p / h;
            }
            for c in 0..rb {
                self.basis
                    .evaluate(&scaled[..vars], c, ws.basis_row.as_mut_slice());
                let row = n * rb + c;
                for m in 0..cols {
                    design[m * rows + row] = sw * ws.basis_row[m];
                }
                diagonal.push(sw);
            }
        }

        Ok(LeastSquaresSystem {
            design,
            rows,
            cols,
            rhs: RightHandSide::Diagonal(diagonal),
        })
    }

    fn target_alphas(
        &self,
        t: usize,
        geometry: Option<&ManifoldGeometry<T>>,
        solved: &SolvedSystem<T>,
        ws: &mut GmlsWorkspace<T>,
    ) -> TargetAlphas<T> {
        let d = self.config.dimensions;
        let h = self.windows[t];
        let k = self.neighbors.count(t);
        let rb = self.basis.row_components();
        let cols = self.basis.size();

        let blocks = self
            .config
            .operations
            .iter()
            .map(|&op| {
                let out = op.output_components(d);
                let inp = op.input_components(d);
                let mut block = vec![T::zero(); out * inp * k];
                for c in 0..out {
                    let functional = match geometry {
                        Some(g) => g.functional(op, c),
                        None => op.euclidean_functional(c, d),
                    };
                    for j in 0..inp {
                        ws.image.reset(cols, T::zero());
                        basis_image(&self.basis, &functional, j, h, ws.image.as_mut_slice());
                        let lane = if rb > 1 { j } else { 0 };
                        let dst = &mut block[(c * inp + j) * k..(c * inp + j + 1) * k];
                        for (n, a) in dst.iter_mut().enumerate() {
                            let row = n * rb + lane;
                            *a = ws
                                .image
                                .iter()
                                .enumerate()
                                .fold(T::zero(), |acc, (m, &b)| acc + b * solved.get(m, row));
                        }
                    }
                }
                block
            })
            .collect();

        TargetAlphas {
            blocks,
            rank: solved.rank,
        }
    }

    // ------------------------------------------------------------------------
    // Pass
    // ------------------------------------------------------------------------

    /// Run every phase and build the alpha table.
    pub fn generate(&self) -> AlphaTable<T> {
        let start = Instant::now();
        let n = self.targets.len();
        debug!(
            "GMLS pass: {n} targets, {} sources, basis size {}, {} rows per neighbor",
            self.sources.len(),
            self.basis.size(),
            self.basis.row_components()
        );

        let geometries: Option<Vec<Result<ManifoldGeometry<T>, TargetError>>> =
            if self.config.manifold {
                let phase = Instant::now();
                let (setups, systems): (Vec<_>, Vec<_>) = self
                    .map_targets(|t, ws| match self.curvature_setup(t, ws) {
                        Ok((setup, system)) => (Ok(setup), Ok(system)),
                        Err(e) => (Err(e), Err(e)),
                    })
                    .into_iter()
                    .unzip();
                let solved = self.solver.solve_batch(&systems);
                let geometries: Vec<Result<ManifoldGeometry<T>, TargetError>> =
                    self.map_targets(|t, _| {
                        let setup = setups[t].as_ref().map_err(|e| *e)?;
                        let fit = solved[t].as_ref().map_err(|e| *e)?;
                        Ok(self.geometry(t, setup, fit))
                    });
                debug!("tangent and curvature phase: {:?}", phase.elapsed());
                Some(geometries)
            } else {
                None
            };

        let phase = Instant::now();
        let systems = self.map_targets(|t, ws| match &geometries {
            Some(g) => match &g[t] {
                Ok(geometry) => self.reconstruction_system(t, Some(geometry.frame()), ws),
                Err(e) => Err(*e),
            },
            None => self.reconstruction_system(t, None, ws),
        });
        let solved = self.solver.solve_batch(&systems);
        drop(systems);
        debug!("reconstruction solve phase: {:?}", phase.elapsed());

        let phase = Instant::now();
        let results: Vec<Result<TargetAlphas<T>, TargetError>> = self.map_targets(|t, ws| {
            let fit = solved[t].as_ref().map_err(|e| *e)?;
            let geometry = match &geometries {
                Some(g) => Some(g[t].as_ref().map_err(|e| *e)?),
                None => None,
            };
            Ok(self.target_alphas(t, geometry, fit, ws))
        });
        debug!("alpha phase: {:?}", phase.elapsed());

        for (t, r) in results.iter().enumerate() {
            match r {
                Err(e) => warn!("target {t}: {e}"),
                Ok(a) if a.rank < self.basis.size() => warn!(
                    "target {t}: rank-deficient fit (rank {} of {})",
                    a.rank,
                    self.basis.size()
                ),
                Ok(_) => {}
            }
        }

        let table = AlphaTable::from_targets(
            self.config.dimensions,
            self.sources.len(),
            self.basis.size(),
            self.config.parallel,
            self.neighbors,
            &self.config.operations,
            results,
        );
        info!(
            "generated alphas for {n} targets and {} operators in {:?} ({} failed, {} rank deficient)",
            self.config.operations.len(),
            start.elapsed(),
            table.failures().len(),
            table.rank_deficient_targets().len()
        );
        table
    }
}
