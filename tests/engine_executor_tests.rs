#![cfg(feature = "dev")]
//! End-to-end tests of stencil generation and application in Euclidean space.
//!
//! ## Test Organization
//!
//! 1. **Polynomial Exactness** - Scalar operators in 1D, 2D and 3D
//! 2. **Stencil Properties** - Partition of unity, idempotent application
//! 3. **Unisolvency** - Support boundary and the hexagon configuration
//! 4. **Vector Operators** - Componentwise and divergence-free spaces
//! 5. **Failure Isolation** - Per-target errors inside a healthy batch
//! 6. **Table Access** - Accessor errors

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gmls_rs::prelude::*;

use TargetOperation::*;

// ============================================================================
// Helpers
// ============================================================================

fn random_rows<const D: usize>(n: usize, half_width: f64, seed: u64) -> Vec<[f64; D]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut p = [0.0; D];
            for x in p.iter_mut() {
                *x = rng.random_range(-half_width..half_width);
            }
            p
        })
        .collect()
}

fn within<const D: usize>(sources: &[[f64; D]], targets: &[[f64; D]], h: f64) -> NeighborLists {
    let lists: Vec<Vec<usize>> = targets
        .iter()
        .map(|t| {
            (0..sources.len())
                .filter(|&s| {
                    let d2: f64 = (0..D).map(|i| (sources[s][i] - t[i]).powi(2)).sum();
                    d2.sqrt() < h
                })
                .collect()
        })
        .collect();
    NeighborLists::from_lists(&lists)
}

struct Setup<const D: usize> {
    sources: Vec<[f64; D]>,
    targets: Vec<[f64; D]>,
    neighbors: NeighborLists,
    windows: Vec<f64>,
}

impl<const D: usize> Setup<D> {
    fn random(n_sources: usize, n_targets: usize, h: f64, seed: u64) -> Self {
        let sources = random_rows::<D>(n_sources, 1.0, seed);
        let targets = random_rows::<D>(n_targets, 0.4, seed + 1);
        let neighbors = within(&sources, &targets, h);
        Self {
            sources,
            targets,
            neighbors,
            windows: vec![h; n_targets],
        }
    }

    fn generate(&self, model: &GmlsModel<f64>) -> AlphaTable<f64> {
        model
            .generate_alphas(
                &PointCloud::from_rows(&self.sources).unwrap(),
                &PointCloud::from_rows(&self.targets).unwrap(),
                &self.neighbors,
                &self.windows,
            )
            .unwrap()
    }

    fn sample(&self, f: impl Fn(&[f64; D]) -> Vec<f64>) -> Vec<f64> {
        self.sources.iter().flat_map(|p| f(p)).collect()
    }
}

fn model(dims: usize, degree: usize, ops: &[TargetOperation]) -> GmlsModel<f64> {
    Gmls::new()
        .dimensions(dims)
        .degree(degree)
        .operators(ops)
        .build()
        .unwrap()
}

fn vector_model(
    dims: usize,
    space: ReconstructionSpace,
    ops: &[TargetOperation],
) -> GmlsModel<f64> {
    Gmls::new()
        .dimensions(dims)
        .degree(2)
        .reconstruction_space(space)
        .operators(ops)
        .build()
        .unwrap()
}

// ============================================================================
// Polynomial Exactness
// ============================================================================

#[test]
fn test_scalar_exactness_2d() {
    let s = Setup::<2>::random(300, 4, 0.5, 1);
    let ops = [
        ScalarPointEvaluation,
        GradientOfScalarPointEvaluation,
        LaplacianOfScalarPointEvaluation,
        PartialXOfScalarPointEvaluation,
        PartialYOfScalarPointEvaluation,
    ];
    let table = s.generate(&model(2, 2, &ops));
    assert!(table.failures().is_empty());

    let f = |p: &[f64; 2]| {
        let (x, y) = (p[0], p[1]);
        1.0 + 2.0 * x - 3.0 * y + 0.5 * x * x + x * y - y * y
    };
    let data = s.sample(|p| vec![f(p)]);

    let value = table.apply(ScalarPointEvaluation, &data).unwrap();
    let grad = table.apply(GradientOfScalarPointEvaluation, &data).unwrap();
    let lap = table.apply(LaplacianOfScalarPointEvaluation, &data).unwrap();
    let dx = table.apply(PartialXOfScalarPointEvaluation, &data).unwrap();
    let dy = table.apply(PartialYOfScalarPointEvaluation, &data).unwrap();

    for (t, p) in s.targets.iter().enumerate() {
        let (x, y) = (p[0], p[1]);
        assert_abs_diff_eq!(value.get(t, 0).unwrap(), f(p), epsilon = 1e-9);
        assert_abs_diff_eq!(grad.get(t, 0).unwrap(), 2.0 + x + y, epsilon = 1e-9);
        assert_abs_diff_eq!(grad.get(t, 1).unwrap(), -3.0 + x - 2.0 * y, epsilon = 1e-9);
        assert_abs_diff_eq!(dx.get(t, 0).unwrap(), 2.0 + x + y, epsilon = 1e-9);
        assert_abs_diff_eq!(dy.get(t, 0).unwrap(), -3.0 + x - 2.0 * y, epsilon = 1e-9);
        assert_abs_diff_eq!(lap.get(t, 0).unwrap(), -1.0, epsilon = 1e-8);
    }
}

#[test]
fn test_scalar_exactness_3d() {
    let s = Setup::<3>::random(1500, 3, 0.6, 2);
    let ops = [
        ScalarPointEvaluation,
        GradientOfScalarPointEvaluation,
        LaplacianOfScalarPointEvaluation,
        PartialZOfScalarPointEvaluation,
    ];
    let table = s.generate(&model(3, 2, &ops));

    let f = |p: &[f64; 3]| {
        let (x, y, z) = (p[0], p[1], p[2]);
        1.0 + x - y + 2.0 * z + x * x + y * z - z * z + 0.5 * y * y
    };
    let data = s.sample(|p| vec![f(p)]);
    let value = table.apply(ScalarPointEvaluation, &data).unwrap();
    let grad = table.apply(GradientOfScalarPointEvaluation, &data).unwrap();
    let lap = table.apply(LaplacianOfScalarPointEvaluation, &data).unwrap();
    let dz = table.apply(PartialZOfScalarPointEvaluation, &data).unwrap();

    for (t, p) in s.targets.iter().enumerate() {
        let (x, y, z) = (p[0], p[1], p[2]);
        assert_abs_diff_eq!(value.get(t, 0).unwrap(), f(p), epsilon = 1e-9);
        assert_abs_diff_eq!(grad.get(t, 0).unwrap(), 1.0 + 2.0 * x, epsilon = 1e-9);
        assert_abs_diff_eq!(grad.get(t, 1).unwrap(), -1.0 + z + y, epsilon = 1e-9);
        assert_abs_diff_eq!(grad.get(t, 2).unwrap(), 2.0 + y - 2.0 * z, epsilon = 1e-9);
        assert_abs_diff_eq!(dz.get(t, 0).unwrap(), 2.0 + y - 2.0 * z, epsilon = 1e-9);
        assert_abs_diff_eq!(lap.get(t, 0).unwrap(), 1.0, epsilon = 1e-8);
    }
}

#[test]
fn test_scalar_exactness_1d_cubic() {
    let sources: Vec<[f64; 1]> = (0..41).map(|i| [-1.0 + 0.05 * i as f64]).collect();
    let targets = [[0.013], [-0.27]];
    let s = Setup {
        neighbors: within(&sources, &targets[..], 0.4),
        sources,
        targets: targets.to_vec(),
        windows: vec![0.4; 2],
    };
    let ops = [PartialXOfScalarPointEvaluation, LaplacianOfScalarPointEvaluation];
    let table = s.generate(&model(1, 3, &ops));

    let data = s.sample(|p| vec![p[0].powi(3) - 2.0 * p[0]]);
    let dx = table.apply(PartialXOfScalarPointEvaluation, &data).unwrap();
    let lap = table.apply(LaplacianOfScalarPointEvaluation, &data).unwrap();
    for (t, p) in s.targets.iter().enumerate() {
        assert_abs_diff_eq!(dx.get(t, 0).unwrap(), 3.0 * p[0] * p[0] - 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lap.get(t, 0).unwrap(), 6.0 * p[0], epsilon = 1e-8);
    }
}

// ============================================================================
// Stencil Properties
// ============================================================================

#[test]
fn test_partition_of_unity() {
    let s = Setup::<2>::random(200, 5, 0.5, 3);
    let ops = [ScalarPointEvaluation, GradientOfScalarPointEvaluation];
    let table = s.generate(&model(2, 2, &ops));
    for t in 0..table.n_targets() {
        let sum: f64 = table
            .alphas(ScalarPointEvaluation, t, 0, 0)
            .unwrap()
            .unwrap()
            .iter()
            .sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        for c in 0..2 {
            let grad_sum: f64 = table
                .alphas(GradientOfScalarPointEvaluation, t, c, 0)
                .unwrap()
                .unwrap()
                .iter()
                .sum();
            assert_abs_diff_eq!(grad_sum, 0.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_apply_is_idempotent_and_order_independent() {
    let s = Setup::<2>::random(200, 6, 0.5, 4);
    let ops = [LaplacianOfScalarPointEvaluation];
    let parallel = s.generate(&model(2, 2, &ops));
    let sequential = s.generate(
        &Gmls::new()
            .dimensions(2)
            .operators(&ops)
            .parallel(false)
            .build()
            .unwrap(),
    );

    let data = s.sample(|p| vec![(3.0 * p[0]).sin() * p[1].exp()]);
    let first = parallel.apply(LaplacianOfScalarPointEvaluation, &data).unwrap();
    let second = parallel.apply(LaplacianOfScalarPointEvaluation, &data).unwrap();
    let third = sequential.apply(LaplacianOfScalarPointEvaluation, &data).unwrap();

    let bits = |e: &OperatorEstimate<f64>| e.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));
    assert_eq!(bits(&first), bits(&third));
}

// ============================================================================
// Unisolvency
// ============================================================================

const GENERIC_SIX: [[f64; 2]; 6] = [
    [0.1, 0.0],
    [0.5, 0.1],
    [-0.3, 0.4],
    [0.2, -0.6],
    [-0.7, -0.2],
    [0.05, 0.8],
];

fn small_setup(points: &[[f64; 2]], h: f64) -> Setup<2> {
    Setup {
        sources: points.to_vec(),
        targets: vec![[0.0, 0.0]],
        neighbors: NeighborLists::from_lists(&[(0..points.len()).collect::<Vec<usize>>()]),
        windows: vec![h],
    }
}

#[test]
fn test_exactly_unisolvent_support_succeeds() {
    assert_eq!(unisolvency_size(2, 2), 6);
    let s = small_setup(&GENERIC_SIX, 1.2);
    let table = s.generate(&model(2, 2, &[ScalarPointEvaluation]));
    assert_eq!(table.rank(0), Some(6));

    let data = s.sample(|p| vec![1.5 + p[0] * p[0] - p[0] * p[1] + 2.0 * p[1]]);
    let v = table.apply(ScalarPointEvaluation, &data).unwrap();
    assert_abs_diff_eq!(v.get(0, 0).unwrap(), 1.5, epsilon = 1e-10);
}

#[test]
fn test_one_below_unisolvency_is_insufficient_support() {
    let s = small_setup(&GENERIC_SIX[..5], 1.2);
    let table = s.generate(&model(2, 2, &[ScalarPointEvaluation]));
    assert_eq!(
        table.failure(0),
        Some(TargetError::InsufficientSupport {
            neighbors: 5,
            required: 6
        })
    );
    assert_eq!(table.alphas(ScalarPointEvaluation, 0, 0, 0), Ok(None));
}

fn hexagon(inner_radius: f64) -> Vec<[f64; 2]> {
    (0..6)
        .map(|k| {
            let angle = std::f64::consts::PI * k as f64 / 3.0;
            let r = if k % 2 == 0 { 1.0 } else { inner_radius };
            [r * angle.cos(), r * angle.sin()]
        })
        .collect()
}

#[test]
fn test_regular_hexagon_is_singular_for_quadratics() {
    // Six points on a circle satisfy x² + y² = 1, so the quadratic design
    // matrix has rank 5.
    let s = small_setup(&hexagon(1.0), 1.2);
    let table = s.generate(&model(2, 2, &[ScalarPointEvaluation]));
    assert_eq!(
        table.failure(0),
        Some(TargetError::SingularSystem {
            rank: 5,
            columns: 6
        })
    );
}

#[test]
fn test_regular_hexagon_with_svd_gives_minimum_norm_fit() {
    let h = 1.2;
    let s = small_setup(&hexagon(1.0), h);
    let model = Gmls::new()
        .dimensions(2)
        .operators(&[ScalarPointEvaluation])
        .solver(DenseSolverType::SVD)
        .build()
        .unwrap();
    let table = s.generate(&model);
    assert_eq!(table.rank(0), Some(5));
    assert_eq!(table.rank_deficient_targets(), vec![0]);

    // f = x² + 2y has f(0) = 0, but on the circle the constant and x² + y²
    // columns are aliased; the minimum-norm coefficients put
    // h⁴ / (1 + 2h⁴) on the constant.
    let data = s.sample(|p| vec![p[0] * p[0] + 2.0 * p[1]]);
    let v = table.apply(ScalarPointEvaluation, &data).unwrap();
    let h4 = h.powi(4);
    assert_abs_diff_eq!(v.get(0, 0).unwrap(), h4 / (1.0 + 2.0 * h4), epsilon = 1e-9);
}

fn hexagon_table_f32(inner_radius: f64) -> AlphaTable<f32> {
    let points: Vec<[f32; 2]> = hexagon(inner_radius)
        .iter()
        .map(|p| [p[0] as f32, p[1] as f32])
        .collect();
    let model = Gmls::<f32>::new()
        .dimensions(2)
        .operators(&[ScalarPointEvaluation])
        .build()
        .unwrap();
    model
        .generate_alphas(
            &PointCloud::from_rows(&points).unwrap(),
            &PointCloud::from_rows(&[[0.0f32, 0.0]]).unwrap(),
            &NeighborLists::from_lists(&[(0..6).collect::<Vec<usize>>()]),
            &[1.2f32],
        )
        .unwrap()
}

#[test]
fn test_regular_hexagon_is_singular_in_f32() {
    let table = hexagon_table_f32(1.0);
    assert_eq!(
        table.failure(0),
        Some(TargetError::SingularSystem {
            rank: 5,
            columns: 6
        })
    );
    assert!(hexagon_table_f32(0.6).failure(0).is_none());
}

#[test]
fn test_alternating_hexagon_is_exact() {
    let s = small_setup(&hexagon(0.6), 1.2);
    let table = s.generate(&model(2, 2, &[ScalarPointEvaluation]));
    assert!(table.failure(0).is_none());

    let data = s.sample(|p| vec![p[0] * p[0] + 2.0 * p[1]]);
    let v = table.apply(ScalarPointEvaluation, &data).unwrap();
    assert_abs_diff_eq!(v.get(0, 0).unwrap(), 0.0, epsilon = 1e-10);
}

// ============================================================================
// Vector Operators
// ============================================================================

#[test]
fn test_componentwise_vector_operators_2d() {
    let s = Setup::<2>::random(300, 3, 0.5, 5);
    let ops = [
        VectorPointEvaluation,
        DivergenceOfVectorPointEvaluation,
        CurlOfVectorPointEvaluation,
        CurlCurlOfVectorPointEvaluation,
    ];
    let table = s.generate(&vector_model(2, ReconstructionSpace::VectorTaylorPolynomial, &ops));

    // u = (x² − y, xy + 2x)
    let data = s.sample(|p| vec![p[0] * p[0] - p[1], p[0] * p[1] + 2.0 * p[0]]);
    let u = table.apply(VectorPointEvaluation, &data).unwrap();
    let div = table.apply(DivergenceOfVectorPointEvaluation, &data).unwrap();
    let curl = table.apply(CurlOfVectorPointEvaluation, &data).unwrap();
    let curl_curl = table.apply(CurlCurlOfVectorPointEvaluation, &data).unwrap();

    for (t, p) in s.targets.iter().enumerate() {
        let (x, y) = (p[0], p[1]);
        assert_abs_diff_eq!(u.get(t, 0).unwrap(), x * x - y, epsilon = 1e-9);
        assert_abs_diff_eq!(u.get(t, 1).unwrap(), x * y + 2.0 * x, epsilon = 1e-9);
        assert_abs_diff_eq!(div.get(t, 0).unwrap(), 3.0 * x, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 0).unwrap(), y + 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curl_curl.get(t, 0).unwrap(), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(curl_curl.get(t, 1).unwrap(), 0.0, epsilon = 1e-8);
    }
}

#[test]
fn test_componentwise_vector_operators_3d() {
    let s = Setup::<3>::random(1500, 2, 0.6, 6);
    let ops = [
        DivergenceOfVectorPointEvaluation,
        CurlOfVectorPointEvaluation,
        CurlCurlOfVectorPointEvaluation,
    ];
    let table = s.generate(&vector_model(3, ReconstructionSpace::VectorTaylorPolynomial, &ops));

    // u = (yz, x², x + z²)
    let data = s.sample(|p| vec![p[1] * p[2], p[0] * p[0], p[0] + p[2] * p[2]]);
    let div = table.apply(DivergenceOfVectorPointEvaluation, &data).unwrap();
    let curl = table.apply(CurlOfVectorPointEvaluation, &data).unwrap();
    let curl_curl = table.apply(CurlCurlOfVectorPointEvaluation, &data).unwrap();

    for (t, p) in s.targets.iter().enumerate() {
        let (x, y, z) = (p[0], p[1], p[2]);
        assert_abs_diff_eq!(div.get(t, 0).unwrap(), 2.0 * z, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 0).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 1).unwrap(), y - 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 2).unwrap(), 2.0 * x - z, epsilon = 1e-9);
        assert_abs_diff_eq!(curl_curl.get(t, 0).unwrap(), 0.0, epsilon = 1e-8);
        assert_abs_diff_eq!(curl_curl.get(t, 1).unwrap(), -2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(curl_curl.get(t, 2).unwrap(), 0.0, epsilon = 1e-8);
    }
}

#[test]
fn test_divergence_free_exactness_2d() {
    let s = Setup::<2>::random(300, 3, 0.5, 7);
    let ops = [
        VectorPointEvaluation,
        CurlOfVectorPointEvaluation,
        DivergenceOfVectorPointEvaluation,
    ];
    let table = s.generate(&vector_model(
        2,
        ReconstructionSpace::DivergenceFreeVectorTaylorPolynomial,
        &ops,
    ));

    // u = (x² + y, −2xy + 3x), ∇·u = 0
    let data = s.sample(|p| vec![p[0] * p[0] + p[1], -2.0 * p[0] * p[1] + 3.0 * p[0]]);
    let u = table.apply(VectorPointEvaluation, &data).unwrap();
    let curl = table.apply(CurlOfVectorPointEvaluation, &data).unwrap();
    let div = table.apply(DivergenceOfVectorPointEvaluation, &data).unwrap();

    for (t, p) in s.targets.iter().enumerate() {
        let (x, y) = (p[0], p[1]);
        assert_abs_diff_eq!(u.get(t, 0).unwrap(), x * x + y, epsilon = 1e-9);
        assert_abs_diff_eq!(u.get(t, 1).unwrap(), -2.0 * x * y + 3.0 * x, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 0).unwrap(), 2.0 - 2.0 * y, epsilon = 1e-9);
        assert_abs_diff_eq!(div.get(t, 0).unwrap(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_divergence_free_exactness_3d() {
    let s = Setup::<3>::random(1500, 2, 0.6, 8);
    let ops = [VectorPointEvaluation, CurlOfVectorPointEvaluation];
    let model = vector_model(3, ReconstructionSpace::DivergenceFreeVectorTaylorPolynomial, &ops);
    assert_eq!(model.basis_size(), 26);
    assert_eq!(model.min_neighbors(), 9);
    let table = s.generate(&model);

    // u = (y², z², x²)
    let data = s.sample(|p| vec![p[1] * p[1], p[2] * p[2], p[0] * p[0]]);
    let u = table.apply(VectorPointEvaluation, &data).unwrap();
    let curl = table.apply(CurlOfVectorPointEvaluation, &data).unwrap();

    for (t, p) in s.targets.iter().enumerate() {
        let (x, y, z) = (p[0], p[1], p[2]);
        assert_abs_diff_eq!(u.get(t, 0).unwrap(), y * y, epsilon = 1e-9);
        assert_abs_diff_eq!(u.get(t, 1).unwrap(), z * z, epsilon = 1e-9);
        assert_abs_diff_eq!(u.get(t, 2).unwrap(), x * x, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 0).unwrap(), -2.0 * z, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 1).unwrap(), -2.0 * x, epsilon = 1e-9);
        assert_abs_diff_eq!(curl.get(t, 2).unwrap(), -2.0 * y, epsilon = 1e-9);
    }
}

// ============================================================================
// Failure Isolation
// ============================================================================

#[test]
fn test_failed_targets_do_not_affect_others() {
    let mut s = Setup::<2>::random(200, 3, 0.5, 9);
    let mut lists: Vec<Vec<usize>> = (0..3).map(|t| s.neighbors.neighbors(t).to_vec()).collect();
    lists[1] = vec![0, 1];
    s.neighbors = NeighborLists::from_lists(&lists);

    let table = s.generate(&model(2, 2, &[ScalarPointEvaluation]));
    assert_eq!(
        table.failures(),
        vec![(
            1,
            TargetError::InsufficientSupport {
                neighbors: 2,
                required: 6
            }
        )]
    );

    let data = s.sample(|p| vec![p[0] + p[1]]);
    let v = table.apply(ScalarPointEvaluation, &data).unwrap();
    assert_eq!(v.failed_count(), 1);
    assert!(v.get(1, 0).is_none());
    assert!(v.values()[1].is_nan());
    for t in [0, 2] {
        let p = s.targets[t];
        assert_abs_diff_eq!(v.get(t, 0).unwrap(), p[0] + p[1], epsilon = 1e-10);
    }
}

#[test]
fn test_coincident_neighbors_are_singular() {
    let s = Setup {
        sources: vec![[0.1, 0.2]],
        targets: vec![[0.0, 0.0]],
        neighbors: NeighborLists::from_lists(&[vec![0usize; 8]]),
        windows: vec![1.0],
    };
    for solver in [DenseSolverType::QR, DenseSolverType::SVD] {
        let model = Gmls::new()
            .dimensions(2)
            .operators(&[ScalarPointEvaluation])
            .solver(solver)
            .build()
            .unwrap();
        let table = s.generate(&model);
        assert_eq!(
            table.failure(0),
            Some(TargetError::SingularSystem {
                rank: 1,
                columns: 6
            })
        );
    }
}

#[test]
fn test_single_precision_generation() {
    let s = Setup::<2>::random(200, 2, 0.5, 10);
    let sources: Vec<[f32; 2]> = s.sources.iter().map(|p| [p[0] as f32, p[1] as f32]).collect();
    let targets: Vec<[f32; 2]> = s.targets.iter().map(|p| [p[0] as f32, p[1] as f32]).collect();
    let model = Gmls::<f32>::new()
        .dimensions(2)
        .degree(1)
        .operators(&[GradientOfScalarPointEvaluation])
        .svd_relative_tolerance(1e-6)
        .build()
        .unwrap();
    let table = model
        .generate_alphas(
            &PointCloud::from_rows(&sources).unwrap(),
            &PointCloud::from_rows(&targets).unwrap(),
            &s.neighbors,
            &[0.5f32, 0.5],
        )
        .unwrap();
    let data: Vec<f32> = sources.iter().map(|p| 3.0 * p[0] - p[1]).collect();
    let g = table.apply(GradientOfScalarPointEvaluation, &data).unwrap();
    for t in 0..2 {
        assert_abs_diff_eq!(g.get(t, 0).unwrap(), 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(g.get(t, 1).unwrap(), -1.0, epsilon = 1e-3);
    }
}

// ============================================================================
// Table Access
// ============================================================================

#[test]
fn test_table_accessor_errors() {
    let s = Setup::<2>::random(100, 2, 0.6, 11);
    let table = s.generate(&model(2, 2, &[GradientOfScalarPointEvaluation]));

    assert_eq!(table.operations(), vec![GradientOfScalarPointEvaluation]);
    assert_eq!(table.dimensions(), 2);
    assert_eq!(table.basis_size(), 6);
    assert!(matches!(
        table.alphas(ScalarPointEvaluation, 0, 0, 0),
        Err(GmlsError::OperatorNotGenerated(_))
    ));
    assert!(matches!(
        table.alphas(GradientOfScalarPointEvaluation, 5, 0, 0),
        Err(GmlsError::InvalidTarget { target: 5, .. })
    ));
    assert!(matches!(
        table.alphas(GradientOfScalarPointEvaluation, 0, 2, 0),
        Err(GmlsError::InvalidComponent {
            component: 2,
            components: 2
        })
    ));
    assert!(matches!(
        table.apply(GradientOfScalarPointEvaluation, &[1.0; 3]),
        Err(GmlsError::MismatchedLengths { .. })
    ));

    let k = table.neighbors().count(0);
    let alphas = table
        .alphas(GradientOfScalarPointEvaluation, 0, 1, 0)
        .unwrap()
        .unwrap();
    assert_eq!(alphas.len(), k);
    assert_eq!(
        table.alpha(GradientOfScalarPointEvaluation, 0, 1, 0, k - 1),
        Ok(Some(alphas[k - 1]))
    );
    assert!(table
        .alpha(GradientOfScalarPointEvaluation, 0, 1, 0, k)
        .is_err());
}
