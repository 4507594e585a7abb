#![cfg(feature = "dev")]
//! Tests for the dense least-squares bridge and SIMD dot kernels.
//!
//! ## Test Organization
//!
//! 1. **SIMD Kernels** - Agreement with scalar sums, odd lengths
//! 2. **QR** - Exact and overdetermined solves, rank deficiency
//! 3. **SVD** - Minimum-norm solutions

use approx::assert_abs_diff_eq;

use gmls_rs::internals::math::linalg::simd::{weighted_dot_f32, weighted_dot_f64};
use gmls_rs::internals::math::linalg::{DenseSolverType, FloatLinalg, RankDeficiency};

// ============================================================================
// SIMD Kernels
// ============================================================================

#[test]
fn test_weighted_dot_matches_scalar_sum() {
    for n in [0usize, 1, 2, 3, 7, 16, 33] {
        let a: Vec<f64> = (0..n).map(|i| i as f64 * 0.5 - 1.0).collect();
        let b: Vec<f64> = (0..n).map(|i| (i as f64).sin()).collect();
        let w: Vec<f64> = (0..n).map(|i| 1.0 + i as f64).collect();
        let expected: f64 = (0..n).map(|i| a[i] * w[i] * b[i]).sum();
        assert_abs_diff_eq!(weighted_dot_f64(&a, &b, &w), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(f64::weighted_dot(&a, &b, &w), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_weighted_dot_f32_tail() {
    let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
    let w = [1.0f32; 7];
    assert_abs_diff_eq!(weighted_dot_f32(&a, &a, &w), 140.0, epsilon = 1e-4);
}

// ============================================================================
// QR
// ============================================================================

#[test]
fn test_qr_solves_square_system() {
    // [[2, 1], [1, 3]] x = [3, 5]  =>  x = [0.8, 1.4]
    let a = [2.0, 1.0, 1.0, 3.0];
    let b = [3.0, 5.0];
    let s = f64::solve_least_squares(&a, 2, 2, &b, 1, DenseSolverType::QR, 1e-12).unwrap();
    assert_eq!(s.rank, 2);
    assert_abs_diff_eq!(s.x[0], 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(s.x[1], 1.4, epsilon = 1e-12);
}

#[test]
fn test_qr_overdetermined_line_fit() {
    // Fit y = 1 + 2x through exact samples.
    let xs = [0.0, 1.0, 2.0, 3.0];
    let mut a = vec![1.0; 4];
    a.extend_from_slice(&xs);
    let b: Vec<f64> = xs.iter().map(|x| 1.0 + 2.0 * x).collect();
    let s = f64::solve_least_squares(&a, 4, 2, &b, 1, DenseSolverType::QR, 1e-12).unwrap();
    assert_abs_diff_eq!(s.x[0], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(s.x[1], 2.0, epsilon = 1e-12);
}

#[test]
fn test_qr_reports_rank_deficiency() {
    // Two identical columns.
    let a = [1.0, 2.0, 3.0, 1.0, 2.0, 3.0];
    let b = [1.0, 1.0, 1.0];
    let err = f64::solve_least_squares(&a, 3, 2, &b, 1, DenseSolverType::QR, 1e-12).unwrap_err();
    assert_eq!(err, RankDeficiency { rank: 1 });
}

#[test]
fn test_qr_rejects_underdetermined() {
    let a = [1.0, 1.0];
    let b = [1.0];
    assert!(f64::solve_least_squares(&a, 1, 2, &b, 1, DenseSolverType::QR, 1e-12).is_err());
}

// ============================================================================
// SVD
// ============================================================================

#[test]
fn test_svd_minimum_norm_solution() {
    // x0 + x1 = 2 (twice): minimum-norm solution is (1, 1).
    let a = [1.0, 1.0, 1.0, 1.0];
    let b = [2.0, 2.0];
    let s = f64::solve_least_squares(&a, 2, 2, &b, 1, DenseSolverType::SVD, 1e-12).unwrap();
    assert_eq!(s.rank, 1);
    assert_abs_diff_eq!(s.x[0], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(s.x[1], 1.0, epsilon = 1e-12);
}

#[test]
fn test_svd_multiple_right_hand_sides() {
    let a = [2.0, 0.0, 0.0, 4.0];
    let b = [2.0, 0.0, 0.0, 4.0];
    let s = f32::solve_least_squares(&a, 2, 2, &b, 2, DenseSolverType::SVD, 1e-6).unwrap();
    assert_eq!(s.rank, 2);
    assert_abs_diff_eq!(s.x[0], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(s.x[1], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(s.x[2], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(s.x[3], 1.0, epsilon = 1e-6);
}

#[test]
fn test_svd_zero_matrix_is_singular() {
    let a = [0.0; 4];
    let b = [1.0, 1.0];
    let err = f64::solve_least_squares(&a, 2, 2, &b, 1, DenseSolverType::SVD, 1e-12).unwrap_err();
    assert_eq!(err.rank, 0);
}
