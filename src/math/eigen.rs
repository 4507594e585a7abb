//! Tangent-frame extraction by power iteration.
//!
//! ## Purpose
//!
//! This module extracts an orthonormal local frame (tangent rows followed by
//! a normal row) from the symmetric 2×2 or 3×3 covariance of raw neighbor
//! offsets around a manifold target.
//!
//! ## Design notes
//!
//! * **Power iteration**: Seeded with the normalized all-ones vector, iterated
//!   until successive unit iterates differ by less than the tolerance. When
//!   the matrix maps that seed to (nearly) zero, the coordinate axis with the
//!   largest image is used instead.
//! * **Deflation**: In 3D the second tangent comes from `A − ρ v vᵀ`, with
//!   the seed and every iterate projected off the first tangent.
//! * **Gram–Schmidt completion**: The last row is the all-ones vector
//!   orthonormalized against the previous rows, with a rotation (2D) or a
//!   cross product (3D) when that vector is nearly dependent.
//!
//! ## Key concepts
//!
//! * **Degenerate spectra**: When the two leading eigenvalues nearly
//!   coincide, the iterate wanders inside their common eigenspace without
//!   converging. Once the iteration bound is reached the iterate is accepted
//!   if its Rayleigh quotient has settled, since every vector of that
//!   eigenspace is an equally valid tangent direction.
//!
//! ## Invariants
//!
//! * Frame rows are unit length and mutually orthogonal.
//! * The normal is the last row; its sign is unspecified.

use num_traits::Float;

use crate::math::constant;
use crate::primitives::errors::TargetError;

/// Convergence controls of the power iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenSettings<T> {
    /// Stop when `‖v − v_prev‖` falls below this.
    pub tolerance: T,
    /// Upper bound on iterations per eigenvector.
    pub max_iterations: usize,
}

impl<T: Float> Default for EigenSettings<T> {
    fn default() -> Self {
        Self {
            tolerance: constant(1e-6),
            max_iterations: 5000,
        }
    }
}

// ============================================================================
// Tangent Frame
// ============================================================================

/// Orthonormal local frame: `d − 1` tangent rows followed by the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentFrame<T> {
    dimensions: usize,
    rows: [[T; 3]; 3],
}

impl<T: Float> TangentFrame<T> {
    /// Ambient dimension of the frame.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Row `i` (tangents first, normal last).
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.rows[i][..self.dimensions]
    }

    /// Tangent direction `i` (`i < d − 1`).
    #[inline]
    pub fn tangent(&self, i: usize) -> &[T] {
        self.row(i)
    }

    /// Unit normal.
    #[inline]
    pub fn normal(&self) -> &[T] {
        self.row(self.dimensions - 1)
    }

    /// Express an ambient offset in the frame: tangent coordinates are written
    /// into `local`, the normal height is returned.
    #[inline]
    pub fn project(&self, offset: &[T], local: &mut [T]) -> T {
        for (i, l) in local.iter_mut().enumerate().take(self.dimensions - 1) {
            *l = dot(self.row(i), offset);
        }
        dot(self.normal(), offset)
    }
}

// ============================================================================
// Power Iteration
// ============================================================================

/// Dominant eigenpair `(v, ρ)` of a symmetric `D × D` matrix.
pub fn dominant_eigenpair<T: Float, const D: usize>(
    a: &[[T; D]; D],
    settings: &EigenSettings<T>,
) -> Result<([T; D], T), TargetError> {
    power_iteration(a, None, settings)
}

/// Power iteration confined to the orthogonal complement of the unit vector
/// `against`, when given.
fn power_iteration<T: Float, const D: usize>(
    a: &[[T; D]; D],
    against: Option<&[T; D]>,
    settings: &EigenSettings<T>,
) -> Result<([T; D], T), TargetError> {
    let mut v = starting_vector(a, against)
        .ok_or(TargetError::NonConvergentEigenEstimate { iterations: 1 })?;
    let mut rho = rayleigh(a, &v);

    for iteration in 1..=settings.max_iterations {
        let w = image(a, &v, against);
        let len = norm(&w);
        if len <= T::zero() || !len.is_finite() {
            return Err(TargetError::NonConvergentEigenEstimate {
                iterations: iteration,
            });
        }
        let mut next = w;
        for x in next.iter_mut() {
            *x = *x / len;
        }
        let change = next
            .iter()
            .zip(v.iter())
            .fold(T::zero(), |acc, (&n, &p)| acc + (n - p) * (n - p))
            .sqrt();
        let next_rho = rayleigh(a, &next);
        let rho_change = (next_rho - rho).abs();
        v = next;
        rho = next_rho;

        if change < settings.tolerance {
            return Ok((v, rho));
        }
        if iteration == settings.max_iterations && rho_change <= settings.tolerance * rho.abs() {
            return Ok((v, rho));
        }
    }

    Err(TargetError::NonConvergentEigenEstimate {
        iterations: settings.max_iterations,
    })
}

/// Unit seed with a non-negligible image under `a`: the all-ones direction
/// if it qualifies, otherwise the coordinate axis with the largest image.
/// `None` when every candidate is (numerically) annihilated.
fn starting_vector<T: Float, const D: usize>(
    a: &[[T; D]; D],
    against: Option<&[T; D]>,
) -> Option<[T; D]> {
    let scale = a
        .iter()
        .flatten()
        .fold(T::zero(), |acc, &x| acc + x * x)
        .sqrt();
    let cutoff = T::epsilon().sqrt();

    let unit_candidate = |mut c: [T; D]| -> Option<([T; D], T)> {
        if let Some(u) = against {
            orthogonalize(&mut c, u);
        }
        let len = norm(&c);
        if len.is_nan() || len <= cutoff {
            return None;
        }
        for x in c.iter_mut() {
            *x = *x / len;
        }
        let reach = norm(&image(a, &c, against));
        (reach > cutoff * scale).then_some((c, reach))
    };

    if let Some((ones, _)) = unit_candidate([T::one(); D]) {
        return Some(ones);
    }
    (0..D)
        .filter_map(|i| {
            let mut axis = [T::zero(); D];
            axis[i] = T::one();
            unit_candidate(axis)
        })
        .fold(None, |best: Option<([T; D], T)>, (c, reach)| match best {
            Some((_, r)) if r >= reach => best,
            _ => Some((c, reach)),
        })
        .map(|(c, _)| c)
}

/// Frame of a 2×2 covariance: the dominant eigenvector is the tangent.
pub fn tangent_frame_2d<T: Float>(
    a: &[[T; 2]; 2],
    settings: &EigenSettings<T>,
) -> Result<TangentFrame<T>, TargetError> {
    let (t, _) = dominant_eigenpair(a, settings)?;
    let seed = T::one() / constant::<T>(2.0).sqrt();
    let mut n = [seed, seed];
    orthogonalize(&mut n, &t);
    let nn = norm(&n);
    let n = if nn > constant(1e-8) {
        [n[0] / nn, n[1] / nn]
    } else {
        [-t[1], t[0]]
    };
    let z = T::zero();
    Ok(TangentFrame {
        dimensions: 2,
        rows: [[t[0], t[1], z], [n[0], n[1], z], [z, z, z]],
    })
}

/// Frame of a 3×3 covariance: two dominant eigenvectors (by deflation) span
/// the tangent plane, the normal completes the basis.
pub fn tangent_frame_3d<T: Float>(
    a: &[[T; 3]; 3],
    settings: &EigenSettings<T>,
) -> Result<TangentFrame<T>, TargetError> {
    let (t0, rho) = dominant_eigenpair(a, settings)?;

    let mut deflated = *a;
    for (i, row) in deflated.iter_mut().enumerate() {
        for (j, x) in row.iter_mut().enumerate() {
            *x = *x - rho * t0[i] * t0[j];
        }
    }
    let (mut t1, _) = power_iteration(&deflated, Some(&t0), settings)?;
    orthogonalize(&mut t1, &t0);
    let t1_len = norm(&t1);
    if t1_len.is_nan() || t1_len <= constant(0.5) {
        return Err(TargetError::NonConvergentEigenEstimate {
            iterations: settings.max_iterations,
        });
    }
    normalize(&mut t1);

    let seed = T::one() / constant::<T>(3.0).sqrt();
    let mut n = [seed; 3];
    orthogonalize(&mut n, &t0);
    orthogonalize(&mut n, &t1);
    if norm(&n) <= constant(1e-8) {
        n = cross(&t0, &t1);
    }
    normalize(&mut n);

    // Second pass of Gram–Schmidt keeps rows orthonormal to rounding.
    orthogonalize(&mut n, &t0);
    orthogonalize(&mut n, &t1);
    normalize(&mut n);

    Ok(TangentFrame {
        dimensions: 3,
        rows: [t0, t1, n],
    })
}

/// Frame of a row-major `d × d` covariance (`d` is 2 or 3).
pub fn tangent_frame<T: Float>(
    a: &[T],
    dimensions: usize,
    settings: &EigenSettings<T>,
) -> Result<TangentFrame<T>, TargetError> {
    if dimensions == 2 {
        let m = [[a[0], a[1]], [a[2], a[3]]];
        tangent_frame_2d(&m, settings)
    } else {
        let m = [[a[0], a[1], a[2]], [a[3], a[4], a[5]], [a[6], a[7], a[8]]];
        tangent_frame_3d(&m, settings)
    }
}

// ============================================================================
// Small Vector Helpers
// ============================================================================

#[inline]
fn dot<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

#[inline]
fn norm<T: Float>(a: &[T]) -> T {
    dot(a, a).sqrt()
}

#[inline]
fn normalize<T: Float>(a: &mut [T]) {
    let n = norm(a);
    if n > T::zero() {
        for x in a.iter_mut() {
            *x = *x / n;
        }
    }
}

#[inline]
fn orthogonalize<T: Float>(a: &mut [T], unit: &[T]) {
    let p = dot(a, unit);
    for (x, &u) in a.iter_mut().zip(unit.iter()) {
        *x = *x - p * u;
    }
}

#[inline]
fn cross<T: Float>(a: &[T; 3], b: &[T; 3]) -> [T; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn mat_vec<T: Float, const D: usize>(a: &[[T; D]; D], v: &[T; D]) -> [T; D] {
    let mut out = [T::zero(); D];
    for (o, row) in out.iter_mut().zip(a.iter()) {
        *o = dot(row, v);
    }
    out
}

/// `a v`, projected off `against` when given.
#[inline]
fn image<T: Float, const D: usize>(
    a: &[[T; D]; D],
    v: &[T; D],
    against: Option<&[T; D]>,
) -> [T; D] {
    let mut w = mat_vec(a, v);
    if let Some(u) = against {
        orthogonalize(&mut w, u);
    }
    w
}

#[inline]
fn rayleigh<T: Float, const D: usize>(a: &[[T; D]; D], v: &[T; D]) -> T {
    dot(v, &mat_vec(a, v))
}
