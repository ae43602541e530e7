//! Helpers for SO(n) and its Lie algebra so(n).

use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::StandardNormal;

use super::{ManifoldResult, MatrixFunctionConfig, expm};
use crate::linalg::{LinAlgError, Matrix};

/// Rotation by `angle` in the (i, j) coordinate plane of ℝⁿ.
///
/// Maps e_i towards e_j for positive angles. Indices outside `0..n` or
/// `i == j` leave the identity unchanged.
pub fn planar_rotation(n: usize, i: usize, j: usize, angle: f64) -> Matrix {
    let mut r = Matrix::identity(n);
    if i >= n || j >= n || i == j {
        return r;
    }
    let (s, c) = angle.sin_cos();
    r[(i, i)] = c;
    r[(j, j)] = c;
    r[(j, i)] = s;
    r[(i, j)] = -s;
    r
}

/// Random skew-symmetric matrix with strictly-upper entries uniform in
/// [−scale, scale).
pub fn random_skew<R: Rng + ?Sized>(n: usize, scale: f64, rng: &mut R) -> Matrix {
    let mut k = Matrix::zeros(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let value = scale * (2.0 * rng.random::<f64>() - 1.0);
            k[(i, j)] = value;
            k[(j, i)] = -value;
        }
    }
    k
}

/// Random rotation exp(K) for K drawn by [`random_skew`].
pub fn random_rotation<R: Rng + ?Sized>(
    n: usize,
    scale: f64,
    rng: &mut R,
) -> ManifoldResult<Matrix> {
    expm(&random_skew(n, scale, rng), &MatrixFunctionConfig::default())
}

/// Haar-distributed rotation in SO(n).
///
/// QR of a Gaussian matrix with the signs of R's diagonal folded into Q gives
/// a Haar sample of O(n); flipping the first column when det(Q) = −1 lands in
/// SO(n). Unlike [`random_rotation`], rotation angles are spread over the
/// whole of [0, π].
pub fn haar_rotation<R: Rng + ?Sized>(n: usize, rng: &mut R) -> ManifoldResult<Matrix> {
    if n == 0 {
        return Err(LinAlgError::InvalidDimension(0).into());
    }
    let gaussian = DMatrix::<f64>::from_fn(n, n, |_, _| rng.sample(StandardNormal));

    let qr = gaussian.qr();
    let r = qr.r();
    let mut q = qr.q();
    for j in 0..n {
        if r[(j, j)] < 0.0 {
            q.column_mut(j).neg_mut();
        }
    }
    if q.determinant() < 0.0 {
        q.column_mut(0).neg_mut();
    }

    Ok(Matrix::from_dmatrix(q)?)
}

/// ‖MᵀM − I‖_F.
pub fn orthogonality_error(m: &Matrix) -> f64 {
    m.transpose()
        .mul(m)
        .map(|gram| gram.distance_to_identity())
        .unwrap_or(f64::INFINITY)
}

/// True if MᵀM ≈ I and det(M) ≈ +1 within `tolerance`.
pub fn is_special_orthogonal(m: &Matrix, tolerance: f64) -> bool {
    orthogonality_error(m) <= tolerance && (m.determinant() - 1.0).abs() <= tolerance
}

/// Skew-symmetric part (M − Mᵀ)/2.
pub fn skew_part(m: &Matrix) -> Matrix {
    Matrix::from_fn(m.dim(), |i, j| 0.5 * (m[(i, j)] - m[(j, i)]))
}

/// True if every |M_ij + M_ji| ≤ `tolerance`.
pub fn is_skew_symmetric(m: &Matrix, tolerance: f64) -> bool {
    let n = m.dim();
    (0..n).all(|i| (i..n).all(|j| (m[(i, j)] + m[(j, i)]).abs() <= tolerance))
}
