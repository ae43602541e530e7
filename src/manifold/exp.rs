//! Matrix exponential by scaling and squaring.
//!
//! exp(K) = (exp(K / 2^s))^{2^s} with s chosen so that ‖K / 2^s‖_F is at most
//! `exp_threshold`; the scaled exponential is a truncated Taylor series.

use tracing::debug;

use super::{ManifoldResult, MatrixFunctionConfig, ensure_finite, ensure_non_empty};
use crate::linalg::Matrix;

/// Compute exp(K).
///
/// K is typically skew-symmetric, but any square matrix is accepted.
pub fn expm(k: &Matrix, config: &MatrixFunctionConfig) -> ManifoldResult<Matrix> {
    ensure_non_empty(k)?;
    let n = k.dim();
    let norm = k.frobenius_norm();
    if !norm.is_finite() {
        return Err(super::ManifoldError::NumericalInstability(
            "exponential of a non-finite matrix".to_string(),
        ));
    }
    if norm == 0.0 {
        return Ok(Matrix::identity(n));
    }

    let squarings = squarings_for(norm, config.exp_threshold);
    let a = k.scale(0.5f64.powi(squarings as i32));

    let mut result = taylor_exp(&a, config.exp_max_terms, config.series_tolerance)?;
    let mut scratch = Matrix::zeros(n);
    for _ in 0..squarings {
        result.mul_into(&result, &mut scratch)?;
        std::mem::swap(&mut result, &mut scratch);
    }

    debug!("Exponential of {n}x{n} matrix (norm {norm:.3e}) with {squarings} squarings");

    ensure_finite(result, "matrix exponential")
}

/// Number of halvings that bring `norm` down to `threshold`.
fn squarings_for(norm: f64, threshold: f64) -> u32 {
    if norm <= threshold || threshold <= 0.0 {
        0
    } else {
        (norm / threshold).log2().ceil().max(0.0) as u32
    }
}

/// I + A + A²/2! + …, stopping once a term is negligible.
fn taylor_exp(a: &Matrix, max_terms: usize, tolerance: f64) -> ManifoldResult<Matrix> {
    let n = a.dim();
    let mut sum = Matrix::identity(n);
    let mut term = Matrix::identity(n);
    let mut next = Matrix::zeros(n);

    for j in 1..=max_terms {
        term.mul_into(a, &mut next)?;
        std::mem::swap(&mut term, &mut next);
        term = term.scale(1.0 / j as f64);
        sum.add_scaled_assign(&term, 1.0)?;

        if term.frobenius_norm() <= tolerance * sum.frobenius_norm() {
            break;
        }
    }

    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifold::so_n;
    use std::f64::consts::PI;

    fn generator_2d(angle: f64) -> Matrix {
        Matrix::from_row_slice(2, &[0.0, -angle, angle, 0.0]).unwrap()
    }

    #[test]
    fn test_exp_zero_is_identity() {
        let result = expm(&Matrix::zeros(3), &MatrixFunctionConfig::default()).unwrap();
        assert_eq!(result, Matrix::identity(3));
    }

    #[test]
    fn test_exp_2d_generator() {
        let config = MatrixFunctionConfig::default();
        for &angle in &[1e-4, 0.4, PI / 2.0, PI, 5.0] {
            let result = expm(&generator_2d(angle), &config).unwrap();
            let (s, c) = angle.sin_cos();
            let expected = Matrix::from_row_slice(2, &[c, -s, s, c]).unwrap();
            assert!(
                result.approx_eq(&expected, 1e-12).unwrap(),
                "angle {angle}:\n{result}"
            );
        }
    }

    #[test]
    fn test_exp_of_skew_is_rotation() {
        let k = Matrix::from_rows(&[[0.0, -0.3, 0.8], [0.3, 0.0, -1.1], [-0.8, 1.1, 0.0]]).unwrap();
        let r = expm(&k, &MatrixFunctionConfig::default()).unwrap();
        assert!(so_n::is_special_orthogonal(&r, 1e-12));
    }

    #[test]
    fn test_exp_diagonal() {
        let k = Matrix::from_rows(&[[1.0, 0.0], [0.0, -2.0]]).unwrap();
        let r = expm(&k, &MatrixFunctionConfig::default()).unwrap();
        assert!((r[(0, 0)] - 1f64.exp()).abs() < 1e-12);
        assert!((r[(1, 1)] - (-2f64).exp()).abs() < 1e-14);
    }

    #[test]
    fn test_squarings_for() {
        assert_eq!(squarings_for(0.4, 0.5), 0);
        assert_eq!(squarings_for(1.0, 0.5), 1);
        assert_eq!(squarings_for(1.1, 0.5), 2);
        assert_eq!(squarings_for(16.0, 0.5), 5);
    }
}
