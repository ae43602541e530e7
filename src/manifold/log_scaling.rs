//! Inverse scaling-and-squaring logarithm.
//!
//! log(M) = 2^m · log(M^{1/2^m}): square roots are taken until the running
//! matrix is within `sqrt_threshold` of the identity in Frobenius norm, the
//! series log(I + X) = X − X²/2 + X³/3 − … is summed there, and the result is
//! scaled back by 2^m.

use tracing::debug;

use super::{
    LogMethod, ManifoldError, ManifoldResult, MatrixFunctionConfig, MatrixLogarithm, ensure_finite,
    ensure_non_empty,
};
use crate::linalg::Matrix;

/// Largest accepted ‖Y² − M‖_F / ‖M‖_F for a converged square root.
const SQRT_RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Matrix logarithm by repeated square roots and a Taylor series.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalingSquaringLog {
    config: MatrixFunctionConfig,
}

impl ScalingSquaringLog {
    pub fn new(config: MatrixFunctionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatrixFunctionConfig {
        &self.config
    }
}

impl MatrixLogarithm for ScalingSquaringLog {
    fn method(&self) -> LogMethod {
        LogMethod::ScalingSquaring
    }

    fn log(&self, m: &Matrix) -> ManifoldResult<Matrix> {
        ensure_non_empty(m)?;
        let config = &self.config;
        let n = m.dim();

        if m.distance_to_identity() <= config.identity_tolerance {
            return Ok(Matrix::zeros(n));
        }

        let mut current = m.clone();
        let mut halvings = 0;
        while current.distance_to_identity() >= config.sqrt_threshold {
            if halvings >= config.max_halvings {
                return Err(ManifoldError::NonConvergence {
                    method: "square-root phase",
                    iterations: halvings,
                });
            }
            current = sqrtm_denman_beavers(
                &current,
                config.sqrt_max_iterations,
                config.sqrt_tolerance,
            )?;
            halvings += 1;
        }

        let series = log_near_identity(&current, config.taylor_max_terms, config.series_tolerance)?;

        debug!(
            "Scaling-squaring log of {n}x{n} matrix: {halvings} halvings, residual {:.3e}",
            current.distance_to_identity()
        );

        let factor = 2f64.powi(halvings as i32);
        ensure_finite(series.scale(factor), "scaling-squaring logarithm")
    }
}

/// Principal square root by the Denman–Beavers iteration.
///
/// Y₀ = M, Z₀ = I, Y_{k+1} = (Y_k + Z_k⁻¹)/2, Z_{k+1} = (Z_k + Y_k⁻¹)/2, with
/// Y_k → M^{1/2}. Fails with [`ManifoldError::NonConvergence`] when the
/// iteration budget runs out, and with a singular-matrix error when an iterate
/// cannot be inverted (as happens for eigenvalues on the negative real axis).
pub fn sqrtm_denman_beavers(
    m: &Matrix,
    max_iterations: usize,
    tolerance: f64,
) -> ManifoldResult<Matrix> {
    let mut y = m.clone();
    let mut z = Matrix::identity(m.dim());
    let mut previous_step = f64::INFINITY;

    for iteration in 1..=max_iterations {
        let y_inv = y.try_inverse()?;
        let z_inv = z.try_inverse()?;

        let next_y = y.add(&z_inv)?.scale(0.5);
        z = z.add(&y_inv)?.scale(0.5);

        let step = next_y.sub(&y)?.frobenius_norm();
        let size = next_y.frobenius_norm();
        y = next_y;

        if !y.is_finite() {
            return Err(ManifoldError::NumericalInstability(
                "Denman-Beavers iterate became non-finite".to_string(),
            ));
        }

        // Converged, or stalled at rounding level.
        if step <= tolerance * size
            || (step <= tolerance.sqrt() * size && step >= previous_step)
        {
            let residual = y.mul(&y)?.sub(m)?.frobenius_norm();
            if residual > SQRT_RESIDUAL_TOLERANCE * m.frobenius_norm() {
                return Err(ManifoldError::NumericalInstability(format!(
                    "Denman-Beavers iterate is not a square root (residual {residual:.3e})"
                )));
            }
            debug!("Denman-Beavers square root converged in {iteration} iterations");
            return Ok(y);
        }
        previous_step = step;
    }

    Err(ManifoldError::NonConvergence {
        method: "Denman-Beavers square root",
        iterations: max_iterations,
    })
}

/// Sum log(I + X) with X = M − I, stopping once a term is negligible.
fn log_near_identity(m: &Matrix, max_terms: usize, tolerance: f64) -> ManifoldResult<Matrix> {
    let n = m.dim();
    let x = m.sub(&Matrix::identity(n))?;
    let mut sum = x.clone();
    let mut power = x.clone();
    let mut next = Matrix::zeros(n);

    for k in 2..=max_terms {
        power.mul_into(&x, &mut next)?;
        std::mem::swap(&mut power, &mut next);

        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        let coefficient = sign / k as f64;
        sum.add_scaled_assign(&power, coefficient)?;

        if power.frobenius_norm() / k as f64 <= tolerance * sum.frobenius_norm() {
            break;
        }
    }

    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::LinAlgError;
    use std::f64::consts::PI;

    fn rotation_2d(angle: f64) -> Matrix {
        let (s, c) = angle.sin_cos();
        Matrix::from_row_slice(2, &[c, -s, s, c]).unwrap()
    }

    #[test]
    fn test_identity_short_circuit() {
        let log = ScalingSquaringLog::default();
        let result = log.log(&Matrix::identity(4)).unwrap();
        assert_eq!(result.frobenius_norm(), 0.0);
        assert_eq!(result.dim(), 4);
    }

    #[test]
    fn test_log_2d_rotation_angles() {
        let log = ScalingSquaringLog::default();
        for &angle in &[0.001, 0.3, 1.0, PI / 2.0, 2.5, 3.0] {
            let result = log.log(&rotation_2d(angle)).unwrap();
            assert!(
                (result[(1, 0)] - angle).abs() < 1e-9,
                "angle {angle}: got {}",
                result[(1, 0)]
            );
            assert!((result[(0, 1)] + angle).abs() < 1e-9);
            assert!(result[(0, 0)].abs() < 1e-9);
            assert!(result[(1, 1)].abs() < 1e-9);
        }
    }

    #[test]
    fn test_log_3d_axis_rotation() {
        // Rotation by 1.2 about the z axis.
        let (s, c) = 1.2_f64.sin_cos();
        let r = Matrix::from_rows(&[[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]).unwrap();
        let result = ScalingSquaringLog::default().log(&r).unwrap();
        assert!((result[(1, 0)] - 1.2).abs() < 1e-9);
        assert!(result[(2, 2)].abs() < 1e-12);
        assert!(result[(0, 2)].abs() < 1e-12);
    }

    #[test]
    fn test_sqrt_of_rotation() {
        let r = rotation_2d(1.4);
        let root = sqrtm_denman_beavers(&r, 50, 1e-13).unwrap();
        assert!(root.approx_eq(&rotation_2d(0.7), 1e-12).unwrap());
        let squared = root.mul(&root).unwrap();
        assert!(squared.approx_eq(&r, 1e-12).unwrap());
    }

    #[test]
    fn test_sqrt_of_half_turn_is_singular() {
        let r = Matrix::identity(2).scale(-1.0);
        let err = sqrtm_denman_beavers(&r, 50, 1e-13).unwrap_err();
        assert!(matches!(err, ManifoldError::LinAlg(LinAlgError::Singular(_))));
    }

    #[test]
    fn test_halving_budget_exhausted() {
        let config = MatrixFunctionConfig::default().with_sqrt_threshold(0.5, 1);
        let err = ScalingSquaringLog::new(config)
            .log(&rotation_2d(3.0))
            .unwrap_err();
        assert_eq!(
            err,
            ManifoldError::NonConvergence {
                method: "square-root phase",
                iterations: 1
            }
        );
    }

    #[test]
    fn test_taylor_series_small_argument() {
        let m = rotation_2d(0.2);
        let series = log_near_identity(&m, 60, 1e-17).unwrap();
        assert!((series[(1, 0)] - 0.2).abs() < 1e-14);
    }
}
