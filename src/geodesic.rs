//! Geodesic distance, interpolation and directional derivative on SO(n).
//!
//! With the bi-invariant metric, the geodesic between A and B is
//! γ(t) = A · exp(t · log(AᵀB)) and its length is ‖log(AᵀB)‖_F. [`Geodesic`]
//! bundles these operations behind one [`MatrixFunctionConfig`], which selects
//! the logarithm strategy and its iteration budgets.
//!
//! # Example
//!
//! ```rust
//! use so_geodesic::{Geodesic, LogMethod, linalg::Matrix, manifold::so_n};
//!
//! let geodesic = Geodesic::new().with_method(LogMethod::Schur);
//! let a = Matrix::identity(3);
//! let b = so_n::planar_rotation(3, 0, 1, 0.8);
//! let d = geodesic.distance(&a, &b).unwrap();
//! assert!((d - 0.8 * 2f64.sqrt()).abs() < 1e-10);
//! ```

use rayon::prelude::*;
use tracing::debug;

use crate::error::{KernelError, KernelResult};
use crate::linalg::Matrix;
use crate::manifold::{LogMethod, MatrixFunctionConfig, expm, log_with_fallback};

/// Geodesic operations on SO(n) with a fixed configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geodesic {
    config: MatrixFunctionConfig,
}

impl Geodesic {
    /// Create with the default configuration (scaling-and-squaring log with
    /// Schur fallback).
    pub fn new() -> Self {
        Self::with_config(MatrixFunctionConfig::default())
    }

    /// Create with the given configuration.
    pub fn with_config(config: MatrixFunctionConfig) -> Self {
        Self { config }
    }

    /// Select the logarithm strategy.
    pub fn with_method(mut self, method: LogMethod) -> Self {
        self.config.method = method;
        self
    }

    pub fn config(&self) -> &MatrixFunctionConfig {
        &self.config
    }

    /// Matrix logarithm of a rotation.
    pub fn log(&self, m: &Matrix) -> KernelResult<Matrix> {
        Ok(log_with_fallback(m, &self.config)?)
    }

    /// Matrix exponential of a generator.
    pub fn exp(&self, k: &Matrix) -> KernelResult<Matrix> {
        Ok(expm(k, &self.config)?)
    }

    /// Geodesic distance ‖log(RᵀT)‖_F.
    pub fn distance(&self, r: &Matrix, t: &Matrix) -> KernelResult<f64> {
        let relative = r.transpose().mul(t)?;
        Ok(self.log(&relative)?.frobenius_norm())
    }

    /// Point at parameter `t` on the geodesic from `a` (t = 0) to `b` (t = 1).
    ///
    /// Values of `t` outside [0, 1] extrapolate along the same geodesic.
    pub fn interpolate(&self, a: &Matrix, b: &Matrix, t: f64) -> KernelResult<Matrix> {
        if !t.is_finite() {
            return Err(KernelError::InvalidInput(format!(
                "interpolation parameter must be finite, got {t}"
            )));
        }
        let relative = a.transpose().mul(b)?;
        let generator = self.log(&relative)?;
        let step = self.exp(&generator.scale(t))?;
        Ok(a.mul(&step)?)
    }

    /// Derivative of ε ↦ distance(R·exp(εK), T) at ε = 0, using the
    /// configured finite-difference step.
    pub fn derivative(&self, r: &Matrix, t: &Matrix, k: &Matrix) -> KernelResult<f64> {
        self.derivative_with_step(r, t, k, self.config.derivative_step)
    }

    /// Central finite difference
    /// [distance(R·exp(hK), T) − distance(R·exp(−hK), T)] / 2h.
    pub fn derivative_with_step(
        &self,
        r: &Matrix,
        t: &Matrix,
        k: &Matrix,
        h: f64,
    ) -> KernelResult<f64> {
        if !(h.is_finite() && h > 0.0) {
            return Err(KernelError::InvalidInput(format!(
                "finite-difference step must be positive and finite, got {h}"
            )));
        }
        let forward = r.mul(&self.exp(&k.scale(h))?)?;
        let backward = r.mul(&self.exp(&k.scale(-h))?)?;
        let slope = (self.distance(&forward, t)? - self.distance(&backward, t)?) / (2.0 * h);
        Ok(slope)
    }

    /// Distances for many (R, T) pairs in parallel, in input order.
    ///
    /// Fails with the first error encountered if any pair fails.
    pub fn distance_batch(&self, pairs: &[(Matrix, Matrix)]) -> KernelResult<Vec<f64>> {
        debug!("Computing {} geodesic distances in parallel", pairs.len());
        pairs
            .par_iter()
            .map(|(r, t)| self.distance(r, t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::LinAlgError;
    use crate::manifold::so_n;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::PI;

    fn both_methods() -> [Geodesic; 2] {
        [
            Geodesic::new().with_method(LogMethod::ScalingSquaring),
            Geodesic::new().with_method(LogMethod::Schur),
        ]
    }

    #[test]
    fn test_distance_quarter_turn() {
        let identity = Matrix::identity(2);
        let r = so_n::planar_rotation(2, 0, 1, PI / 2.0);
        for geodesic in both_methods() {
            let d = geodesic.distance(&identity, &r).unwrap();
            assert!(d > 2.0 && d < 2.5, "distance {d}");
            assert!((d - 2f64.sqrt() * PI / 2.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_distance_dimension_mismatch() {
        let err = Geodesic::new()
            .distance(&Matrix::identity(2), &Matrix::identity(3))
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::LinearAlgebra(LinAlgError::DimensionMismatch {
                operation: "mul",
                left: 2,
                right: 3
            })
        );
    }

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = so_n::random_rotation(4, 0.3, &mut rng).unwrap();
        let b = so_n::random_rotation(4, 0.3, &mut rng).unwrap();
        for geodesic in both_methods() {
            let start = geodesic.interpolate(&a, &b, 0.0).unwrap();
            let end = geodesic.interpolate(&a, &b, 1.0).unwrap();
            assert!(start.approx_eq(&a, 1e-10).unwrap());
            assert!(end.approx_eq(&b, 1e-9).unwrap());

            let mid = geodesic.interpolate(&a, &b, 0.5).unwrap();
            let d1 = geodesic.distance(&a, &mid).unwrap();
            let d2 = geodesic.distance(&mid, &b).unwrap();
            assert!((d1 - d2).abs() < 1e-9, "{d1} vs {d2}");
        }
    }

    #[test]
    fn test_distance_rejects_empty_matrices() {
        let empty = Matrix::identity(0);
        for geodesic in both_methods() {
            let err = geodesic.distance(&empty, &empty).unwrap_err();
            assert!(err.is_dimension_error(), "{err}");
        }
    }

    #[test]
    fn test_interpolate_rejects_nan_parameter() {
        let a = Matrix::identity(2);
        let result = Geodesic::new().interpolate(&a, &a, f64::NAN);
        assert!(matches!(result, Err(KernelError::InvalidInput(_))));
    }

    #[test]
    fn test_derivative_along_generator() {
        // Moving R away from T along the plane of their relative rotation
        // changes the distance at rate ‖K‖_F.
        let geodesic = Geodesic::new();
        let r = Matrix::identity(3);
        let t = so_n::planar_rotation(3, 0, 1, 1.0);
        let k = Matrix::from_rows(&[[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 0.0]]).unwrap();
        let slope = geodesic.derivative(&r, &t, &k).unwrap();
        assert!((slope - 2f64.sqrt()).abs() < 1e-5, "slope {slope}");
    }

    #[test]
    fn test_derivative_rejects_bad_step() {
        let r = Matrix::identity(2);
        let k = Matrix::zeros(2);
        for h in [0.0, -1e-6, f64::INFINITY] {
            let result = Geodesic::new().derivative_with_step(&r, &r, &k, h);
            assert!(matches!(result, Err(KernelError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_distance_batch_preserves_order() {
        let geodesic = Geodesic::new();
        let identity = Matrix::identity(3);
        let pairs: Vec<(Matrix, Matrix)> = (1..=8)
            .map(|i| {
                let angle = 0.1 * i as f64;
                (identity.clone(), so_n::planar_rotation(3, 1, 2, angle))
            })
            .collect();
        let distances = geodesic.distance_batch(&pairs).unwrap();
        for (i, d) in distances.iter().enumerate() {
            let expected = 0.1 * (i + 1) as f64 * 2f64.sqrt();
            assert!((d - expected).abs() < 1e-10, "pair {i}: {d} vs {expected}");
        }
    }
}
