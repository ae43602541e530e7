//! Matrix functions on the rotation group SO(n).
//!
//! This module provides the numerical kernel behind the geodesic API:
//! - **Logarithm** SO(n) → so(n), with two independent implementations:
//!   - [`ScalingSquaringLog`]: repeated Denman–Beavers square roots, a Taylor
//!     series for log(I + X), then scaling back by 2^m
//!   - [`SchurLog`]: real Schur decomposition, reading each rotation angle off
//!     its 2×2 block
//! - **Exponential** so(n) → SO(n) by scaling and squaring ([`expm`])
//! - SO(n) helpers: planar rotations, random sampling, validity checks ([`so_n`])
//!
//! Lie group | size | dim      | X ∈ M | Constraint        | T_E M           | Exp(T)     | Log(X)
//! --------- | ---- | -------- | ----- | ----------------- | --------------- | ---------- | ----------
//! SO(n)     | n²   | n(n−1)/2 | R     | RᵀR = I, det R = 1 | K = −Kᵀ ∈ so(n) | R = exp(K) | K = log(R)
//!
//! # Choosing a method
//!
//! The method is an explicit, caller-visible choice through [`LogMethod`].
//! Both paths agree to within numerical tolerance on well-conditioned input, so
//! one can cross-check the other. When a method fails (non-convergence, a
//! singular iterate) the other is tried once if [`MatrixFunctionConfig::fallback`]
//! is set; if both fail the caller receives [`ManifoldError::BothMethodsFailed`].
//!
//! # Example
//!
//! ```rust
//! use so_geodesic::linalg::Matrix;
//! use so_geodesic::manifold::{log_with_fallback, expm, MatrixFunctionConfig};
//!
//! let (s, c) = 0.3_f64.sin_cos();
//! let r = Matrix::from_row_slice(2, &[c, -s, s, c]).unwrap();
//! let config = MatrixFunctionConfig::default();
//! let k = log_with_fallback(&r, &config).unwrap();
//! assert!((k[(1, 0)] - 0.3).abs() < 1e-10);
//! let back = expm(&k, &config).unwrap();
//! assert!(back.approx_eq(&r, 1e-10).unwrap());
//! ```

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::linalg::{DEFAULT_SCHUR_MAX_ITERATIONS, LinAlgError, Matrix};

pub mod exp;
pub mod log_scaling;
pub mod log_schur;
pub mod so_n;

pub use exp::expm;
pub use log_scaling::{ScalingSquaringLog, sqrtm_denman_beavers};
pub use log_schur::SchurLog;

/// Errors that can occur while evaluating matrix functions on SO(n).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifoldError {
    /// An iteration exhausted its bounded budget
    #[error("{method} did not converge within {iterations} iterations")]
    NonConvergence {
        method: &'static str,
        iterations: usize,
    },

    /// Input is not (close to) a member of the expected set
    #[error("Invalid manifold element: {0}")]
    InvalidElement(String),

    /// Numerical instability in computation
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// The primary method and its fallback both failed
    #[error("Matrix logarithm failed: {primary}; fallback also failed: {fallback}")]
    BothMethodsFailed {
        primary: Box<ManifoldError>,
        fallback: Box<ManifoldError>,
    },

    /// Underlying linear algebra error
    #[error(transparent)]
    LinAlg(#[from] LinAlgError),
}

impl ManifoldError {
    /// True for failures that another algorithm may not share.
    ///
    /// Shape errors are caller mistakes and are never retried.
    pub fn is_numerical(&self) -> bool {
        match self {
            ManifoldError::NonConvergence { .. }
            | ManifoldError::NumericalInstability(_)
            | ManifoldError::InvalidElement(_) => true,
            ManifoldError::LinAlg(err) => matches!(
                err,
                LinAlgError::Singular(_) | LinAlgError::NonConvergence { .. }
            ),
            ManifoldError::BothMethodsFailed { .. } => false,
        }
    }
}

/// Result type for manifold operations.
pub type ManifoldResult<T> = Result<T, ManifoldError>;

/// Strategy used to compute the matrix logarithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogMethod {
    /// Inverse scaling and squaring: Denman–Beavers square roots plus a
    /// Taylor series near the identity.
    #[default]
    ScalingSquaring,
    /// Real Schur decomposition with per-block angles.
    Schur,
}

impl LogMethod {
    /// The other method, used as the fallback.
    pub fn alternate(self) -> LogMethod {
        match self {
            LogMethod::ScalingSquaring => LogMethod::Schur,
            LogMethod::Schur => LogMethod::ScalingSquaring,
        }
    }
}

impl fmt::Display for LogMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogMethod::ScalingSquaring => write!(f, "scaling-squaring"),
            LogMethod::Schur => write!(f, "schur"),
        }
    }
}

impl std::str::FromStr for LogMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scaling-squaring" | "scaling" | "ss" => Ok(LogMethod::ScalingSquaring),
            "schur" | "eigen" => Ok(LogMethod::Schur),
            other => Err(format!("unknown log method '{other}'")),
        }
    }
}

/// Tuning knobs for the logarithm and exponential.
///
/// The defaults keep every iteration bounded; a call never runs longer than
/// the product of these caps.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixFunctionConfig {
    /// Logarithm strategy
    pub method: LogMethod,
    /// Try the other strategy once when the first fails
    pub fallback: bool,
    /// ‖M − I‖_F at or below this returns the zero generator directly
    pub identity_tolerance: f64,
    /// Stop square-rooting once ‖M_k − I‖_F drops below this
    pub sqrt_threshold: f64,
    /// Maximum number of square roots taken before giving up
    pub max_halvings: usize,
    /// Denman–Beavers iteration cap for a single square root
    pub sqrt_max_iterations: usize,
    /// Relative step size at which Denman–Beavers is considered converged
    pub sqrt_tolerance: f64,
    /// Maximum number of Taylor terms for log(I + X)
    pub taylor_max_terms: usize,
    /// Relative size of a series term below which summation stops
    pub series_tolerance: f64,
    /// QR sweep budget per deflated Schur block
    pub schur_max_iterations: usize,
    /// The exponential scales K until ‖K / 2^s‖_F is at most this
    pub exp_threshold: f64,
    /// Maximum number of Taylor terms for exp
    pub exp_max_terms: usize,
    /// Step h of the central finite difference in the geodesic derivative
    pub derivative_step: f64,
}

impl Default for MatrixFunctionConfig {
    fn default() -> Self {
        Self {
            method: LogMethod::ScalingSquaring,
            fallback: true,
            identity_tolerance: 1e-12,
            sqrt_threshold: 0.5,
            max_halvings: 40,
            sqrt_max_iterations: 50,
            sqrt_tolerance: 1e-13,
            taylor_max_terms: 60,
            series_tolerance: 1e-17,
            schur_max_iterations: DEFAULT_SCHUR_MAX_ITERATIONS,
            exp_threshold: 0.5,
            exp_max_terms: 40,
            derivative_step: 1e-6,
        }
    }
}

impl MatrixFunctionConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the logarithm strategy.
    pub fn with_method(mut self, method: LogMethod) -> Self {
        self.method = method;
        self
    }

    /// Enable or disable the one-shot fallback to the other strategy.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the identity short-circuit tolerance.
    pub fn with_identity_tolerance(mut self, tolerance: f64) -> Self {
        self.identity_tolerance = tolerance;
        self
    }

    /// Set the square-root threshold and the maximum number of halvings.
    pub fn with_sqrt_threshold(mut self, threshold: f64, max_halvings: usize) -> Self {
        self.sqrt_threshold = threshold;
        self.max_halvings = max_halvings;
        self
    }

    /// Set the Denman–Beavers iteration cap and tolerance.
    pub fn with_sqrt_iterations(mut self, max_iterations: usize, tolerance: f64) -> Self {
        self.sqrt_max_iterations = max_iterations;
        self.sqrt_tolerance = tolerance;
        self
    }

    /// Set the maximum number of Taylor terms for the logarithm.
    pub fn with_taylor_max_terms(mut self, terms: usize) -> Self {
        self.taylor_max_terms = terms;
        self
    }

    /// Set the QR sweep budget of the Schur path.
    pub fn with_schur_max_iterations(mut self, max_iterations: usize) -> Self {
        self.schur_max_iterations = max_iterations;
        self
    }

    /// Set the exponential scaling threshold and term cap.
    pub fn with_exp_series(mut self, threshold: f64, max_terms: usize) -> Self {
        self.exp_threshold = threshold;
        self.exp_max_terms = max_terms;
        self
    }

    /// Set the default finite-difference step.
    pub fn with_derivative_step(mut self, step: f64) -> Self {
        self.derivative_step = step;
        self
    }
}

impl fmt::Display for MatrixFunctionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MatrixFunctionConfig {{ method: {}, fallback: {}, sqrt_threshold: {}, max_halvings: {}, schur_max_iterations: {}, derivative_step: {:e} }}",
            self.method,
            self.fallback,
            self.sqrt_threshold,
            self.max_halvings,
            self.schur_max_iterations,
            self.derivative_step
        )
    }
}

/// A matrix logarithm for elements of SO(n).
///
/// Implementations assume the input is (approximately) orthogonal with
/// determinant +1 and do not validate it.
pub trait MatrixLogarithm: Send + Sync {
    /// Strategy implemented by this logarithm.
    fn method(&self) -> LogMethod;

    /// Compute log(M).
    fn log(&self, m: &Matrix) -> ManifoldResult<Matrix>;
}

/// Build the logarithm implementation for `method`.
pub fn logarithm_for(method: LogMethod, config: &MatrixFunctionConfig) -> Box<dyn MatrixLogarithm> {
    match method {
        LogMethod::ScalingSquaring => Box::new(ScalingSquaringLog::new(*config)),
        LogMethod::Schur => Box::new(SchurLog::new(*config)),
    }
}

/// Compute log(M) with the configured method, retrying once with the other
/// method on a numerical failure when `config.fallback` is set.
pub fn log_with_fallback(m: &Matrix, config: &MatrixFunctionConfig) -> ManifoldResult<Matrix> {
    let primary = logarithm_for(config.method, config);
    let primary_err = match primary.log(m) {
        Ok(log) => return Ok(log),
        Err(err) => err,
    };

    if !config.fallback || !primary_err.is_numerical() {
        return Err(primary_err);
    }

    let alternate = config.method.alternate();
    warn!(
        "{} logarithm failed ({}), falling back to {}",
        config.method, primary_err, alternate
    );

    logarithm_for(alternate, config)
        .log(m)
        .map_err(|fallback_err| ManifoldError::BothMethodsFailed {
            primary: Box::new(primary_err),
            fallback: Box::new(fallback_err),
        })
}

/// Reject the empty 0×0 matrix.
pub(crate) fn ensure_non_empty(m: &Matrix) -> ManifoldResult<()> {
    if m.dim() == 0 {
        return Err(LinAlgError::InvalidDimension(0).into());
    }
    Ok(())
}

/// Reject results carrying NaN or infinite entries.
pub(crate) fn ensure_finite(m: Matrix, what: &str) -> ManifoldResult<Matrix> {
    if m.is_finite() {
        Ok(m)
    } else {
        Err(ManifoldError::NumericalInstability(format!(
            "{what} produced non-finite entries"
        )))
    }
}
