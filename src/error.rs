//! Error types for the so-geodesic library
//!
//! This module provides the crate-wide error and result types returned by the
//! geodesic API and the flat boundary functions. Subsystem errors convert into
//! [`KernelError`] through `From`, so `?` works across layers.

use crate::{linalg::LinAlgError, manifold::ManifoldError};
use thiserror::Error;

/// Main result type used throughout the so-geodesic library
pub type KernelResult<T> = Result<T, KernelError>;

/// Main error type for the so-geodesic library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Dense matrix errors (shape, construction, inversion)
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(#[from] LinAlgError),

    /// Logarithm and exponential failures
    #[error("Manifold error: {0}")]
    Manifold(#[from] ManifoldError),

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl KernelError {
    /// True if the failure is a shape problem in caller-supplied matrices.
    pub fn is_dimension_error(&self) -> bool {
        match self {
            KernelError::LinearAlgebra(err) | KernelError::Manifold(ManifoldError::LinAlg(err)) => {
                matches!(
                    err,
                    LinAlgError::DimensionMismatch { .. }
                        | LinAlgError::BufferLength { .. }
                        | LinAlgError::RaggedRows { .. }
                        | LinAlgError::InvalidDimension(_)
                )
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_error_display() {
        let error = KernelError::from(LinAlgError::Singular("3x3 matrix".to_string()));
        assert_eq!(
            error.to_string(),
            "Linear algebra error: Singular matrix: 3x3 matrix"
        );
    }

    #[test]
    fn test_kernel_error_from_manifold() {
        let error = KernelError::from(ManifoldError::NonConvergence {
            method: "square-root phase",
            iterations: 40,
        });
        match error {
            KernelError::Manifold(ManifoldError::NonConvergence { iterations, .. }) => {
                assert_eq!(iterations, 40)
            }
            _ => panic!("Expected manifold error"),
        }
    }

    #[test]
    fn test_is_dimension_error() {
        let error = KernelError::from(LinAlgError::DimensionMismatch {
            operation: "mul",
            left: 2,
            right: 3,
        });
        assert!(error.is_dimension_error());
        assert!(!KernelError::InvalidInput("step".to_string()).is_dimension_error());
    }

    #[test]
    fn test_is_dimension_error_through_manifold() {
        let wrapped = [
            LinAlgError::DimensionMismatch {
                operation: "mul_into",
                left: 3,
                right: 4,
            },
            LinAlgError::BufferLength {
                expected: 9,
                actual: 8,
            },
            LinAlgError::RaggedRows {
                row: 1,
                expected: 3,
                actual: 2,
            },
            LinAlgError::InvalidDimension(0),
        ];
        for err in wrapped {
            let error = KernelError::from(ManifoldError::from(err.clone()));
            assert!(error.is_dimension_error(), "{err}");
        }
        let singular = KernelError::from(ManifoldError::from(LinAlgError::Singular("2x2".into())));
        assert!(!singular.is_dimension_error());
    }

    #[test]
    fn test_kernel_result_err() {
        let result: KernelResult<f64> = Err(KernelError::InvalidInput("h must be > 0".into()));
        assert!(result.is_err());
    }
}
