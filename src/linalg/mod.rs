//! Dense linear algebra for small square matrices.
//!
//! This module provides the numerical building blocks used by the SO(n)
//! matrix functions:
//! - [`Matrix`]: an n×n dense matrix whose dimension is fixed at construction
//! - [`RealSchur`]: real Schur decomposition via Hessenberg reduction and
//!   Francis double-shift QR iteration
//!
//! Every binary operation checks dimensions and reports a [`LinAlgError`]
//! instead of truncating or padding.

use thiserror::Error;

pub mod dense;
pub mod schur;

pub use dense::*;
pub use schur::*;

/// Errors raised by the dense linear algebra layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinAlgError {
    /// Operands of a binary operation have different dimensions
    #[error("Dimension mismatch in {operation}: {left}x{left} vs {right}x{right}")]
    DimensionMismatch {
        operation: &'static str,
        left: usize,
        right: usize,
    },

    /// A matrix dimension of zero was requested
    #[error("Invalid matrix dimension: {0}")]
    InvalidDimension(usize),

    /// A flat buffer does not hold exactly n² values
    #[error("Buffer length {actual} does not match n*n = {expected}")]
    BufferLength { expected: usize, actual: usize },

    /// Nested rows do not form a square matrix
    #[error("Row {row} has {actual} entries, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Input contains NaN or infinite entries
    #[error("Non-finite entry at ({row}, {col})")]
    NonFinite { row: usize, col: usize },

    /// Matrix could not be inverted
    #[error("Singular matrix: {0}")]
    Singular(String),

    /// An iterative decomposition exhausted its iteration budget
    #[error("{algorithm} did not converge within {iterations} iterations")]
    NonConvergence {
        algorithm: &'static str,
        iterations: usize,
    },
}

/// Result type for linear algebra operations.
pub type LinAlgResult<T> = Result<T, LinAlgError>;
