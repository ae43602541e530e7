//! Matrix logarithm of a rotation through its real Schur form.
//!
//! For R ∈ SO(n) the real Schur form R = Q T Qᵀ is block diagonal: 2×2
//! blocks [[c, −s], [s, c]] for conjugate pairs e^{±iθ} and 1×1 blocks ±1.
//! The logarithm is assembled block by block in Schur coordinates and mapped
//! back with Q, so the result is skew-symmetric by construction.
//!
//! Eigenvalues equal to −1 have no real principal logarithm on their own. They
//! are paired in order of appearance and each pair is treated as a rotation by
//! π in the plane of the two Schur vectors. The choice of plane is a
//! convention: exp of the result still reproduces R, but the logarithm is not
//! unique there.

use std::f64::consts::PI;

use tracing::{debug, warn};

use super::{
    LogMethod, ManifoldError, ManifoldResult, MatrixFunctionConfig, MatrixLogarithm, ensure_finite,
    ensure_non_empty,
};
use crate::linalg::{Matrix, RealSchur, SchurBlock};

/// Matrix logarithm by real Schur decomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchurLog {
    config: MatrixFunctionConfig,
}

impl SchurLog {
    pub fn new(config: MatrixFunctionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatrixFunctionConfig {
        &self.config
    }
}

impl MatrixLogarithm for SchurLog {
    fn method(&self) -> LogMethod {
        LogMethod::Schur
    }

    fn log(&self, m: &Matrix) -> ManifoldResult<Matrix> {
        ensure_non_empty(m)?;
        let n = m.dim();
        if m.distance_to_identity() <= self.config.identity_tolerance {
            return Ok(Matrix::zeros(n));
        }

        let schur = RealSchur::decompose(m, self.config.schur_max_iterations)?;
        let generator = block_generator(&schur.blocks(), n)?;
        let log = schur.reconstruct(&generator)?;

        debug!(
            "Schur log of {n}x{n} matrix after {} QR sweeps",
            schur.sweeps()
        );

        ensure_finite(log, "Schur logarithm")
    }
}

/// Skew-symmetric generator in Schur coordinates.
fn block_generator(blocks: &[SchurBlock], n: usize) -> ManifoldResult<Matrix> {
    let mut generator = Matrix::zeros(n);
    let mut negative = Vec::new();

    for block in blocks {
        match *block {
            SchurBlock::Pair { index, angle, .. } => {
                generator[(index + 1, index)] = angle;
                generator[(index, index + 1)] = -angle;
            }
            SchurBlock::Real { index, value } => {
                if value < 0.0 {
                    negative.push(index);
                }
            }
        }
    }

    if negative.len() % 2 == 1 {
        return Err(ManifoldError::InvalidElement(format!(
            "odd number ({}) of negative real eigenvalues; determinant is -1",
            negative.len()
        )));
    }

    if !negative.is_empty() {
        warn!(
            "Eigenvalue -1 with multiplicity {}: using a rotation by pi in the Schur planes {:?}",
            negative.len(),
            negative.chunks(2).collect::<Vec<_>>()
        );
    }

    for pair in negative.chunks_exact(2) {
        let (i, j) = (pair[0], pair[1]);
        generator[(j, i)] = PI;
        generator[(i, j)] = -PI;
    }

    Ok(generator)
}
