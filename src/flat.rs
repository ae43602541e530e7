//! Flat row-major entry points.
//!
//! Matrices enter and leave as `&[f64]` / `Vec<f64>` buffers of length n² in
//! row-major order together with an explicit dimension `n`. Each call builds
//! a [`Geodesic`] with the requested [`LogMethod`] and default budgets.

use crate::error::KernelResult;
use crate::geodesic::Geodesic;
use crate::linalg::Matrix;
use crate::manifold::LogMethod;

fn geodesic(method: LogMethod) -> Geodesic {
    Geodesic::new().with_method(method)
}

/// log(M) of a flat n×n rotation.
pub fn log(m: &[f64], n: usize, method: LogMethod) -> KernelResult<Vec<f64>> {
    let m = Matrix::from_row_slice(n, m)?;
    Ok(geodesic(method).log(&m)?.to_row_major_vec())
}

/// exp(K) of a flat n×n generator.
pub fn exp(k: &[f64], n: usize) -> KernelResult<Vec<f64>> {
    let k = Matrix::from_row_slice(n, k)?;
    Ok(Geodesic::new().exp(&k)?.to_row_major_vec())
}

/// Geodesic distance between two flat n×n rotations.
pub fn distance(r: &[f64], t: &[f64], n: usize, method: LogMethod) -> KernelResult<f64> {
    let r = Matrix::from_row_slice(n, r)?;
    let t = Matrix::from_row_slice(n, t)?;
    geodesic(method).distance(&r, &t)
}

/// Point at parameter `t` on the geodesic from `a` to `b`.
pub fn interpolate(
    a: &[f64],
    b: &[f64],
    t: f64,
    n: usize,
    method: LogMethod,
) -> KernelResult<Vec<f64>> {
    let a = Matrix::from_row_slice(n, a)?;
    let b = Matrix::from_row_slice(n, b)?;
    Ok(geodesic(method).interpolate(&a, &b, t)?.to_row_major_vec())
}

/// Central-difference derivative of distance(R·exp(εK), T) at ε = 0 with
/// step `h`.
pub fn derivative(
    r: &[f64],
    t: &[f64],
    k: &[f64],
    n: usize,
    h: f64,
    method: LogMethod,
) -> KernelResult<f64> {
    let r = Matrix::from_row_slice(n, r)?;
    let t = Matrix::from_row_slice(n, t)?;
    let k = Matrix::from_row_slice(n, k)?;
    geodesic(method).derivative_with_step(&r, &t, &k, h)
}
