//! Real Schur decomposition M = Q T Qᵀ.
//!
//! The decomposition runs in two stages:
//! 1. Householder reduction to upper Hessenberg form, accumulating the
//!    orthogonal similarity into Q.
//! 2. Francis implicit double-shift QR iteration with deflation, continuing to
//!    accumulate into Q, until T is quasi-upper-triangular.
//!
//! T ends up with 1×1 diagonal blocks for real eigenvalues and 2×2 diagonal
//! blocks for complex-conjugate pairs. Real 2×2 pairs are split by a Givens
//! rotation so that every remaining 2×2 block carries complex eigenvalues.
//!
//! For an orthogonal input the Schur form is block diagonal: each 1×1 block is
//! ±1 and each 2×2 block is a planar rotation [[c, −s], [s, c]].

use tracing::debug;

use super::{LinAlgError, LinAlgResult, Matrix};

/// Default per-eigenvalue iteration budget for the QR sweeps.
pub const DEFAULT_SCHUR_MAX_ITERATIONS: usize = 60;

/// A diagonal block of the quasi-triangular factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchurBlock {
    /// 1×1 block holding a real eigenvalue.
    Real { index: usize, value: f64 },
    /// 2×2 block at rows/columns `index` and `index + 1` holding the pair
    /// `modulus · e^{±i·angle}`. The angle is read off the rotation part of the
    /// block and lies in (−π, π].
    Pair {
        index: usize,
        angle: f64,
        modulus: f64,
    },
}

/// Result of a real Schur decomposition.
#[derive(Debug, Clone)]
pub struct RealSchur {
    q: Matrix,
    t: Matrix,
    pair_starts: Vec<bool>,
    sweeps: usize,
}

impl RealSchur {
    /// Decompose `m`, allowing at most `max_iterations` QR sweeps per
    /// deflated eigenvalue or pair.
    pub fn decompose(m: &Matrix, max_iterations: usize) -> LinAlgResult<Self> {
        let n = m.dim();
        let mut h = m.clone();
        let mut q = Matrix::identity(n);

        reduce_to_hessenberg(&mut h, &mut q);
        let (pair_starts, sweeps) = francis_qr(&mut h, &mut q, max_iterations)?;
        clear_below_blocks(&mut h, &pair_starts);

        debug!("Real Schur of {n}x{n} matrix converged after {sweeps} QR sweeps");

        Ok(RealSchur {
            q,
            t: h,
            pair_starts,
            sweeps,
        })
    }

    /// Orthogonal factor Q.
    pub fn q(&self) -> &Matrix {
        &self.q
    }

    /// Quasi-upper-triangular factor T.
    pub fn t(&self) -> &Matrix {
        &self.t
    }

    /// Total number of QR sweeps spent.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Diagonal blocks of T in order.
    pub fn blocks(&self) -> Vec<SchurBlock> {
        let n = self.t.dim();
        let t = &self.t;
        let mut blocks = Vec::with_capacity(n);
        let mut i = 0;
        while i < n {
            if i + 1 < n && self.pair_starts[i] {
                let c = 0.5 * (t[(i, i)] + t[(i + 1, i + 1)]);
                let s = 0.5 * (t[(i + 1, i)] - t[(i, i + 1)]);
                blocks.push(SchurBlock::Pair {
                    index: i,
                    angle: s.atan2(c),
                    modulus: c.hypot(s),
                });
                i += 2;
            } else {
                blocks.push(SchurBlock::Real {
                    index: i,
                    value: t[(i, i)],
                });
                i += 1;
            }
        }
        blocks
    }

    /// Largest absolute entry of T outside its diagonal blocks.
    ///
    /// Zero up to rounding for normal (in particular orthogonal) input.
    pub fn off_block_magnitude(&self) -> f64 {
        let n = self.t.dim();
        let mut in_block = vec![usize::MAX; n];
        let mut i = 0;
        while i < n {
            in_block[i] = i;
            if i + 1 < n && self.pair_starts[i] {
                in_block[i + 1] = i;
                i += 2;
            } else {
                i += 1;
            }
        }
        let mut max = 0.0_f64;
        for row in 0..n {
            for col in 0..n {
                if in_block[row] != in_block[col] && col + 1 >= row {
                    max = max.max(self.t[(row, col)].abs());
                }
            }
        }
        max
    }

    /// Reassemble Q F Qᵀ for a matrix F expressed in Schur coordinates.
    pub fn reconstruct(&self, f: &Matrix) -> LinAlgResult<Matrix> {
        self.q.mul(f)?.mul(&self.q.transpose())
    }
}

/// Householder reduction to upper Hessenberg form: H ← Pᵀ H P, Q ← Q P.
fn reduce_to_hessenberg(h: &mut Matrix, q: &mut Matrix) {
    let n = h.dim();
    if n < 3 {
        return;
    }
    let high = n - 1;
    let mut ort = vec![0.0; n];

    for m in 1..high {
        let scale: f64 = (m..=high).map(|i| h[(i, m - 1)].abs()).sum();
        if scale == 0.0 {
            continue;
        }

        let mut sum_sq = 0.0;
        for i in (m..=high).rev() {
            ort[i] = h[(i, m - 1)] / scale;
            sum_sq += ort[i] * ort[i];
        }
        let mut g = sum_sq.sqrt();
        if ort[m] > 0.0 {
            g = -g;
        }
        sum_sq -= ort[m] * g;
        ort[m] -= g;

        // Apply the reflector from the left...
        for j in m..n {
            let f: f64 = (m..=high).rev().map(|i| ort[i] * h[(i, j)]).sum::<f64>() / sum_sq;
            for i in m..=high {
                h[(i, j)] -= f * ort[i];
            }
        }
        // ...and from the right.
        for i in 0..=high {
            let f: f64 = (m..=high).rev().map(|j| ort[j] * h[(i, j)]).sum::<f64>() / sum_sq;
            for j in m..=high {
                h[(i, j)] -= f * ort[j];
            }
        }
        ort[m] *= scale;
        h[(m, m - 1)] = scale * g;
    }

    // Accumulate the reflectors into Q.
    for m in (1..high).rev() {
        if h[(m, m - 1)] == 0.0 {
            continue;
        }
        for i in (m + 1)..=high {
            ort[i] = h[(i, m - 1)];
        }
        for j in m..=high {
            let dot: f64 = (m..=high).map(|i| ort[i] * q[(i, j)]).sum();
            // Two divisions guard against underflow.
            let g = (dot / ort[m]) / h[(m, m - 1)];
            for i in m..=high {
                q[(i, j)] += g * ort[i];
            }
        }
    }

    // Clear the Householder vectors stored below the subdiagonal.
    for col in 0..n {
        for row in (col + 2)..n {
            h[(row, col)] = 0.0;
        }
    }
}

/// Zero everything below the diagonal blocks.
///
/// The QR sweeps skip writing entries that vanish in exact arithmetic (bulge
/// remnants and deflated subdiagonals), so they are cleared once at the end.
fn clear_below_blocks(t: &mut Matrix, pair_starts: &[bool]) {
    let n = t.dim();
    for col in 0..n {
        for row in (col + 1)..n {
            if row == col + 1 && pair_starts[col] {
                continue;
            }
            t[(row, col)] = 0.0;
        }
    }
}

/// Francis double-shift QR on an upper Hessenberg matrix.
///
/// Returns the 2×2 block starts and the total number of sweeps.
fn francis_qr(
    h: &mut Matrix,
    q: &mut Matrix,
    max_iterations: usize,
) -> LinAlgResult<(Vec<bool>, usize)> {
    let size = h.dim();
    let mut pair_starts = vec![false; size];
    let eps = f64::EPSILON;
    let mut exshift = 0.0;
    let mut total_sweeps = 0;

    let mut norm = 0.0;
    for i in 0..size {
        for j in i.saturating_sub(1)..size {
            norm += h[(i, j)].abs();
        }
    }

    // `active` is the last row of the still unreduced trailing window.
    let mut active = size as isize - 1;
    let mut iter = 0;

    while active >= 0 {
        let n = active as usize;

        // Look for a single small subdiagonal element.
        let mut l = n;
        while l > 0 {
            let mut s = h[(l - 1, l - 1)].abs() + h[(l, l)].abs();
            if s == 0.0 {
                s = norm;
            }
            if h[(l, l - 1)].abs() < eps * s {
                break;
            }
            l -= 1;
        }

        if l == n {
            // One real root.
            h[(n, n)] += exshift;
            active -= 1;
            iter = 0;
        } else if l + 1 == n {
            // Two roots.
            let w = h[(n, n - 1)] * h[(n - 1, n)];
            let p = (h[(n - 1, n - 1)] - h[(n, n)]) / 2.0;
            let disc = p * p + w;
            let mut z = disc.abs().sqrt();
            h[(n, n)] += exshift;
            h[(n - 1, n - 1)] += exshift;

            if disc >= 0.0 {
                // Real pair: rotate the block to upper triangular.
                z = if p >= 0.0 { p + z } else { p - z };
                let x = h[(n, n - 1)];
                let s = x.abs() + z.abs();
                if s == 0.0 {
                    active -= 2;
                    iter = 0;
                    continue;
                }
                let (mut pr, mut qr) = (x / s, z / s);
                let r = (pr * pr + qr * qr).sqrt();
                pr /= r;
                qr /= r;

                for j in (n - 1)..size {
                    let zz = h[(n - 1, j)];
                    h[(n - 1, j)] = qr * zz + pr * h[(n, j)];
                    h[(n, j)] = qr * h[(n, j)] - pr * zz;
                }
                for i in 0..=n {
                    let zz = h[(i, n - 1)];
                    h[(i, n - 1)] = qr * zz + pr * h[(i, n)];
                    h[(i, n)] = qr * h[(i, n)] - pr * zz;
                }
                for i in 0..size {
                    let zz = q[(i, n - 1)];
                    q[(i, n - 1)] = qr * zz + pr * q[(i, n)];
                    q[(i, n)] = qr * q[(i, n)] - pr * zz;
                }
                h[(n, n - 1)] = 0.0;
            } else {
                pair_starts[n - 1] = true;
            }
            active -= 2;
            iter = 0;
        } else {
            // No convergence yet: form the shift.
            let mut x = h[(n, n)];
            let mut y = h[(n - 1, n - 1)];
            let mut w = h[(n, n - 1)] * h[(n - 1, n)];

            if iter == 10 {
                // Wilkinson's ad hoc shift.
                exshift += x;
                for i in 0..=n {
                    h[(i, i)] -= x;
                }
                let s = h[(n, n - 1)].abs() + h[(n - 1, n - 2)].abs();
                x = 0.75 * s;
                y = x;
                w = -0.4375 * s * s;
            }
            if iter == 30 {
                // Exceptional shift for stagnating windows.
                let mut s = (y - x) / 2.0;
                s = s * s + w;
                if s > 0.0 {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / 2.0 + s);
                    for i in 0..=n {
                        h[(i, i)] -= s;
                    }
                    exshift += s;
                    x = 0.964;
                    y = x;
                    w = x;
                }
            }

            iter += 1;
            total_sweeps += 1;
            if iter > max_iterations {
                return Err(LinAlgError::NonConvergence {
                    algorithm: "Francis double-shift QR",
                    iterations: iter - 1,
                });
            }

            // Look for two consecutive small subdiagonal elements.
            let mut m = n - 2;
            let mut p: f64;
            let mut qq: f64;
            let mut r: f64;
            loop {
                let z = h[(m, m)];
                let rr = x - z;
                let ss = y - z;
                p = (rr * ss - w) / h[(m + 1, m)] + h[(m, m + 1)];
                qq = h[(m + 1, m + 1)] - z - rr - ss;
                r = h[(m + 2, m + 1)];
                let s = p.abs() + qq.abs() + r.abs();
                p /= s;
                qq /= s;
                r /= s;
                if m == l {
                    break;
                }
                if h[(m, m - 1)].abs() * (qq.abs() + r.abs())
                    < eps * (p.abs() * (h[(m - 1, m - 1)].abs() + z.abs() + h[(m + 1, m + 1)].abs()))
                {
                    break;
                }
                m -= 1;
            }

            for i in (m + 2)..=n {
                h[(i, i - 2)] = 0.0;
                if i > m + 2 {
                    h[(i, i - 3)] = 0.0;
                }
            }

            // Double QR step on rows l..=n and columns m..=n.
            for k in m..n {
                let notlast = k != n - 1;
                let mut scale = 1.0;
                if k != m {
                    p = h[(k, k - 1)];
                    qq = h[(k + 1, k - 1)];
                    r = if notlast { h[(k + 2, k - 1)] } else { 0.0 };
                    scale = p.abs() + qq.abs() + r.abs();
                    if scale == 0.0 {
                        continue;
                    }
                    p /= scale;
                    qq /= scale;
                    r /= scale;
                }

                let mut s = (p * p + qq * qq + r * r).sqrt();
                if p < 0.0 {
                    s = -s;
                }
                if s == 0.0 {
                    continue;
                }
                if k != m {
                    h[(k, k - 1)] = -s * scale;
                } else if l != m {
                    h[(k, k - 1)] = -h[(k, k - 1)];
                }
                p += s;
                let vx = p / s;
                let vy = qq / s;
                let vz = r / s;
                qq /= p;
                r /= p;

                // Row modification.
                for j in k..size {
                    let mut t = h[(k, j)] + qq * h[(k + 1, j)];
                    if notlast {
                        t += r * h[(k + 2, j)];
                        h[(k + 2, j)] -= t * vz;
                    }
                    h[(k, j)] -= t * vx;
                    h[(k + 1, j)] -= t * vy;
                }

                // Column modification.
                for i in 0..=n.min(k + 3) {
                    let mut t = vx * h[(i, k)] + vy * h[(i, k + 1)];
                    if notlast {
                        t += vz * h[(i, k + 2)];
                        h[(i, k + 2)] -= t * r;
                    }
                    h[(i, k)] -= t;
                    h[(i, k + 1)] -= t * qq;
                }

                // Accumulate transformations.
                for i in 0..size {
                    let mut t = vx * q[(i, k)] + vy * q[(i, k + 1)];
                    if notlast {
                        t += vz * q[(i, k + 2)];
                        q[(i, k + 2)] -= t * r;
                    }
                    q[(i, k)] -= t;
                    q[(i, k + 1)] -= t * qq;
                }
            }
        }
    }

    Ok((pair_starts, total_sweeps))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-10;

    fn rotation_2d(angle: f64) -> Matrix {
        let (s, c) = angle.sin_cos();
        Matrix::from_row_slice(2, &[c, -s, s, c]).unwrap()
    }

    fn assert_reconstructs(m: &Matrix, schur: &RealSchur) {
        let back = schur.reconstruct(schur.t()).unwrap();
        let err = back.max_abs_diff(m).unwrap();
        assert!(err < 1e-9, "Q T Q^T differs from input by {err}");

        let q = schur.q();
        let qtq = q.transpose().mul(q).unwrap();
        assert!(
            qtq.distance_to_identity() < 1e-9,
            "Q is not orthogonal: {}",
            qtq.distance_to_identity()
        );
    }

    #[test]
    fn test_schur_identity() {
        let m = Matrix::identity(4);
        let schur = RealSchur::decompose(&m, DEFAULT_SCHUR_MAX_ITERATIONS).unwrap();
        for block in schur.blocks() {
            match block {
                SchurBlock::Real { value, .. } => assert!((value - 1.0).abs() < TOLERANCE),
                SchurBlock::Pair { .. } => panic!("identity has no complex pairs"),
            }
        }
        assert_eq!(schur.sweeps(), 0);
    }

    #[test]
    fn test_schur_2d_rotation_angle() {
        let angle = 0.7;
        let m = rotation_2d(angle);
        let schur = RealSchur::decompose(&m, DEFAULT_SCHUR_MAX_ITERATIONS).unwrap();
        let blocks = schur.blocks();
        assert_eq!(blocks.len(), 1);
        match blocks[0] {
            SchurBlock::Pair { angle: a, modulus, .. } => {
                assert!((a.abs() - angle).abs() < TOLERANCE, "angle {a}");
                assert!((modulus - 1.0).abs() < TOLERANCE);
            }
            other => panic!("expected a pair, got {other:?}"),
        }
        assert_reconstructs(&m, &schur);
    }

    #[test]
    fn test_schur_general_matrix() {
        let m = Matrix::from_row_slice(
            4,
            &[
                4.0, 1.0, -2.0, 2.0, 1.0, 2.0, 0.0, 1.0, -2.0, 0.0, 3.0, -2.0, 2.0, 1.0, -2.0, -1.0,
            ],
        )
        .unwrap();
        let schur = RealSchur::decompose(&m, DEFAULT_SCHUR_MAX_ITERATIONS).unwrap();
        assert_reconstructs(&m, &schur);

        let t = schur.t();
        for row in 2..4 {
            for col in 0..row - 1 {
                assert!(t[(row, col)].abs() < TOLERANCE, "T not quasi-triangular");
            }
        }
    }

    #[test]
    fn test_schur_block_diagonal_rotation() {
        // Rotation by 0.4 in the (0,1) plane and 2.5 in the (2,3) plane, mixed by
        // a fixed orthogonal change of basis.
        let (s1, c1) = 0.4_f64.sin_cos();
        let (s2, c2) = 2.5_f64.sin_cos();
        let d = Matrix::from_row_slice(
            4,
            &[
                c1, -s1, 0.0, 0.0, s1, c1, 0.0, 0.0, 0.0, 0.0, c2, -s2, 0.0, 0.0, s2, c2,
            ],
        )
        .unwrap();
        let h = 0.5;
        let p = Matrix::from_row_slice(
            4,
            &[h, h, h, h, h, -h, h, -h, h, h, -h, -h, h, -h, -h, h],
        )
        .unwrap();
        let m = p.mul(&d).unwrap().mul(&p.transpose()).unwrap();

        let schur = RealSchur::decompose(&m, DEFAULT_SCHUR_MAX_ITERATIONS).unwrap();
        assert_reconstructs(&m, &schur);
        assert!(schur.off_block_magnitude() < 1e-9);

        let mut angles: Vec<f64> = schur
            .blocks()
            .into_iter()
            .filter_map(|b| match b {
                SchurBlock::Pair { angle, .. } => Some(angle.abs()),
                SchurBlock::Real { .. } => None,
            })
            .collect();
        angles.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(angles.len(), 2);
        assert!((angles[0] - 0.4).abs() < 1e-9);
        assert!((angles[1] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_schur_reflection_pair_is_split() {
        // diag(1, -1) rotated: real eigenvalues must come out as 1x1 blocks.
        let r = rotation_2d(0.3);
        let d = Matrix::from_row_slice(2, &[1.0, 0.0, 0.0, -1.0]).unwrap();
        let m = r.mul(&d).unwrap().mul(&r.transpose()).unwrap();

        let schur = RealSchur::decompose(&m, DEFAULT_SCHUR_MAX_ITERATIONS).unwrap();
        let mut values: Vec<f64> = schur
            .blocks()
            .into_iter()
            .map(|b| match b {
                SchurBlock::Real { value, .. } => value,
                SchurBlock::Pair { .. } => panic!("reflection has real eigenvalues"),
            })
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));
        assert!((values[0] + 1.0).abs() < TOLERANCE);
        assert!((values[1] - 1.0).abs() < TOLERANCE);
        assert_reconstructs(&m, &schur);
    }

    #[test]
    fn test_schur_one_by_one() {
        let m = Matrix::from_row_slice(1, &[1.0]).unwrap();
        let schur = RealSchur::decompose(&m, DEFAULT_SCHUR_MAX_ITERATIONS).unwrap();
        assert_eq!(
            schur.blocks(),
            vec![SchurBlock::Real {
                index: 0,
                value: 1.0
            }]
        );
    }
}
