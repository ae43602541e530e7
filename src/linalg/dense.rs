//! Square dense matrix with a dimension fixed at construction.
//!
//! [`Matrix`] wraps nalgebra's `DMatrix<f64>` and is always square. Checked
//! constructors ([`Matrix::from_row_slice`], [`Matrix::from_rows`],
//! [`Matrix::from_dmatrix`]) also reject n = 0. The infallible
//! [`Matrix::identity`], [`Matrix::zeros`] and [`Matrix::from_fn`] accept
//! n = 0 and yield an empty matrix; the logarithm and exponential reject it
//! with [`LinAlgError::InvalidDimension`]. The wire format at the crate boundary is
//! a flat row-major buffer of length n², so construction and extraction go
//! through [`Matrix::from_row_slice`] and [`Matrix::to_row_major_vec`].
//!
//! Binary operations never consume their operands and return a fresh matrix.
//! [`Matrix::mul_into`] writes into caller-provided storage for hot loops.

use std::fmt;
use std::ops::{Index, IndexMut};

use nalgebra::DMatrix;

use super::{LinAlgError, LinAlgResult};

/// n×n real matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: DMatrix<f64>,
}

impl Matrix {
    /// Build a matrix from a flat row-major buffer of n² values.
    ///
    /// # Errors
    /// - [`LinAlgError::InvalidDimension`] if `n == 0`
    /// - [`LinAlgError::BufferLength`] if `values.len() != n * n`
    /// - [`LinAlgError::NonFinite`] if any entry is NaN or infinite
    pub fn from_row_slice(n: usize, values: &[f64]) -> LinAlgResult<Self> {
        if n == 0 {
            return Err(LinAlgError::InvalidDimension(n));
        }
        if values.len() != n * n {
            return Err(LinAlgError::BufferLength {
                expected: n * n,
                actual: values.len(),
            });
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(LinAlgError::NonFinite {
                row: pos / n,
                col: pos % n,
            });
        }
        Ok(Matrix {
            data: DMatrix::from_row_slice(n, n, values),
        })
    }

    /// Build a matrix from nested rows. The number of rows fixes n.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> LinAlgResult<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(LinAlgError::InvalidDimension(0));
        }
        let mut flat = Vec::with_capacity(n * n);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != n {
                return Err(LinAlgError::RaggedRows {
                    row,
                    expected: n,
                    actual: values.len(),
                });
            }
            flat.extend_from_slice(values);
        }
        Self::from_row_slice(n, &flat)
    }

    /// Wrap an existing nalgebra matrix.
    pub fn from_dmatrix(data: DMatrix<f64>) -> LinAlgResult<Self> {
        if data.nrows() != data.ncols() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "from_dmatrix",
                left: data.nrows(),
                right: data.ncols(),
            });
        }
        if data.nrows() == 0 {
            return Err(LinAlgError::InvalidDimension(0));
        }
        Ok(Matrix { data })
    }

    /// The n×n identity. `n == 0` gives an empty matrix.
    pub fn identity(n: usize) -> Self {
        Matrix {
            data: DMatrix::identity(n, n),
        }
    }

    /// The n×n zero matrix.
    pub fn zeros(n: usize) -> Self {
        Matrix {
            data: DMatrix::zeros(n, n),
        }
    }

    /// Build an n×n matrix entry by entry.
    pub fn from_fn<F: FnMut(usize, usize) -> f64>(n: usize, f: F) -> Self {
        Matrix {
            data: DMatrix::from_fn(n, n, f),
        }
    }

    /// Dimension n of this n×n matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.data.nrows()
    }

    /// Entry (row, col), or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// Borrow the underlying nalgebra matrix.
    pub fn as_dmatrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Flatten to the row-major boundary format.
    pub fn to_row_major_vec(&self) -> Vec<f64> {
        let n = self.dim();
        let mut out = Vec::with_capacity(n * n);
        for row in self.data.row_iter() {
            out.extend(row.iter().copied());
        }
        out
    }

    fn check_same_dim(&self, other: &Matrix, operation: &'static str) -> LinAlgResult<()> {
        if self.dim() != other.dim() {
            return Err(LinAlgError::DimensionMismatch {
                operation,
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(())
    }

    /// Matrix product `self * other`.
    pub fn mul(&self, other: &Matrix) -> LinAlgResult<Matrix> {
        self.check_same_dim(other, "mul")?;
        Ok(Matrix {
            data: &self.data * &other.data,
        })
    }

    /// Matrix product written into `out`, reusing its storage.
    pub fn mul_into(&self, other: &Matrix, out: &mut Matrix) -> LinAlgResult<()> {
        self.check_same_dim(other, "mul_into")?;
        self.check_same_dim(out, "mul_into")?;
        self.data.mul_to(&other.data, &mut out.data);
        Ok(())
    }

    /// Transpose.
    pub fn transpose(&self) -> Matrix {
        Matrix {
            data: self.data.transpose(),
        }
    }

    /// Entry-wise sum.
    pub fn add(&self, other: &Matrix) -> LinAlgResult<Matrix> {
        self.check_same_dim(other, "add")?;
        Ok(Matrix {
            data: &self.data + &other.data,
        })
    }

    /// Entry-wise difference `self - other`.
    pub fn sub(&self, other: &Matrix) -> LinAlgResult<Matrix> {
        self.check_same_dim(other, "sub")?;
        Ok(Matrix {
            data: &self.data - &other.data,
        })
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&self, factor: f64) -> Matrix {
        Matrix {
            data: &self.data * factor,
        }
    }

    /// In-place `self += factor * other`.
    pub fn add_scaled_assign(&mut self, other: &Matrix, factor: f64) -> LinAlgResult<()> {
        self.check_same_dim(other, "add_scaled_assign")?;
        self.data += &other.data * factor;
        Ok(())
    }

    /// Frobenius norm: square root of the sum of squared entries.
    pub fn frobenius_norm(&self) -> f64 {
        self.data.norm()
    }

    /// Frobenius distance to the identity, ‖self − I‖_F.
    pub fn distance_to_identity(&self) -> f64 {
        let mut sum = 0.0;
        for (j, column) in self.data.column_iter().enumerate() {
            for (i, value) in column.iter().enumerate() {
                let diff = if i == j { value - 1.0 } else { *value };
                sum += diff * diff;
            }
        }
        sum.sqrt()
    }

    /// Largest absolute entry-wise difference.
    pub fn max_abs_diff(&self, other: &Matrix) -> LinAlgResult<f64> {
        self.check_same_dim(other, "max_abs_diff")?;
        Ok((&self.data - &other.data).amax())
    }

    /// Entry-wise equality within `tolerance`.
    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> LinAlgResult<bool> {
        Ok(self.max_abs_diff(other)? <= tolerance)
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> f64 {
        self.data.trace()
    }

    /// Determinant (LU based).
    pub fn determinant(&self) -> f64 {
        self.data.determinant()
    }

    /// Inverse, or [`LinAlgError::Singular`] when the LU factorisation breaks down.
    pub fn try_inverse(&self) -> LinAlgResult<Matrix> {
        self.data
            .clone()
            .try_inverse()
            .map(|data| Matrix { data })
            .ok_or_else(|| LinAlgError::Singular(format!("{0}x{0} matrix", self.dim())))
    }

    /// True if every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index]
    }
}

impl From<Matrix> for DMatrix<f64> {
    fn from(matrix: Matrix) -> Self {
        matrix.data
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.data.row_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{value:>10.6}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
