//! Dense matrices for the least-squares fit and the MLE covariance.
//!
//! [`Matrix`] is an owned, row-major value type. Only the three operations
//! the estimators need are provided: [`Matrix::invert`] (Gauss–Jordan with
//! partial pivoting), [`Matrix::multiply`] and [`Matrix::transpose`].
//!
//! # Examples
//!
//! ```
//! use u_inference::linalg::Matrix;
//!
//! let a = Matrix::from_rows(&[vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();
//! let inv = a.invert().unwrap();
//! let id = a.multiply(&inv).unwrap();
//! assert!((id[(0, 0)] - 1.0).abs() < 1e-12);
//! assert!(id[(0, 1)].abs() < 1e-12);
//! ```

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// Pivots smaller than this fraction of the largest entry are treated as zero.
const PIVOT_EPS: f64 = 1e-12;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Builds a matrix from row-major data.
    ///
    /// # Errors
    /// `DimensionMismatch` if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(InferenceError::DimensionMismatch {
                left: (rows, cols),
                right: (data.len(), 1),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Builds a matrix from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(InferenceError::DimensionMismatch {
                left: (rows.len(), cols),
                right: (1, bad.len()),
            });
        }
        let data = rows.iter().flatten().copied().collect();
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// n × 1 column vector.
    pub fn column(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Main diagonal.
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self[(i, i)]).collect()
    }

    /// Row-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Every entry multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * factor).collect(),
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// Matrix product `self · other`.
    ///
    /// # Errors
    /// `DimensionMismatch` unless `self.cols() == other.rows()`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(InferenceError::DimensionMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(i, k)];
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    out.data[i * other.cols + j] += a * other[(k, j)];
                }
            }
        }
        Ok(out)
    }

    /// Inverse by Gauss–Jordan elimination with partial pivoting.
    ///
    /// # Algorithm
    ///
    /// The augmented matrix `[A | I]` is reduced column by column. In each
    /// column the row with the largest absolute entry becomes the pivot row,
    /// the pivot row is normalized by the pivot, and the column is eliminated
    /// from every other row. The right half then holds A⁻¹.
    ///
    /// # Errors
    /// - `DimensionMismatch` for non-square input.
    /// - `SingularMatrix` when a pivot is at most 1e-12 × max|aᵢⱼ|.
    pub fn invert(&self) -> Result<Matrix> {
        if !self.is_square() {
            return Err(InferenceError::DimensionMismatch {
                left: self.shape(),
                right: (self.cols, self.rows),
            });
        }
        let n = self.rows;
        let scale = self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if n > 0 && (scale == 0.0 || !scale.is_finite()) {
            return Err(InferenceError::SingularMatrix { pivot: 0 });
        }
        let threshold = PIVOT_EPS * scale;

        let mut a = self.clone();
        let mut inv = Matrix::identity(n);

        for col in 0..n {
            let mut pivot_row = col;
            let mut best = a[(col, col)].abs();
            for r in (col + 1)..n {
                let v = a[(r, col)].abs();
                if v > best {
                    best = v;
                    pivot_row = r;
                }
            }
            if best <= threshold {
                return Err(InferenceError::SingularMatrix { pivot: col });
            }
            if pivot_row != col {
                a.swap_rows(col, pivot_row);
                inv.swap_rows(col, pivot_row);
            }

            let pivot = a[(col, col)];
            for j in 0..n {
                a[(col, j)] /= pivot;
                inv[(col, j)] /= pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a[(r, col)];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[(r, j)] -= factor * a[(col, j)];
                    inv[(r, j)] -= factor * inv[(col, j)];
                }
            }
        }
        Ok(inv)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * self.cols + col]
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn diagonally_dominant_inverts(
            entries in proptest::collection::vec(-1.0_f64..1.0, 16),
        ) {
            // Strict diagonal dominance guarantees non-singularity
            let mut a = Matrix::new(4, 4, entries).unwrap();
            for i in 0..4 {
                a[(i, i)] = 5.0 + a[(i, i)].abs();
            }
            let product = a.invert().unwrap().multiply(&a).unwrap();
            for i in 0..4 {
                for j in 0..4 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    prop_assert!((product[(i, j)] - expected).abs() < 1e-9);
                }
            }
        }
    }
}
