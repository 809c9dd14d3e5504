//! Column-major real matrix.
//!
//! Trials and bins are columns. Storing the data column-major makes every
//! reshape a pure change of `(rows, cols)` over the same buffer, so the
//! Fortran-order fill used for trial reshaping and binning holds by construction.

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Column-major: element `(r, c)` lives at `c * rows + r`.
    data: Vec<f64>,
}

impl Matrix {
    pub fn from_column_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::ShapeMismatch {
                context: "matrix construction",
                expected: (rows, cols),
                actual: (data.len(), 1),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from equally long columns.
    pub fn from_columns<C: AsRef<[f64]>>(columns: &[C]) -> Result<Self> {
        let rows = columns.first().map_or(0, |c| c.as_ref().len());
        let mut data = Vec::with_capacity(rows * columns.len());
        for column in columns {
            let column = column.as_ref();
            if column.len() != rows {
                return Err(Error::ShapeMismatch {
                    context: "matrix columns",
                    expected: (rows, 1),
                    actual: (column.len(), 1),
                });
            }
            data.extend_from_slice(column);
        }
        Ok(Self {
            rows,
            cols: columns.len(),
            data,
        })
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Single-column matrix holding `values`.
    pub fn column_vector(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Column-major element buffer.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[col * self.rows + row]
    }

    #[inline]
    pub fn column(&self, col: usize) -> &[f64] {
        assert!(col < self.cols, "column {col} out of range ({})", self.cols);
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    #[inline]
    pub fn column_mut(&mut self, col: usize) -> &mut [f64] {
        assert!(col < self.cols, "column {col} out of range ({})", self.cols);
        &mut self.data[col * self.rows..(col + 1) * self.rows]
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        (0..self.cols).map(move |c| self.column(c))
    }

    /// Reinterprets the buffer with a new shape, column-major.
    pub fn reshape(self, rows: usize, cols: usize) -> Result<Self> {
        if rows * cols != self.data.len() {
            return Err(Error::ShapeMismatch {
                context: "reshape",
                expected: (rows, cols),
                actual: (self.rows, self.cols),
            });
        }
        Ok(Self {
            rows,
            cols,
            data: self.data,
        })
    }

    /// Splits into the first `at` columns and the remaining ones.
    pub fn split_columns(mut self, at: usize) -> (Matrix, Matrix) {
        assert!(at <= self.cols, "split point {at} beyond {} columns", self.cols);
        let trailing = self.data.split_off(at * self.rows);
        let rows = self.rows;
        let cols = self.cols;
        (
            Matrix {
                rows,
                cols: at,
                data: self.data,
            },
            Matrix {
                rows,
                cols: cols - at,
                data: trailing,
            },
        )
    }

    /// Concatenates the columns of `other` after the columns of `self`.
    pub fn hcat(mut self, other: &Matrix) -> Result<Self> {
        if self.rows != other.rows {
            return Err(Error::ShapeMismatch {
                context: "column concatenation",
                expected: (self.rows, other.cols),
                actual: other.shape(),
            });
        }
        self.data.extend_from_slice(&other.data);
        self.cols += other.cols;
        Ok(self)
    }

    /// Element-wise comparison that treats NaN as equal to NaN.
    pub fn bitwise_eq(&self, other: &Matrix) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
