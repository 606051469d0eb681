use rand::prelude::*;
use std::fmt;
use std::ops::Mul;

use crate::error::{NetworkError, Result};

/// Dense 2D matrix of `f64`, stored row-major in one flat buffer.
///
/// Element `(row, col)` lives at `cols * row + col`. A default matrix is
/// 0x0 and owns no storage. Neuron value vectors are column matrices
/// (`rows = neurons`, `cols = 1`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Copies `rows * cols` row-major elements out of `data`.
    pub fn from_vec(rows: usize, cols: usize, data: &[f64]) -> Result<Matrix> {
        if data.len() != rows * cols {
            return Err(NetworkError::mismatch(
                "from_vec",
                format!("{} elements", rows * cols),
                format!("{} elements", data.len()),
            ));
        }
        Ok(Matrix {
            rows,
            cols,
            data: data.to_vec(),
        })
    }

    /// Builds a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|row| row.len() != cols) {
            return Err(NetworkError::mismatch(
                "from_rows",
                format!("{cols} columns"),
                format!("{} columns", bad.len()),
            ));
        }
        Ok(Matrix {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// A column vector (`values.len()` x 1).
    pub fn column(values: &[f64]) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    /// A matrix filled by [`Matrix::seed`].
    pub fn seeded(rows: usize, cols: usize, seed: u64) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        res.seed(seed);
        res
    }

    /// Refills every element with a value in `[0, 1)` drawn from a generator
    /// reseeded from `seed`. Equal seeds and capacities give equal contents.
    pub fn seed(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for x in self.data.iter_mut() {
            *x = rng.gen::<f64>();
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(NetworkError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.cols * row + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let idx = self.offset(row, col)?;
        Ok(self.data[idx])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut f64> {
        let idx = self.offset(row, col)?;
        Ok(&mut self.data[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        *self.get_mut(row, col)? = value;
        Ok(())
    }

    /// Bulk write of `data` starting at `(row, col)`.
    ///
    /// Rows are written left to right. A column vector is written top to
    /// bottom instead, so `copy_from(offset, 0, ..)` fills a neuron vector.
    pub fn copy_from(&mut self, row: usize, col: usize, data: &[f64]) -> Result<()> {
        let start = self.offset(row, col)?;
        let (along, limit) = if self.cols == 1 {
            (row, self.rows)
        } else {
            (col, self.cols)
        };
        if along + data.len() > limit {
            return Err(NetworkError::mismatch(
                "copy_from",
                format!("at most {} elements", limit - along),
                format!("{} elements", data.len()),
            ));
        }
        // Both layouts are contiguous in the flat buffer.
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Matrix product `a x b`, shaped `a.rows x b.cols`.
    ///
    /// `b` is transposed first so both operands are walked row-major in the
    /// inner product.
    pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        if a.cols != b.rows {
            return Err(NetworkError::mismatch(
                "multiply",
                format!("rhs with {} rows", a.cols),
                format!("rhs with {} rows", b.rows),
            ));
        }

        let bt = b.transpose();
        let inner = a.cols;
        let mut res = Matrix::zeros(a.rows, b.cols);

        for i in 0..res.rows {
            let a_row = &a.data[i * inner..(i + 1) * inner];
            for j in 0..res.cols {
                let b_row = &bt.data[j * inner..(j + 1) * inner];
                res.data[i * res.cols + j] = a_row.iter().zip(b_row).map(|(x, y)| x * y).sum();
            }
        }

        Ok(res)
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        if self.rows == 1 || self.cols == 1 {
            // A vector keeps its element order.
            res.data.copy_from_slice(&self.data);
            return res;
        }

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * res.cols + i] = self.data[i * self.cols + j];
            }
        }

        res
    }

    pub fn scale(&self, scalar: f64) -> Matrix {
        self.map(|x| x * scalar)
    }

    pub fn add(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Matrix::zip_with("add", a, b, |x, y| x + y)
    }

    pub fn subtract(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Matrix::zip_with("subtract", a, b, |x, y| x - y)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(a: &Matrix, b: &Matrix) -> Result<Matrix> {
        Matrix::zip_with("hadamard", a, b, |x, y| x * y)
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    fn zip_with<F>(op: &'static str, a: &Matrix, b: &Matrix, functor: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        if a.rows != b.rows || a.cols != b.cols {
            return Err(NetworkError::mismatch(
                op,
                format!("{}x{}", a.rows, a.cols),
                format!("{}x{}", b.rows, b.cols),
            ));
        }
        Ok(Matrix {
            rows: a.rows,
            cols: a.cols,
            data: a.data.iter().zip(&b.data).map(|(&x, &y)| functor(x, y)).collect(),
        })
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        self.scale(rhs)
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        self.scale(rhs)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.cols.max(1)) {
            let line: Vec<String> = row.iter().map(|x| format!("{x:.4}")).collect();
            writeln!(f, "{}", line.join("\t"))?;
        }
        Ok(())
    }
}
