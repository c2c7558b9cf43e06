//! Small dense matrices used by the statistical calculators (band covariance, eigenvectors).

use approx::{AbsDiffEq, RelativeEq};

use crate::{Error, Result};

const EIGEN_EPSILON: f64 = 1e-12;

/// Row-major dense matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut m = Self::zeros(size, size);
        for i in 0..size {
            m[(i, i)] = 1.0;
        }
        m
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(Error::InvalidArgument("Matrix rows must have the same length".to_string()));
        }

        Ok(Matrix {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|row| self[(row, col)]).collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Adds `d · dᵗ` to the matrix
    pub fn add_outer_product(&mut self, d: &[f64]) {
        debug_assert!(self.rows == d.len() && self.cols == d.len());
        for (i, &di) in d.iter().enumerate() {
            for (j, &dj) in d.iter().enumerate() {
                self[(i, j)] += di * dj;
            }
        }
    }

    pub fn scale(&mut self, factor: f64) {
        self.data.iter_mut().for_each(|v| *v *= factor);
    }

    /// `self · v`
    pub fn multiply_vector(&self, v: &[f64], output: &mut [f64]) {
        for (row, out) in output.iter_mut().enumerate().take(self.rows) {
            *out = self.row(row).iter().zip(v).map(|(m, v)| m * v).sum();
        }
    }

    /// `dᵗ · self · d`
    pub fn bilinear_form(&self, d: &[f64]) -> f64 {
        (0..self.rows)
            .map(|row| d[row] * self.row(row).iter().zip(d).map(|(m, d)| m * d).sum::<f64>())
            .sum()
    }

    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                t[(col, row)] = self[(row, col)];
            }
        }
        t
    }

    /// Inverse using Gauss-Jordan elimination with partial pivoting
    pub fn inverse(&self) -> Result<Matrix> {
        if !self.is_square() {
            return Err(Error::InvalidArgument(format!(
                "Only square matrices can be inverted, got {}x{}",
                self.rows, self.cols
            )));
        }

        let n = self.rows;
        let mut a = self.clone();
        let mut inv = Matrix::identity(n);

        for col in 0..n {
            let pivot = (col..n)
                .max_by(|&r1, &r2| a[(r1, col)].abs().total_cmp(&a[(r2, col)].abs()))
                .unwrap_or(col);

            if a[(pivot, col)].abs() < EIGEN_EPSILON {
                return Err(Error::InvalidArgument("Matrix is singular and can not be inverted".to_string()));
            }

            a.swap_rows(col, pivot);
            inv.swap_rows(col, pivot);

            let div = a[(col, col)];
            for c in 0..n {
                a[(col, c)] /= div;
                inv[(col, c)] /= div;
            }

            for row in (0..n).filter(|&row| row != col) {
                let factor = a[(row, col)];
                if factor != 0.0 {
                    for c in 0..n {
                        a[(row, c)] -= factor * a[(col, c)];
                        inv[(row, c)] -= factor * inv[(col, c)];
                    }
                }
            }
        }

        Ok(inv)
    }

    /// Eigen decomposition of a symmetric matrix using Jacobi rotations.
    ///
    /// Returns the eigenvalues in descending order and a matrix with the corresponding eigenvectors as columns.
    pub fn symmetric_eigen(&self) -> Result<(Vec<f64>, Matrix)> {
        if !self.is_square() {
            return Err(Error::InvalidArgument("Eigen decomposition requires a square matrix".to_string()));
        }

        let n = self.rows;
        let mut a = self.clone();
        let mut v = Matrix::identity(n);

        for _ in 0..100 * n * n {
            let mut max_val = 0.0;
            let (mut p, mut q) = (0, 0);
            for i in 0..n {
                for j in (i + 1)..n {
                    if a[(i, j)].abs() > max_val {
                        max_val = a[(i, j)].abs();
                        (p, q) = (i, j);
                    }
                }
            }

            if max_val < EIGEN_EPSILON {
                break;
            }

            let theta = 0.5 * (2.0 * a[(p, q)]).atan2(a[(p, p)] - a[(q, q)]);
            let (sin_t, cos_t) = theta.sin_cos();

            for i in (0..n).filter(|&i| i != p && i != q) {
                let aip = a[(i, p)];
                let aiq = a[(i, q)];
                a[(i, p)] = cos_t * aip + sin_t * aiq;
                a[(p, i)] = a[(i, p)];
                a[(i, q)] = -sin_t * aip + cos_t * aiq;
                a[(q, i)] = a[(i, q)];
            }

            let (app, aqq, apq) = (a[(p, p)], a[(q, q)], a[(p, q)]);
            a[(p, p)] = cos_t * cos_t * app + 2.0 * sin_t * cos_t * apq + sin_t * sin_t * aqq;
            a[(q, q)] = sin_t * sin_t * app - 2.0 * sin_t * cos_t * apq + cos_t * cos_t * aqq;
            a[(p, q)] = 0.0;
            a[(q, p)] = 0.0;

            for i in 0..n {
                let vip = v[(i, p)];
                let viq = v[(i, q)];
                v[(i, p)] = cos_t * vip + sin_t * viq;
                v[(i, q)] = -sin_t * vip + cos_t * viq;
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| a[(j, j)].total_cmp(&a[(i, i)]));

        let eigenvalues = order.iter().map(|&i| a[(i, i)]).collect();
        let mut eigenvectors = Matrix::zeros(n, n);
        for (col, &src) in order.iter().enumerate() {
            for row in 0..n {
                eigenvectors[(row, col)] = v[(row, src)];
            }
        }

        Ok((eigenvalues, eigenvectors))
    }

    fn swap_rows(&mut self, r1: usize, r2: usize) {
        if r1 != r2 {
            for col in 0..self.cols {
                self.data.swap(r1 * self.cols + col, r2 * self.cols + col);
            }
        }
    }
}

impl std::ops::Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.cols + col]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * self.cols + col]
    }
}

impl AbsDiffEq for Matrix {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data.abs_diff_eq(&other.data, epsilon)
    }
}

impl RelativeEq for Matrix {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data.relative_eq(&other.data, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn outer_product_and_bilinear_form() -> Result<()> {
        let mut m = Matrix::zeros(2, 2);
        m.add_outer_product(&[1.0, 2.0]);
        assert_eq!(m, Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0]])?);
        assert_eq!(m.bilinear_form(&[1.0, -1.0]), 1.0);

        let mut out = [0.0; 2];
        m.multiply_vector(&[1.0, 1.0], &mut out);
        assert_eq!(out, [3.0, 6.0]);
        Ok(())
    }

    #[test]
    fn inverse() -> Result<()> {
        let m = Matrix::from_rows(vec![vec![0.0, 2.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 4.0]])?;
        let inv = m.inverse()?;
        assert_relative_eq!(
            inv,
            Matrix::from_rows(vec![vec![0.0, 1.0, 0.0], vec![0.5, 0.0, 0.0], vec![0.0, 0.0, 0.25]])?,
            epsilon = 1e-12
        );

        let singular = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0]])?;
        assert!(singular.inverse().is_err());
        assert!(Matrix::zeros(2, 3).inverse().is_err());
        Ok(())
    }

    #[test]
    fn symmetric_eigen() -> Result<()> {
        let m = Matrix::from_rows(vec![vec![2.0, 1.0], vec![1.0, 2.0]])?;
        let (values, vectors) = m.symmetric_eigen()?;
        assert_relative_eq!(values.as_slice(), [3.0, 1.0].as_slice(), epsilon = 1e-9);

        // A·v = λ·v for every eigenvector
        for (k, &lambda) in values.iter().enumerate() {
            let v = vectors.column(k);
            let mut av = [0.0; 2];
            m.multiply_vector(&v, &mut av);
            assert_relative_eq!(av[0], lambda * v[0], epsilon = 1e-9);
            assert_relative_eq!(av[1], lambda * v[1], epsilon = 1e-9);
        }

        let negative = Matrix::from_rows(vec![vec![1.0, -2.0], vec![-2.0, 1.0]])?;
        let (values, _) = negative.symmetric_eigen()?;
        assert_relative_eq!(values.as_slice(), [3.0, -1.0].as_slice(), epsilon = 1e-9);
        Ok(())
    }
}
