use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use std::f64::consts::PI;
use std::ops::Mul;

/// Row-major dense matrix. A batch of `B` vectors of width `D` is a `B x D`
/// matrix; a bias vector is `1 x D`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Builds a matrix from rows. All rows must share one width.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let cols = data.first().map_or(0, |row| row.len());
        debug_assert!(data.iter().all(|row| row.len() == cols), "ragged matrix rows");
        Matrix {
            rows: data.len(),
            cols,
            data,
        }
    }

    pub fn row_vector(values: Vec<f64>) -> Matrix {
        Matrix::from_data(vec![values])
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // (0, 1] keeps ln() finite.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn normal<R: Rng + ?Sized>(rows: usize, cols: usize, std_dev: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for x in row.iter_mut() {
                *x = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// He initialization: N(0, sqrt(2 / rows)).
    ///
    /// Weights are stored `fan_in x fan_out`, so `rows` is the fan-in.
    /// Use before ReLU.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::normal(rows, cols, (2.0 / rows as f64).sqrt(), rng)
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for (i, row) in self.data.iter().enumerate() {
            for (j, &x) in row.iter().enumerate() {
                res.data[j][i] = x;
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        )
    }

    /// Adds a `1 x cols` bias to every row.
    pub fn add_row(&self, bias: &Matrix) -> Matrix {
        assert_eq!(bias.rows, 1, "bias must be a row vector");
        assert_eq!(bias.cols, self.cols, "bias width mismatch");
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().zip(&bias.data[0]).map(|(x, b)| x + b).collect())
                .collect(),
        )
    }

    /// Sums each column, producing a `1 x cols` row vector.
    pub fn column_sums(&self) -> Matrix {
        let mut sums = vec![0.0; self.cols];
        for row in &self.data {
            for (s, x) in sums.iter_mut().zip(row) {
                *s += x;
            }
        }
        Matrix::row_vector(sums)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols), "shape mismatch");
        Matrix::from_data(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a.iter().zip(b).map(|(x, y)| x * y).collect())
                .collect(),
        )
    }

    /// Checks that `data` really is `rows x cols`. Matrices read from disk
    /// carry their shape separately from their contents.
    pub fn check_consistent(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(Error::Input(format!(
                "matrix declares {} rows but holds {}", self.rows, self.data.len()
            )));
        }
        if let Some((i, row)) = self.data.iter().enumerate().find(|(_, row)| row.len() != self.cols) {
            return Err(Error::Input(format!(
                "matrix row {} has {} columns, expected {}", i, row.len(), self.cols
            )));
        }
        Ok(())
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().flatten().all(|x| x.is_finite())
    }

    /// First non-finite entry, if any.
    pub fn first_non_finite(&self) -> Option<f64> {
        self.data.iter().flatten().copied().find(|x| !x.is_finite())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for (i, lhs_row) in self.data.iter().enumerate() {
            let out = &mut res.data[i];
            for (k, &a) in lhs_row.iter().enumerate() {
                for (o, &b) in out.iter_mut().zip(&rhs.data[k]) {
                    *o += a * b;
                }
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn matmul_matches_hand_computation() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![5.0], vec![6.0]]);
        let c = &a * &b;
        assert_eq!(c.data, vec![vec![17.0], vec![39.0]]);
    }

    #[test]
    fn bias_broadcast_and_column_sums() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::row_vector(vec![10.0, 20.0]);
        assert_eq!(a.add_row(&b).data, vec![vec![11.0, 22.0], vec![13.0, 24.0]]);
        assert_eq!(a.column_sums().data, vec![vec![4.0, 6.0]]);
        assert_eq!(a.transpose().data, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn seeded_init_is_reproducible() {
        let a = Matrix::he(8, 4, &mut StdRng::seed_from_u64(7));
        let b = Matrix::he(8, 4, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.is_finite());
    }

    #[test]
    fn declared_shape_must_match_contents() {
        assert!(Matrix::zeros(2, 3).check_consistent().is_ok());
        let short = Matrix { rows: 4, cols: 2, data: vec![vec![0.0, 0.0]] };
        assert!(matches!(short.check_consistent(), Err(Error::Input(_))));
        let ragged = Matrix { rows: 2, cols: 2, data: vec![vec![0.0, 0.0], vec![0.0]] };
        assert!(matches!(ragged.check_consistent(), Err(Error::Input(_))));
    }

    #[test]
    fn detects_non_finite_entries() {
        let m = Matrix::from_data(vec![vec![1.0, f64::NAN]]);
        assert!(!m.is_finite());
        assert!(m.first_non_finite().is_some_and(f64::is_nan));
    }
}
