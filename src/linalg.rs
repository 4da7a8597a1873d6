//! Square matrix support for the RLS inverse correlation estimate.
//!
//! Matrices are stored in row-major order as a flat vector. For an N×N matrix
//! the element at row i, column j lives at index `i * N + j`, which is also
//! the order used by checkpoints.
//!
//! Beyond the arithmetic the RLS recursion needs, this module provides the
//! checks used to validate `P`: symmetry error, Cholesky-based positive
//! definiteness and Jacobi eigenvalues.

use alloc::vec;
use alloc::vec::Vec;

/// Errors that can occur during matrix operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinalgError {
    /// Matrix is not positive definite (Cholesky failed)
    NotPositiveDefinite,

    /// Eigenvalue iteration did not converge
    ConvergenceFailed,

    /// Matrix dimensions incompatible
    DimensionMismatch,
}

/// An N×N matrix of `f64` in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    /// Create a zero matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Create `scale · I`.
    pub fn scaled_identity(n: usize, scale: f64) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.data[i * n + i] = scale;
        }
        m
    }

    /// Build from row-major data.
    ///
    /// # Errors
    ///
    /// Returns `LinalgError::DimensionMismatch` if `data.len() != n * n`.
    pub fn from_row_major(n: usize, data: Vec<f64>) -> Result<Self, LinalgError> {
        if data.len() != n * n {
            return Err(LinalgError::DimensionMismatch);
        }
        Ok(Self { n, data })
    }

    /// Dimension N.
    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Get element at row i, column j.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Set element at row i, column j.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    /// Row-major elements.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// `y = A·x`, written into `out`.
    pub fn mul_vec_into(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.n);
        debug_assert_eq!(out.len(), self.n);
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.row(i).iter().zip(x).map(|(a, b)| a * b).sum();
        }
    }

    /// `yᵗ = xᵗ·A`, written into `out`.
    pub fn vec_mul_into(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.n);
        debug_assert_eq!(out.len(), self.n);
        for (j, o) in out.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (i, &xi) in x.iter().enumerate() {
                sum += xi * self.data[i * self.n + j];
            }
            *o = sum;
        }
    }

    /// Replace A by `(A + Aᵗ) / 2`.
    pub fn symmetrize(&mut self) {
        let n = self.n;
        for i in 0..n {
            for j in (i + 1)..n {
                let avg = 0.5 * (self.data[i * n + j] + self.data[j * n + i]);
                self.data[i * n + j] = avg;
                self.data[j * n + i] = avg;
            }
        }
    }

    /// Largest `|A[i,j] − A[j,i]|`.
    pub fn max_asymmetry(&self) -> f64 {
        let n = self.n;
        let mut max = 0.0f64;
        for i in 0..n {
            for j in (i + 1)..n {
                max = max.max(libm::fabs(self.data[i * n + j] - self.data[j * n + i]));
            }
        }
        max
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Cholesky decomposition: A = LLᵗ where L is lower triangular.
    ///
    /// Uses the Cholesky-Banachiewicz algorithm. Only the lower triangle of
    /// A is read.
    ///
    /// # Errors
    ///
    /// Returns `LinalgError::NotPositiveDefinite` if a pivot is not positive.
    pub fn cholesky(&self) -> Result<Self, LinalgError> {
        let n = self.n;
        let mut l = Self::zeros(n);

        for j in 0..n {
            for i in j..n {
                let mut sum = self.get(i, j);
                for k in 0..j {
                    sum -= l.get(i, k) * l.get(j, k);
                }

                if i == j {
                    if !(sum > 0.0) {
                        return Err(LinalgError::NotPositiveDefinite);
                    }
                    l.set(i, j, libm::sqrt(sum));
                } else {
                    let l_jj = l.get(j, j);
                    if libm::fabs(l_jj) < 1e-300 {
                        return Err(LinalgError::NotPositiveDefinite);
                    }
                    l.set(i, j, sum / l_jj);
                }
            }
        }

        Ok(l)
    }

    /// True when the symmetric part of A admits a Cholesky factorization.
    pub fn is_positive_definite(&self) -> bool {
        let mut sym = self.clone();
        sym.symmetrize();
        sym.cholesky().is_ok()
    }

    /// Eigenvalues of a symmetric matrix by classical Jacobi rotations, in
    /// descending order.
    ///
    /// # Arguments
    ///
    /// * `max_rotations` - Upper bound on the number of Jacobi rotations
    /// * `tol` - Convergence tolerance for the largest off-diagonal element
    ///
    /// # Errors
    ///
    /// Returns `LinalgError::ConvergenceFailed` if convergence not reached.
    pub fn eigenvalues_symmetric(
        &self,
        max_rotations: usize,
        tol: f64,
    ) -> Result<Vec<f64>, LinalgError> {
        let n = self.n;
        let mut a = self.clone();
        a.symmetrize();

        for _ in 0..=max_rotations {
            let (p, q, max_val) = find_max_off_diagonal(&a);
            if max_val <= tol {
                let mut eigenvalues: Vec<f64> = (0..n).map(|i| a.get(i, i)).collect();
                eigenvalues.sort_by(|x, y| y.total_cmp(x));
                return Ok(eigenvalues);
            }
            let (c, s) = jacobi_rotation(&a, p, q);
            apply_jacobi_rotation(&mut a, p, q, c, s);
        }

        Err(LinalgError::ConvergenceFailed)
    }

    /// Smallest eigenvalue of a symmetric matrix.
    pub fn min_eigenvalue(&self) -> Result<f64, LinalgError> {
        let scale = self
            .data
            .iter()
            .fold(0.0f64, |acc, v| acc.max(libm::fabs(*v)))
            .max(f64::MIN_POSITIVE);
        let rotations = 50 * self.n * self.n + 100;
        let eigenvalues = self.eigenvalues_symmetric(rotations, scale * 1e-12)?;
        eigenvalues
            .last()
            .copied()
            .ok_or(LinalgError::DimensionMismatch)
    }
}

/// Largest off-diagonal magnitude of the upper triangle with its position.
fn find_max_off_diagonal(a: &SquareMatrix) -> (usize, usize, f64) {
    let n = a.dim();
    let (mut max_i, mut max_j, mut max_val) = (0, 0, 0.0f64);

    for i in 0..n {
        for j in (i + 1)..n {
            let val = libm::fabs(a.get(i, j));
            if val > max_val {
                max_val = val;
                max_i = i;
                max_j = j;
            }
        }
    }

    (max_i, max_j, max_val)
}

/// Rotation (cos θ, sin θ) that annihilates A[i,j].
fn jacobi_rotation(a: &SquareMatrix, i: usize, j: usize) -> (f64, f64) {
    let a_ii = a.get(i, i);
    let a_jj = a.get(j, j);
    let a_ij = a.get(i, j);

    if a_ii == a_jj {
        let c = core::f64::consts::FRAC_1_SQRT_2;
        return if a_ij > 0.0 { (c, c) } else { (c, -c) };
    }

    let tau = (a_jj - a_ii) / (2.0 * a_ij);
    let t = if tau >= 0.0 {
        1.0 / (tau + libm::sqrt(1.0 + tau * tau))
    } else {
        -1.0 / (-tau + libm::sqrt(1.0 + tau * tau))
    };

    let c = 1.0 / libm::sqrt(1.0 + t * t);
    (c, t * c)
}

/// Apply A' = RᵗAR for the rotation in plane (i, j).
fn apply_jacobi_rotation(a: &mut SquareMatrix, i: usize, j: usize, c: f64, s: f64) {
    let a_ii = a.get(i, i);
    let a_jj = a.get(j, j);
    let a_ij = a.get(i, j);

    a.set(i, i, c * c * a_ii - 2.0 * c * s * a_ij + s * s * a_jj);
    a.set(j, j, s * s * a_ii + 2.0 * c * s * a_ij + c * c * a_jj);
    a.set(i, j, 0.0);
    a.set(j, i, 0.0);

    for k in 0..a.dim() {
        if k != i && k != j {
            let a_ki = a.get(k, i);
            let a_kj = a.get(k, j);
            let new_ki = c * a_ki - s * a_kj;
            let new_kj = s * a_ki + c * a_kj;
            a.set(k, i, new_ki);
            a.set(i, k, new_ki);
            a.set(k, j, new_kj);
            a.set(j, k, new_kj);
        }
    }
}
