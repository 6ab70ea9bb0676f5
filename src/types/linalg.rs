//! Linear algebra type system for the state-space estimator
//!
//! Provides compile-time dimension checking and clean type aliases
//! shared by the discretization routines and the Kalman filter.

use nalgebra::{SMatrix, SVector};

// ===== State-space vector types =====
pub type StateVec<const NX: usize> = SVector<f64, NX>;
pub type InputVec<const NU: usize> = SVector<f64, NU>;
pub type OutputVec<const NY: usize> = SVector<f64, NY>;

// ===== State-space matrix types =====
pub type StateMat<const NX: usize> = SMatrix<f64, NX, NX>;
pub type InputMat<const NX: usize, const NU: usize> = SMatrix<f64, NX, NU>;
pub type OutputMat<const NY: usize, const NX: usize> = SMatrix<f64, NY, NX>;
pub type FeedthroughMat<const NY: usize, const NU: usize> = SMatrix<f64, NY, NU>;

// ===== Covariance and gain types =====
pub type CovMat<const N: usize> = SMatrix<f64, N, N>;
pub type GainMat<const NX: usize, const NY: usize> = SMatrix<f64, NX, NY>;

/// Builds a diagonal covariance matrix from per-axis standard deviations.
///
/// Each element is squared and placed on the diagonal, so the argument is a
/// vector of noise standard deviations, not variances.
pub fn cov_matrix_from_std_devs<const N: usize>(std_devs: &[f64; N]) -> CovMat<N> {
    let mut cov = CovMat::<N>::zeros();
    for (i, std_dev) in std_devs.iter().enumerate() {
        cov[(i, i)] = std_dev * std_dev;
    }
    cov
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cov_matrix_squares_std_devs() {
        let cov = cov_matrix_from_std_devs(&[0.5, 2.0]);
        assert_eq!(cov[(0, 0)], 0.25);
        assert_eq!(cov[(1, 1)], 4.0);
        assert_eq!(cov[(0, 1)], 0.0);
        assert_eq!(cov[(1, 0)], 0.0);
    }

    #[test]
    fn test_aliases_are_fixed_size() {
        let x: StateVec<3> = StateVec::<3>::zeros();
        let a: StateMat<3> = StateMat::<3>::identity();
        let y = a * x;
        assert_eq!(y.len(), 3);
    }
}
