//! Continuous-to-discrete conversion of linear state-space models
//!
//! Converts the continuous matrices of dx/dt = Ax + Bu to the discrete
//! equivalents used at a fixed sample period: the state matrix by matrix
//! exponential, the input matrix by an augmented-system exponential (exact
//! for any B), and the process-noise covariance either exactly by Van
//! Loan's method or by a cheaper truncated series. Measurement noise
//! rescales inversely with the period.
//!
//! The augmented block systems have dimensions that are sums of the state
//! and input sizes, which stable const generics cannot express, so the
//! block assembly runs on dynamically-sized matrices and the results are
//! sliced back into fixed-size ones.

use nalgebra::{DMatrix, SMatrix};

use crate::error::Result;
use crate::numerics::{expm, symmetrize};
use crate::types::{CovMat, InputMat, StateMat};

fn to_dyn<const R: usize, const C: usize>(m: &SMatrix<f64, R, C>) -> DMatrix<f64> {
    DMatrix::from_column_slice(R, C, m.as_slice())
}

/// Discretizes the state matrix: A_d = exp(A·dt).
pub fn discretize_a<const NX: usize>(a: &StateMat<NX>, dt: f64) -> Result<StateMat<NX>> {
    let phi = expm(&(to_dyn(a) * dt))?;
    Ok(phi.fixed_view::<NX, NX>(0, 0).into_owned())
}

/// Discretizes the state and input matrices together.
///
/// Exponentiates the augmented system [[A, B], [0, 0]]·dt; the top blocks
/// of the result are A_d and B_d = ∫₀^dt exp(Aτ)dτ·B. Exact for any B.
pub fn discretize_ab<const NX: usize, const NU: usize>(
    a: &StateMat<NX>,
    b: &InputMat<NX, NU>,
    dt: f64,
) -> Result<(StateMat<NX>, InputMat<NX, NU>)> {
    let mut aug = DMatrix::<f64>::zeros(NX + NU, NX + NU);
    aug.view_mut((0, 0), (NX, NX)).copy_from(a);
    aug.view_mut((0, NX), (NX, NU)).copy_from(b);
    aug *= dt;

    let phi = expm(&aug)?;
    let disc_a = phi.fixed_view::<NX, NX>(0, 0).into_owned();
    let disc_b = phi.fixed_view::<NX, NU>(0, NX).into_owned();
    Ok((disc_a, disc_b))
}

/// Discretizes the state matrix and process-noise covariance by Van Loan's
/// method.
///
/// Exponentiates M = [[−A, Q], [0, Aᵀ]]·dt; the lower-right block of the
/// result transposed is A_d, and Q_d = Φ₂₂ᵀ·Φ₁₂ is the closed form of
/// ∫₀^dt exp(Aτ)·Q·exp(Aᵀτ) dτ, the accumulation of continuous process
/// noise over one discrete step.
pub fn discretize_aq<const NX: usize>(
    a: &StateMat<NX>,
    q: &CovMat<NX>,
    dt: f64,
) -> Result<(StateMat<NX>, CovMat<NX>)> {
    let cont_q = (q + q.transpose()) / 2.0;

    let mut aug = DMatrix::<f64>::zeros(2 * NX, 2 * NX);
    aug.view_mut((0, 0), (NX, NX)).copy_from(&(-a));
    aug.view_mut((0, NX), (NX, NX)).copy_from(&cont_q);
    aug.view_mut((NX, NX), (NX, NX)).copy_from(&a.transpose());
    aug *= dt;

    let phi = expm(&aug)?;
    let phi12 = phi.view((0, NX), (NX, NX)).into_owned();
    let phi22 = phi.view((NX, NX), (NX, NX)).into_owned();

    let disc_a_dyn = phi22.transpose();
    let mut disc_q_dyn = &disc_a_dyn * phi12;
    symmetrize(&mut disc_q_dyn);

    let disc_a = disc_a_dyn.fixed_view::<NX, NX>(0, 0).into_owned();
    let disc_q = disc_q_dyn.fixed_view::<NX, NX>(0, 0).into_owned();
    Ok((disc_a, disc_q))
}

/// Discretizes the process-noise covariance by a truncated power series,
/// avoiding the 2n×2n augmented exponential.
///
/// Expands the upper-right block of exp(M·dt) term by term through the
/// recurrence (Mᵏ)₁₂ = −A·(Mᵏ⁻¹)₁₂ + Q·(Aᵀ)ᵏ⁻¹ and keeps five terms.
/// Valid when dt·‖A‖ is small; for PSD Q the truncated Q_d stays PSD.
pub fn discretize_aq_taylor<const NX: usize>(
    a: &StateMat<NX>,
    q: &CovMat<NX>,
    dt: f64,
) -> Result<(StateMat<NX>, CovMat<NX>)> {
    let cont_q = (q + q.transpose()) / 2.0;
    let a_t = a.transpose();

    let mut last_term = cont_q;
    let mut last_coeff = dt;
    // (Aᵀ)ⁿ
    let mut a_t_n = a_t;

    let mut phi12 = last_term * last_coeff;
    for i in 2..6 {
        last_term = -a * last_term + cont_q * a_t_n;
        last_coeff *= dt / i as f64;
        phi12 += last_term * last_coeff;
        a_t_n *= a_t;
    }

    let disc_a = discretize_a(a, dt)?;
    let disc_q = disc_a * phi12;
    Ok((disc_a, (disc_q + disc_q.transpose()) / 2.0))
}

/// Discretizes the measurement-noise covariance: R_d = R / dt.
///
/// Measurement noise intensity scales inversely with the sample period;
/// sampling more often leaves less noise energy per interval. dt must be
/// positive.
pub fn discretize_r<const NY: usize>(r: &CovMat<NY>, dt: f64) -> CovMat<NY> {
    r / dt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::rk4_time_varying;
    use crate::numerics::is_positive_semidefinite;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix2, Matrix2x1, Vector1, Vector2};

    /// Directly integrates ∫₀^dt exp(Aτ)·Q·exp(Aᵀτ) dτ with one RK4 step,
    /// the ground truth the closed forms must match.
    fn integrate_aq(a: &Matrix2<f64>, q: &Matrix2<f64>, dt: f64) -> Matrix2<f64> {
        rk4_time_varying(
            |t, _x: &Matrix2<f64>| {
                let phi = discretize_a(a, t).unwrap();
                phi * q * phi.transpose()
            },
            0.0,
            Matrix2::zeros(),
            dt,
        )
    }

    #[test]
    fn test_discretize_a_zero_dt_is_identity() {
        let a = Matrix2::new(0.0, 1.0, 0.0, -3.0);
        let disc_a = discretize_a(&a, 0.0).unwrap();
        assert_abs_diff_eq!(disc_a, Matrix2::identity(), epsilon = 1e-14);
    }

    #[test]
    fn test_discretize_a_double_integrator() {
        let a = Matrix2::new(0.0, 1.0, 0.0, 0.0);
        let disc_a = discretize_a(&a, 1.0).unwrap();

        // pos = vel = 1, accel = 0 advances to pos = 2, vel = 1.
        let x1 = disc_a * Vector2::new(1.0, 1.0);
        assert_abs_diff_eq!(x1[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x1[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_discretize_a_small_dt_first_order() {
        let a = Matrix2::new(0.0, 1.0, 0.0, -2.0);
        let dt = 1e-4;
        let disc_a = discretize_a(&a, dt).unwrap();
        // A_d ≈ I + A·dt + O(dt²)
        assert_abs_diff_eq!(disc_a, Matrix2::identity() + a * dt, epsilon = 1e-7);
    }

    #[test]
    fn test_discretize_ab_double_integrator() {
        let a = Matrix2::new(0.0, 1.0, 0.0, 0.0);
        let b = Matrix2x1::new(0.0, 1.0);
        let (disc_a, disc_b) = discretize_ab(&a, &b, 1.0).unwrap();

        // pos = vel = accel = 1 advances to pos = 2.5, vel = 2.
        let x1 = disc_a * Vector2::new(1.0, 1.0) + disc_b * Vector1::new(1.0);
        assert_abs_diff_eq!(x1[0], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(x1[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_discretize_aq_slow_model() {
        let a = Matrix2::new(0.0, 1.0, 0.0, 0.0);
        let q = Matrix2::identity();
        let dt = 1.0;

        let q_integrated = integrate_aq(&a, &q, dt);
        let (_, disc_q) = discretize_aq(&a, &q, dt).unwrap();
        assert!((q_integrated - disc_q).norm() < 1e-10);
    }

    #[test]
    fn test_discretize_aq_fast_model() {
        let a = Matrix2::new(0.0, 1.0, 0.0, -1406.29);
        let q = Matrix2::new(0.0025, 0.0, 0.0, 1.0);
        let dt = 0.005;

        let q_integrated = integrate_aq(&a, &q, dt);
        let (_, disc_q) = discretize_aq(&a, &q, dt).unwrap();
        assert!((q_integrated - disc_q).norm() < 1e-3);
    }

    #[test]
    fn test_discretize_aq_taylor_slow_model() {
        let a = Matrix2::new(0.0, 1.0, 0.0, 0.0);
        let q = Matrix2::identity();
        let dt = 1.0;

        let q_cont_dyn = DMatrix::from_column_slice(2, 2, q.as_slice());
        assert!(is_positive_semidefinite(&q_cont_dyn, 1e-12));

        let q_integrated = integrate_aq(&a, &q, dt);
        let disc_a = discretize_a(&a, dt).unwrap();
        let (disc_a_taylor, disc_q_taylor) = discretize_aq_taylor(&a, &q, dt).unwrap();

        assert!((q_integrated - disc_q_taylor).norm() < 1e-10);
        assert!((disc_a - disc_a_taylor).norm() < 1e-10);

        let q_disc_dyn = DMatrix::from_column_slice(2, 2, disc_q_taylor.as_slice());
        assert!(is_positive_semidefinite(&q_disc_dyn, 1e-12));
    }

    #[test]
    fn test_discretize_aq_taylor_fast_model() {
        let a = Matrix2::new(0.0, 1.0, 0.0, -1500.0);
        let q = Matrix2::new(0.0025, 0.0, 0.0, 1.0);
        let dt = 0.005;

        let q_cont_dyn = DMatrix::from_column_slice(2, 2, q.as_slice());
        assert!(is_positive_semidefinite(&q_cont_dyn, 1e-12));

        let q_integrated = integrate_aq(&a, &q, dt);
        let disc_a = discretize_a(&a, dt).unwrap();
        let (disc_a_taylor, disc_q_taylor) = discretize_aq_taylor(&a, &q, dt).unwrap();

        assert!((q_integrated - disc_q_taylor).norm() < 1e-3);
        assert!((disc_a - disc_a_taylor).norm() < 1e-10);

        let q_disc_dyn = DMatrix::from_column_slice(2, 2, disc_q_taylor.as_slice());
        assert!(is_positive_semidefinite(&q_disc_dyn, 1e-12));
    }

    #[test]
    fn test_discretize_aq_matches_discretize_a() {
        let a = Matrix2::new(0.0, 1.0, 0.0, -4.0);
        let q = Matrix2::new(0.5, 0.0, 0.0, 0.25);
        let dt = 0.02;

        let (disc_a_vl, _) = discretize_aq(&a, &q, dt).unwrap();
        let disc_a = discretize_a(&a, dt).unwrap();
        assert!((disc_a_vl - disc_a).norm() < 1e-12);
    }

    #[test]
    fn test_discretize_r() {
        let r = Matrix2::new(2.0, 0.0, 0.0, 1.0);
        let disc_r = discretize_r(&r, 0.5);
        let truth = Matrix2::new(4.0, 0.0, 0.0, 2.0);
        assert!((disc_r - truth).norm() < 1e-10);
    }
}
