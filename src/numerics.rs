//! Shared linear-algebra utilities for discretization and estimation
//!
//! The matrix exponential lives here because every discretization routine
//! reduces to "exponentiate an augmented matrix, then slice blocks". The
//! discrete algebraic Riccati solver backs the Kalman filter's steady-state
//! gain. Both operate on dynamically-sized matrices so the augmented block
//! systems (whose dimensions are sums of state/input sizes) can be formed;
//! shapes are validated at entry.

use nalgebra::DMatrix;

use crate::error::{EstimatorError, Result};

/// Padé [6/6] numerator coefficients for the matrix exponential.
const PADE_COEFFS: [f64; 7] = [
    1.0,
    1.0 / 2.0,
    5.0 / 44.0,
    1.0 / 66.0,
    1.0 / 792.0,
    1.0 / 15840.0,
    1.0 / 665280.0,
];

/// Largest number of squarings allowed before the exponential is declared
/// non-convergent. 2^64 scaling covers any sample period a control loop
/// would realistically use.
const MAX_SQUARINGS: u32 = 64;

/// Computes the matrix exponential exp(M) by scaling-and-squaring with a
/// Padé [6/6] approximant.
///
/// M is scaled by a power of two until its infinity norm is at most 0.5,
/// the approximant is evaluated, and the result is squared back up.
pub fn expm(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if !m.is_square() {
        return Err(EstimatorError::Dimension(format!(
            "matrix exponential requires a square matrix, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }

    let norm = infinity_norm(m);
    if !norm.is_finite() {
        return Err(EstimatorError::Numerical(
            "matrix exponential input contains non-finite entries".into(),
        ));
    }

    let squarings = if norm > 0.5 {
        (norm / 0.5).log2().ceil() as u32
    } else {
        0
    };
    if squarings > MAX_SQUARINGS {
        return Err(EstimatorError::Numerical(format!(
            "matrix exponential did not converge (norm {norm:.3e}); use a smaller sample period"
        )));
    }

    let scaled = m / 2f64.powi(squarings as i32);
    let n = m.nrows();

    let m2 = &scaled * &scaled;
    let m4 = &m2 * &m2;
    let m6 = &m2 * &m4;

    // Split the approximant into even and odd powers so the numerator and
    // denominator share all the matrix products.
    let even = DMatrix::identity(n, n) * PADE_COEFFS[0]
        + &m2 * PADE_COEFFS[2]
        + &m4 * PADE_COEFFS[4]
        + &m6 * PADE_COEFFS[6];
    let odd = &scaled * (DMatrix::identity(n, n) * PADE_COEFFS[1] + &m2 * PADE_COEFFS[3] + &m4 * PADE_COEFFS[5]);

    let numerator = &even + &odd;
    let denominator = &even - &odd;

    let mut result = denominator.lu().solve(&numerator).ok_or_else(|| {
        EstimatorError::Numerical("singular Padé denominator in matrix exponential".into())
    })?;

    for _ in 0..squarings {
        result = &result * &result;
    }
    Ok(result)
}

/// Solves the discrete algebraic Riccati equation for the estimation
/// problem,
///
/// P = A·P·Aᵀ − A·P·Cᵀ·(C·P·Cᵀ + R)⁻¹·C·P·Aᵀ + Q,
///
/// by the structured doubling algorithm. Each doubling step squares the
/// effective horizon, so convergence is quadratic where the plain
/// covariance recursion can take thousands of steps for low-gain plants.
/// Requires (A, C) detectable; a diverging or non-PSD iterate is reported
/// as a model error.
pub fn solve_dare(
    a: &DMatrix<f64>,
    c: &DMatrix<f64>,
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let nx = a.nrows();
    let ny = c.nrows();
    if !a.is_square() || !q.is_square() || !r.is_square() {
        return Err(EstimatorError::Dimension(
            "Riccati solve requires square A, Q and R".into(),
        ));
    }
    if q.nrows() != nx || c.ncols() != nx || r.nrows() != ny {
        return Err(EstimatorError::Dimension(format!(
            "Riccati shapes inconsistent: A {nx}x{nx}, C {}x{}, Q {}x{}, R {}x{}",
            c.nrows(),
            c.ncols(),
            q.nrows(),
            q.ncols(),
            r.nrows(),
            r.ncols()
        )));
    }

    const MAX_ITERATIONS: usize = 100;
    const TOLERANCE: f64 = 1e-12;

    // The estimation DARE is the control DARE in (Aᵀ, Cᵀ); run the doubling
    // recursion on A_k = Aᵀ, G_k = Cᵀ·R⁻¹·C, H_k = Q with H_k → P.
    let r_inv_c = r.clone().lu().solve(c).ok_or_else(|| {
        EstimatorError::Model("measurement covariance R is singular".into())
    })?;
    let mut a_k = a.transpose();
    let mut g_k = c.transpose() * r_inv_c;
    let mut h_k = q.clone();
    symmetrize(&mut g_k);
    symmetrize(&mut h_k);

    for iteration in 0..MAX_ITERATIONS {
        let w = DMatrix::identity(nx, nx) + &g_k * &h_k;
        let w_lu = w.lu();
        // Y = W⁻¹·A_k and Z = W⁻¹·G_k, solved rather than inverted.
        let y = w_lu.solve(&a_k).ok_or_else(|| {
            EstimatorError::Model("singular pencil in Riccati doubling step".into())
        })?;
        let z = w_lu.solve(&g_k).ok_or_else(|| {
            EstimatorError::Model("singular pencil in Riccati doubling step".into())
        })?;

        let a_next = &a_k * &y;
        let mut g_next = &g_k + &a_k * &z * a_k.transpose();
        let mut h_next = &h_k + a_k.transpose() * &h_k * &y;
        symmetrize(&mut g_next);
        symmetrize(&mut h_next);

        if h_next.iter().any(|v| !v.is_finite()) {
            return Err(EstimatorError::Model(
                "Riccati recursion diverged; plant is not detectable".into(),
            ));
        }

        let delta = (&h_next - &h_k).amax();
        a_k = a_next;
        g_k = g_next;
        h_k = h_next;

        if delta <= TOLERANCE * h_k.amax().max(1.0) {
            log::debug!("Riccati doubling converged after {} steps", iteration + 1);
            if !is_positive_semidefinite(&h_k, 1e-9) {
                return Err(EstimatorError::Model(
                    "Riccati solution is not positive semidefinite".into(),
                ));
            }
            return Ok(h_k);
        }
    }

    Err(EstimatorError::Model(format!(
        "Riccati recursion did not converge within {MAX_ITERATIONS} doubling steps"
    )))
}

/// Replaces M with (M + Mᵀ)/2 to scrub floating-point asymmetry.
pub fn symmetrize(m: &mut DMatrix<f64>) {
    let t = m.transpose();
    *m += t;
    *m /= 2.0;
}

/// Checks that a symmetric matrix has no eigenvalue below -tol.
pub fn is_positive_semidefinite(m: &DMatrix<f64>, tol: f64) -> bool {
    let mut sym = m.clone();
    symmetrize(&mut sym);
    sym.symmetric_eigen()
        .eigenvalues
        .iter()
        .all(|&lambda| lambda >= -tol)
}

/// Maximum absolute row sum.
fn infinity_norm(m: &DMatrix<f64>) -> f64 {
    m.row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}
