//! Fixed-step numerical integration
//!
//! Classic explicit 4th-order Runge-Kutta over any fixed-size nalgebra
//! state, vector or matrix. Used standalone for plant propagation and by
//! the discretization tests to integrate the continuous noise-covariance
//! integral directly. Each call is a pure function of its inputs: no step
//! adaptation, no retained state. The caller picks a dt small enough for
//! the dynamics at hand.

use nalgebra::SMatrix;

/// Advances `x` by one RK4 step of size `dt` through the time-invariant
/// dynamics dx/dt = f(x).
pub fn rk4<F, const R: usize, const C: usize>(
    f: F,
    x: SMatrix<f64, R, C>,
    dt: f64,
) -> SMatrix<f64, R, C>
where
    F: Fn(&SMatrix<f64, R, C>) -> SMatrix<f64, R, C>,
{
    let half = dt / 2.0;
    let k1 = f(&x);
    let k2 = f(&(x + k1 * half));
    let k3 = f(&(x + k2 * half));
    let k4 = f(&(x + k3 * dt));
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}

/// Advances `x` by one RK4 step through dx/dt = f(x, u) with the input `u`
/// held constant over the step, the form a control loop uses to propagate
/// its plant model between samples.
pub fn rk4_with_input<F, const R: usize, const C: usize, const UR: usize>(
    f: F,
    x: SMatrix<f64, R, C>,
    u: &SMatrix<f64, UR, C>,
    dt: f64,
) -> SMatrix<f64, R, C>
where
    F: Fn(&SMatrix<f64, R, C>, &SMatrix<f64, UR, C>) -> SMatrix<f64, R, C>,
{
    rk4(|x| f(x, u), x, dt)
}

/// Advances `x` from `t` by one RK4 step through the explicitly
/// time-varying dynamics dx/dt = f(t, x).
pub fn rk4_time_varying<F, const R: usize, const C: usize>(
    f: F,
    t: f64,
    x: SMatrix<f64, R, C>,
    dt: f64,
) -> SMatrix<f64, R, C>
where
    F: Fn(f64, &SMatrix<f64, R, C>) -> SMatrix<f64, R, C>,
{
    let half = dt / 2.0;
    let k1 = f(t, &x);
    let k2 = f(t + half, &(x + k1 * half));
    let k3 = f(t + half, &(x + k2 * half));
    let k4 = f(t + dt, &(x + k3 * dt));
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
}
