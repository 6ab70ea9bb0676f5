//! Discrete-time Kalman filter for linear plants
//!
//! Owns the running state estimate and error covariance for a continuous
//! plant model discretized at a fixed sample period. The steady-state gain
//! is computed once at construction from the discrete algebraic Riccati
//! equation; `correct` additionally propagates the time-varying covariance
//! and recomputes the per-step gain, which converges to the steady-state
//! one.
//!
//! The filter assumes `predict`/`correct` are called at the cadence the
//! discretization matrices were built for. Drift between the actual call
//! period and the period baked into A_d/B_d/Q_d degrades accuracy silently;
//! passing the true dt to `predict` re-discretizes on the fly.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::discretization::{discretize_ab, discretize_aq, discretize_r};
use crate::error::{EstimatorError, Result};
use crate::numerics::solve_dare;
use crate::system::LinearSystem;
use crate::types::{
    cov_matrix_from_std_devs, CovMat, GainMat, InputMat, InputVec, OutputVec, StateMat, StateVec,
};

/// Serializable summary of the filter for external inspection. Plain data
/// only; the filter itself is never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KalmanFilterState {
    /// Current state estimate.
    pub estimate: Vec<f64>,

    /// Trace of the error covariance, a scalar uncertainty summary.
    pub covariance_trace: f64,

    /// Update counters
    pub predict_count: u64,
    pub correct_count: u64,
}

pub struct KalmanFilter<const NX: usize, const NU: usize, const NY: usize> {
    plant: LinearSystem<NX, NU, NY>,

    /// Continuous noise covariances, kept for re-discretization.
    cont_q: CovMat<NX>,
    cont_r: CovMat<NY>,

    /// Sample period the discrete matrices below were built for [seconds].
    dt: f64,

    disc_a: StateMat<NX>,
    disc_b: InputMat<NX, NU>,
    disc_q: CovMat<NX>,
    disc_r: CovMat<NY>,

    /// Steady-state Riccati solution and the constant gain derived from it.
    steady_p: CovMat<NX>,
    steady_k: GainMat<NX, NY>,

    xhat: StateVec<NX>,
    p: CovMat<NX>,

    predict_count: u64,
    correct_count: u64,
}

impl<const NX: usize, const NU: usize, const NY: usize> KalmanFilter<NX, NU, NY> {
    /// Creates a filter from per-axis noise standard deviations.
    ///
    /// The state weights are the standard deviations of how far each state
    /// drifts from the model per unit time; the measurement weights are the
    /// standard deviations of each output measurement. Each is squared onto
    /// the diagonal of the corresponding continuous covariance.
    pub fn new(
        plant: LinearSystem<NX, NU, NY>,
        state_std_devs: &[f64; NX],
        measurement_std_devs: &[f64; NY],
        dt: f64,
    ) -> Result<Self> {
        let cont_q = cov_matrix_from_std_devs(state_std_devs);
        let cont_r = cov_matrix_from_std_devs(measurement_std_devs);
        Self::with_covariances(plant, cont_q, cont_r, dt)
    }

    /// Creates a filter from full continuous noise covariance matrices, for
    /// correlated noise. The matrices are discretized internally at `dt`.
    pub fn with_covariances(
        plant: LinearSystem<NX, NU, NY>,
        cont_q: CovMat<NX>,
        cont_r: CovMat<NY>,
        dt: f64,
    ) -> Result<Self> {
        let (disc_a, disc_q) = discretize_aq(plant.a(), &cont_q, dt)?;
        let (_, disc_b) = discretize_ab(plant.a(), plant.b(), dt)?;
        let disc_r = discretize_r(&cont_r, dt);

        let steady_p_dyn = solve_dare(
            &DMatrix::from_column_slice(NX, NX, disc_a.as_slice()),
            &DMatrix::from_column_slice(NY, NX, plant.c().as_slice()),
            &DMatrix::from_column_slice(NX, NX, disc_q.as_slice()),
            &DMatrix::from_column_slice(NY, NY, disc_r.as_slice()),
        )?;
        let steady_p = steady_p_dyn.fixed_view::<NX, NX>(0, 0).into_owned();

        // K = P·Cᵀ·(C·P·Cᵀ + R_d)⁻¹ via a Cholesky solve of S·Kᵀ = C·P.
        let s = plant.c() * steady_p * plant.c().transpose() + disc_r;
        let chol = s.cholesky().ok_or_else(|| {
            EstimatorError::Numerical(
                "steady-state innovation covariance is not positive definite".into(),
            )
        })?;
        let steady_k = chol.solve(&(plant.c() * steady_p)).transpose();

        log::debug!(
            "Kalman filter constructed: {NX} states, {NU} inputs, {NY} outputs, dt = {dt}"
        );

        Ok(Self {
            plant,
            cont_q,
            cont_r,
            dt,
            disc_a,
            disc_b,
            disc_q,
            disc_r,
            steady_p,
            steady_k,
            xhat: StateVec::zeros(),
            p: steady_p,
            predict_count: 0,
            correct_count: 0,
        })
    }

    /// Time update: propagates the estimate through the plant dynamics and
    /// accumulates process uncertainty.
    ///
    /// If `dt` differs from the period the cached discrete matrices were
    /// built for, the plant is re-discretized first and the new period
    /// becomes the cached one. On any error the prior xhat and P are left
    /// unmodified.
    pub fn predict(&mut self, u: &InputVec<NU>, dt: f64) -> Result<()> {
        if (dt - self.dt).abs() > f64::EPSILON {
            log::debug!("re-discretizing plant: dt {} -> {}", self.dt, dt);
            let (disc_a, disc_q) = discretize_aq(self.plant.a(), &self.cont_q, dt)?;
            let (_, disc_b) = discretize_ab(self.plant.a(), self.plant.b(), dt)?;
            self.disc_a = disc_a;
            self.disc_b = disc_b;
            self.disc_q = disc_q;
            self.disc_r = discretize_r(&self.cont_r, dt);
            self.dt = dt;
        }

        self.xhat = self.disc_a * self.xhat + self.disc_b * u;
        self.p = self.disc_a * self.p * self.disc_a.transpose() + self.disc_q;
        self.p = (self.p + self.p.transpose()) / 2.0;
        self.predict_count += 1;
        Ok(())
    }

    /// Measurement update: folds a measurement into the estimate through
    /// the innovation and the gain computed from the current covariance.
    ///
    /// Fails if the innovation covariance has no Cholesky factor, which
    /// indicates a degenerate measurement model or ill-posed R; xhat and P
    /// are untouched in that case.
    pub fn correct(&mut self, u: &InputVec<NU>, y: &OutputVec<NY>) -> Result<()> {
        let c = self.plant.c();

        let innovation = y - (c * self.xhat + self.plant.d() * u);
        let s = c * self.p * c.transpose() + self.disc_r;
        let chol = s.cholesky().ok_or_else(|| {
            EstimatorError::Numerical("singular innovation covariance in correct".into())
        })?;
        // K = P·Cᵀ·S⁻¹, solved rather than inverted.
        let k: GainMat<NX, NY> = chol.solve(&(c * self.p)).transpose();

        self.xhat += k * innovation;
        self.p = (CovMat::<NX>::identity() - k * c) * self.p;
        self.p = (self.p + self.p.transpose()) / 2.0;
        self.correct_count += 1;
        Ok(())
    }

    /// Zeroes the estimate and restores the covariance to its
    /// construction-time (steady-state) value, discarding accumulated
    /// uncertainty history.
    pub fn reset(&mut self) {
        self.xhat = StateVec::zeros();
        self.p = self.steady_p;
    }

    pub fn xhat(&self) -> &StateVec<NX> {
        &self.xhat
    }

    /// Single element of the estimate. `i` must be less than NX; indexing
    /// out of range panics.
    pub fn xhat_at(&self, i: usize) -> f64 {
        self.xhat[i]
    }

    /// Replaces the whole estimate without touching P, for
    /// re-initialization.
    pub fn set_xhat(&mut self, xhat: StateVec<NX>) {
        self.xhat = xhat;
    }

    /// Overwrites a single element of the estimate. `i` must be less than
    /// NX; indexing out of range panics.
    pub fn set_xhat_at(&mut self, i: usize, value: f64) {
        self.xhat[i] = value;
    }

    pub fn p(&self) -> &CovMat<NX> {
        &self.p
    }

    /// Constant gain derived from the steady-state Riccati solution.
    pub fn steady_state_gain(&self) -> &GainMat<NX, NY> {
        &self.steady_k
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn disc_q(&self) -> &CovMat<NX> {
        &self.disc_q
    }

    pub fn disc_r(&self) -> &CovMat<NY> {
        &self.disc_r
    }

    pub fn snapshot(&self) -> KalmanFilterState {
        KalmanFilterState {
            estimate: self.xhat.iter().copied().collect(),
            covariance_trace: self.p.trace(),
            predict_count: self.predict_count,
            correct_count: self.correct_count,
        }
    }
}
