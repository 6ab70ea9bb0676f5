//! Linear state-space estimation for periodically-sampled control systems.
//!
//! Given a continuous-time linear plant model, this crate converts it to a
//! discrete-time equivalent at a fixed sample period (matrix-exponential
//! discretization, including Van Loan noise-covariance propagation) and
//! recursively estimates the plant state from noisy, partial measurements
//! with a discrete-time Kalman filter. A generic fixed-step RK4 integrator
//! is available both standalone and as the covariance-propagation
//! cross-check for the discretization routines.
//!
//! The canonical control loop is:
//!
//! ```
//! use nalgebra::{Matrix1, Matrix1x2, Matrix2, Matrix2x1, Vector1};
//! use state_estimator_rs::{KalmanFilter, LinearSystem};
//!
//! // Elevator-style plant: x = [position, velocity], u = voltage,
//! // y = measured position.
//! let plant = LinearSystem::new(
//!     Matrix2::new(0.0, 1.0, 0.0, -99.0),
//!     Matrix2x1::new(0.0, 22.0),
//!     Matrix1x2::new(1.0, 0.0),
//!     Matrix1::new(0.0),
//! );
//! let dt = 0.020;
//! let mut filter = KalmanFilter::new(plant, &[0.05, 1.0], &[0.01], dt).unwrap();
//!
//! // Each control cycle: fold in the measurement, then propagate.
//! let u = Vector1::new(0.0);
//! let y = Vector1::new(0.02);
//! filter.correct(&u, &y).unwrap();
//! filter.predict(&u, dt).unwrap();
//! let _position = filter.xhat_at(0);
//! ```
//!
//! All operations are synchronous, in-place mutations of the filter's own
//! state; a filter instance must be driven from a single thread (or behind
//! external synchronization).

pub mod discretization;
pub mod error;
pub mod filters;
pub mod integration;
pub mod numerics;
pub mod system;
pub mod types;

pub use error::{EstimatorError, Result};
pub use filters::{KalmanFilter, KalmanFilterState};
pub use system::LinearSystem;
