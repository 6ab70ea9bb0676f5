use thiserror::Error;

/// Errors surfaced by the discretization and estimation routines.
///
/// Every failure is reported synchronously to the caller; a stale or wrong
/// estimate is dangerous in a control loop, so nothing is retried or
/// silently degraded. On a `Numerical` failure during an update the filter's
/// prior state (xhat, P) is left unmodified.
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// Matrix or vector shapes inconsistent with the declared
    /// state/input/output dimensions. Detected at call entry on the
    /// dynamically-sized utility paths; the fixed-size API catches these at
    /// compile time.
    #[error("dimension mismatch: {0}")]
    Dimension(String),

    /// The plant is not detectable/stabilizable: the Riccati iteration
    /// diverged or produced a covariance that is not positive
    /// semidefinite. Raised at construction; no filter is produced.
    #[error("model error: {0}")]
    Model(String),

    /// A numerical failure at the call site: singular innovation covariance
    /// during `correct`, or a singular Padé denominator in the matrix
    /// exponential.
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
