//! Continuous-time linear state-space plant model
//!
//! Represents dx/dt = Ax + Bu, y = Cx + Du with compile-time dimensions
//! NX states, NU inputs and NY outputs. The estimator reads the matrices
//! but never mutates them; plant parameter derivation belongs to the
//! caller.

use crate::discretization::discretize_ab;
use crate::error::Result;
use crate::types::{FeedthroughMat, InputMat, InputVec, OutputMat, OutputVec, StateMat, StateVec};

#[derive(Clone, Debug)]
pub struct LinearSystem<const NX: usize, const NU: usize, const NY: usize> {
    a: StateMat<NX>,
    b: InputMat<NX, NU>,
    c: OutputMat<NY, NX>,
    d: FeedthroughMat<NY, NU>,
}

impl<const NX: usize, const NU: usize, const NY: usize> LinearSystem<NX, NU, NY> {
    pub fn new(
        a: StateMat<NX>,
        b: InputMat<NX, NU>,
        c: OutputMat<NY, NX>,
        d: FeedthroughMat<NY, NU>,
    ) -> Self {
        Self { a, b, c, d }
    }

    pub fn a(&self) -> &StateMat<NX> {
        &self.a
    }

    pub fn b(&self) -> &InputMat<NX, NU> {
        &self.b
    }

    pub fn c(&self) -> &OutputMat<NY, NX> {
        &self.c
    }

    pub fn d(&self) -> &FeedthroughMat<NY, NU> {
        &self.d
    }

    /// Propagates the state one sample period forward under the input `u`,
    /// discretizing (A, B) exactly at `dt`.
    pub fn calculate_x(&self, x: &StateVec<NX>, u: &InputVec<NU>, dt: f64) -> Result<StateVec<NX>> {
        let (disc_a, disc_b) = discretize_ab(&self.a, &self.b, dt)?;
        Ok(disc_a * x + disc_b * u)
    }

    /// Output equation y = Cx + Du.
    pub fn calculate_y(&self, x: &StateVec<NX>, u: &InputVec<NU>) -> OutputVec<NY> {
        self.c * x + self.d * u
    }
}
