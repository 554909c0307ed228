//! Loop updates of the spin-1/2 Heisenberg antiferromagnet in imaginary time.
//!
//! Two representations of the partition function are provided: the stochastic series expansion
//! with a fixed length operator string, and the continuous time path integral with a time
//! ordered list of operators. Both share the cluster engine and the improved estimators.

pub use continuous_time::{ContinuousTimeLoop, TimedOperator};
pub use loop_update::{HeisenbergLoop, LoopEstimators};
pub use operator_string::{LocalOperator, OperatorKind, OperatorString};

/// The loop update in continuous imaginary time.
pub mod continuous_time;

/// The loop cluster update.
pub mod loop_update;

/// Operator slots along imaginary time and their storage.
pub mod operator_string;

use crate::error::Result;
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// What the worker harness needs from a loop update.
pub trait LoopUpdate {
    /// Imaginary time configuration stored in checkpoints.
    type Operators: Serialize + DeserializeOwned;

    /// Perform one diagonal update, loop construction and loop flip.
    fn sweep<R: Rng>(&mut self, rng: &mut R) -> Result<LoopEstimators>;

    /// Push the measurements of a sweep.
    fn measure(&self, est: &LoopEstimators, obs: &mut ObservableSet);

    /// Spins at imaginary time zero.
    fn spins(&self) -> &[bool];

    /// A copy of the imaginary time configuration.
    fn snapshot(&self) -> Self::Operators;

    /// Replace spins and operators, which must fit together.
    fn set_state(&mut self, spins: Vec<bool>, operators: Option<Self::Operators>) -> Result<()>;
}

/// Squared staggered magnetization of a time slice per site, measured directly on the spins.
pub(crate) fn staggered_magnetization2<L: Lattice>(lattice: &L, spins: &[bool]) -> f64 {
    let ms: f64 = spins
        .iter()
        .enumerate()
        .map(|(s, down)| lattice.site_phase(s) * if *down { -0.5 } else { 0.5 })
        .sum();
    ms * ms / lattice.num_sites() as f64
}
