//! Swendsen-Wang cluster updates for classical spin and percolation models.
//!
//! Every model shares one pipeline: sample active bonds, union their endpoints, label the
//! resulting clusters and, where the model has a symmetry to exploit, flip whole clusters at
//! once. Models only decide which bonds are active and what a flip does, see [`ClusterModel`].

/// Infinite range Ising model with O(N) bond sampling.
pub mod infinite;
/// Ferromagnetic Ising model.
pub mod ising;
/// Bond and site percolation.
pub mod percolation;
/// q-state Potts model.
pub mod potts;
/// The driver shared by every classical model.
pub mod swendsen_wang;

pub use infinite::InfiniteRangeIsing;
pub use ising::Ising;
pub use percolation::{BondPercolation, SitePercolation};
pub use potts::Potts;
pub use swendsen_wang::SwendsenWang;

use crate::cluster::ClusterMoments;
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// The model specific half of a Swendsen-Wang sweep.
///
/// Random numbers must be drawn in the same order on every call so that a fixed seed gives a
/// reproducible chain.
pub trait ClusterModel {
    /// State of a single site.
    type Spin: Clone + Default + Debug + Serialize + DeserializeOwned;
    /// Action applied to every site of a cluster.
    type Flip: Copy + Debug;

    /// Check if `spin` is a state of this model. Restored configurations are checked with it.
    fn valid_spin(&self, _spin: &Self::Spin) -> bool {
        true
    }

    /// Resample any per sweep state before bonds are drawn.
    fn prepare<R: Rng>(&self, _spins: &mut [Self::Spin], _rng: &mut R) {}

    /// Decide whether the bond between two sites joins them.
    fn bond_active<R: Rng>(&self, a: &Self::Spin, b: &Self::Spin, rng: &mut R) -> bool;

    /// Report every pair of sites which belongs to the same cluster by calling `link`.
    ///
    /// The default walks the bonds of the lattice in order.
    fn connect<L, R, F>(&self, lattice: &L, spins: &[Self::Spin], rng: &mut R, mut link: F)
    where
        L: Lattice,
        R: Rng,
        F: FnMut(usize, usize),
    {
        for b in 0..lattice.num_bonds() {
            let (s0, s1) = lattice.bond(b);
            if self.bond_active(&spins[s0], &spins[s1], rng) {
                link(s0, s1);
            }
        }
    }

    /// Whether clusters are flipped at all.
    fn flips_clusters(&self) -> bool {
        true
    }

    /// Draw the flip for one cluster.
    fn sample_flip<R: Rng>(&self, rng: &mut R) -> Self::Flip;

    /// Apply a cluster's flip to one of its sites.
    fn apply_flip(&self, spin: &mut Self::Spin, flip: Self::Flip);

    /// Push this sweep's measurements.
    fn measure<L: Lattice>(
        &self,
        lattice: &L,
        spins: &[Self::Spin],
        moments: &ClusterMoments,
        obs: &mut ObservableSet,
    );
}

/// Magnetization moments shared by the Ising type models.
fn push_ising_magnetization(spins: &[bool], moments: &ClusterMoments, obs: &mut ObservableSet) {
    let mu: f64 = spins.iter().map(|s| if *s { -1.0 } else { 1.0 }).sum();
    let mu2 = mu * mu;
    obs.push("Magnetization (unimproved)", mu);
    obs.push("Magnetization^2 (unimproved)", mu2);
    obs.push("Magnetization^4 (unimproved)", mu2 * mu2);
    obs.push("Magnetization^2", moments.weight2);
    obs.push(
        "Magnetization^4",
        3.0 * moments.weight2 * moments.weight2 - 2.0 * moments.weight4,
    );
}
