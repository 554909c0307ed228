use crate::classical::{push_ising_magnetization, ClusterModel};
use crate::cluster::ClusterMoments;
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use rand::Rng;

/// Ferromagnetic Ising model with unit coupling, spins are `true` when down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ising {
    temperature: f64,
    prob: f64,
}

impl Ising {
    /// Make a model at temperature `temperature`.
    pub fn new(temperature: f64) -> Result<Self> {
        if temperature.is_nan() || temperature <= 0.0 {
            return Err(SimulationError::invalid(
                "temperature",
                format!("must be positive, got {}", temperature),
            ));
        }
        Ok(Self {
            temperature,
            prob: 1.0 - (-2.0 / temperature).exp(),
        })
    }

    /// The temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Probability that a satisfied bond is active.
    pub fn bond_probability(&self) -> f64 {
        self.prob
    }
}

/// Total energy `-sum_<ij> s_i s_j` of a configuration.
pub(crate) fn ising_energy<L: Lattice>(lattice: &L, spins: &[bool]) -> f64 {
    (0..lattice.num_bonds())
        .map(|b| {
            let (s0, s1) = lattice.bond(b);
            if spins[s0] == spins[s1] {
                -1.0
            } else {
                1.0
            }
        })
        .sum()
}

impl ClusterModel for Ising {
    type Spin = bool;
    type Flip = bool;

    fn bond_active<R: Rng>(&self, a: &bool, b: &bool, rng: &mut R) -> bool {
        a == b && rng.gen::<f64>() < self.prob
    }

    fn sample_flip<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < 0.5
    }

    fn apply_flip(&self, spin: &mut bool, flip: bool) {
        *spin ^= flip;
    }

    fn measure<L: Lattice>(
        &self,
        lattice: &L,
        spins: &[bool],
        moments: &ClusterMoments,
        obs: &mut ObservableSet,
    ) {
        let energy = ising_energy(lattice, spins);
        obs.push("Number of Clusters", moments.num_clusters as f64);
        obs.push("Energy Density", energy / lattice.num_sites() as f64);
        obs.push("Energy", energy);
        obs.push("Energy^2", energy * energy);
        push_ising_magnetization(spins, moments, obs);
    }
}
