use crate::classical::ClusterModel;
use crate::cluster::ClusterMoments;
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use rand::Rng;

/// Ferromagnetic q-state Potts model, spins take values in `0..q`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Potts {
    q: u32,
    temperature: f64,
    prob: f64,
}

impl Potts {
    /// Make a `q` state model at temperature `temperature`, `q` must be at least 2.
    pub fn new(q: u32, temperature: f64) -> Result<Self> {
        if q <= 1 {
            return Err(SimulationError::invalid(
                "q",
                format!("need at least two states, got {}", q),
            ));
        }
        if temperature.is_nan() || temperature <= 0.0 {
            return Err(SimulationError::invalid(
                "temperature",
                format!("must be positive, got {}", temperature),
            ));
        }
        Ok(Self {
            q,
            temperature,
            prob: 1.0 - (-1.0 / temperature).exp(),
        })
    }

    /// Number of states.
    pub fn q(&self) -> u32 {
        self.q
    }

    /// The temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl ClusterModel for Potts {
    type Spin = u32;
    type Flip = u32;

    fn bond_active<R: Rng>(&self, a: &u32, b: &u32, rng: &mut R) -> bool {
        a == b && rng.gen::<f64>() < self.prob
    }

    fn valid_spin(&self, spin: &u32) -> bool {
        *spin < self.q
    }

    fn sample_flip<R: Rng>(&self, rng: &mut R) -> u32 {
        rng.gen_range(0..self.q)
    }

    fn apply_flip(&self, spin: &mut u32, shift: u32) {
        let shifted = (u64::from(*spin) + u64::from(shift)) % u64::from(self.q);
        *spin = shifted as u32;
    }

    fn measure<L: Lattice>(
        &self,
        lattice: &L,
        spins: &[u32],
        moments: &ClusterMoments,
        obs: &mut ObservableSet,
    ) {
        let satisfied = (0..lattice.num_bonds())
            .filter(|b| {
                let (s0, s1) = lattice.bond(*b);
                spins[s0] == spins[s1]
            })
            .count() as f64;
        let energy = -satisfied;
        let fc = 2.0 / f64::from(self.q - 1);
        let w2 = moments.weight2;
        obs.push("Number of Clusters", moments.num_clusters as f64);
        obs.push("Energy Density", energy / lattice.num_sites() as f64);
        obs.push("Energy", energy);
        obs.push("Energy^2", energy * energy);
        obs.push("Order Parameter^2", w2);
        obs.push("Order Parameter^4", (1.0 + fc) * w2 * w2 - fc * moments.weight4);
    }
}
