use crate::classical::{push_ising_magnetization, ClusterModel};
use crate::cluster::ClusterMoments;
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use rand::Rng;

/// Ising model where every pair of sites interacts with strength `1/N`.
///
/// Instead of visiting all `N(N-1)/2` bonds, active bonds arrive as a Poisson process with
/// rate `N/T` on the unit interval. Each arrival joins two uniformly chosen sites if they are
/// parallel, which costs O(N) per sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfiniteRangeIsing {
    temperature: f64,
}

impl InfiniteRangeIsing {
    /// Make a model at temperature `temperature`.
    pub fn new(temperature: f64) -> Result<Self> {
        if temperature.is_nan() || temperature <= 0.0 {
            return Err(SimulationError::invalid(
                "temperature",
                format!("must be positive, got {}", temperature),
            ));
        }
        Ok(Self { temperature })
    }

    /// The temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

/// Exponential variate with the given rate by inverse transform.
pub(crate) fn exponential<R: Rng>(rng: &mut R, rate: f64) -> f64 {
    -(1.0 - rng.gen::<f64>()).ln() / rate
}

impl ClusterModel for InfiniteRangeIsing {
    type Spin = bool;
    type Flip = bool;

    fn bond_active<R: Rng>(&self, a: &bool, b: &bool, _rng: &mut R) -> bool {
        a == b
    }

    fn connect<L, R, F>(&self, lattice: &L, spins: &[bool], rng: &mut R, mut link: F)
    where
        L: Lattice,
        R: Rng,
        F: FnMut(usize, usize),
    {
        let n = lattice.num_sites();
        if n == 0 {
            return;
        }
        let rate = n as f64 / self.temperature;
        let mut t = exponential(rng, rate);
        while t < 1.0 {
            let s0 = rng.gen_range(0..n);
            let s1 = rng.gen_range(0..n);
            if self.bond_active(&spins[s0], &spins[s1], rng) {
                link(s0, s1);
            }
            t += exponential(rng, rate);
        }
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
        let n = lattice.num_sites() as f64;
        let mu: f64 = spins.iter().map(|s| if *s { -1.0 } else { 1.0 }).sum();
        let energy = -(mu * mu - n) / (2.0 * n);
        obs.push("Number of Clusters", moments.num_clusters as f64);
        obs.push("Energy Density", energy / n);
        obs.push("Energy", energy);
        obs.push("Energy^2", energy * energy);
        push_ising_magnetization(spins, moments, obs);
    }
}

#[cfg(test)]
mod infinite_tests {
    use super::*;
    use crate::classical::SwendsenWang;
    use crate::cluster::Verify;
    use crate::lattice::FullyConnectedLattice;
    use rand::prelude::*;

    #[test]
    fn test_exponential_mean() {
        let mut rng = SmallRng::seed_from_u64(11);
        let samples = 20000;
        let mean = (0..samples).map(|_| exponential(&mut rng, 4.0)).sum::<f64>() / samples as f64;
        assert!((mean - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_low_temperature_orders() {
        let model = InfiniteRangeIsing::new(0.05).unwrap();
        let mut sw = SwendsenWang::new(FullyConnectedLattice::new(64), model);
        let mut rng = SmallRng::seed_from_u64(13);
        for _ in 0..20 {
            sw.sweep(&mut rng);
            assert!(sw.forest().verify());
        }
        let first = sw.spins()[0];
        assert!(sw.spins().iter().all(|s| *s == first));
    }

    #[test]
    fn test_ground_state_energy() {
        let model = InfiniteRangeIsing::new(1.0).unwrap();
        let sw = SwendsenWang::new(FullyConnectedLattice::new(8), model);
        let mut obs = ObservableSet::new();
        sw.measure(&ClusterMoments::default(), &mut obs);
        assert_eq!(obs.mean("Energy"), Some(-3.5));
    }
}
