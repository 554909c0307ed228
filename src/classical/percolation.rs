use crate::classical::ClusterModel;
use crate::cluster::ClusterMoments;
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use rand::Rng;

fn check_probability(probability: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(SimulationError::invalid(
            "probability",
            format!("must lie in [0, 1], got {}", probability),
        ))
    }
}

fn push_percolation_observables(nsites: usize, moments: &ClusterMoments, obs: &mut ObservableSet) {
    let n = nsites as f64;
    let wmax = moments.max_weight as f64;
    obs.push("Number of Clusters", moments.num_clusters as f64);
    obs.push("Strength of Largest Cluster", wmax / n);
    obs.push("Average Cluster Size", (moments.weight2 - wmax * wmax) / n);
}

/// Every bond is open with probability `p`, independent of any state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BondPercolation {
    probability: f64,
}

impl BondPercolation {
    /// Bond percolation with open probability `probability`.
    pub fn new(probability: f64) -> Result<Self> {
        Ok(Self {
            probability: check_probability(probability)?,
        })
    }

    /// Open probability.
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl ClusterModel for BondPercolation {
    type Spin = ();
    type Flip = ();

    fn bond_active<R: Rng>(&self, _a: &(), _b: &(), rng: &mut R) -> bool {
        rng.gen::<f64>() < self.probability
    }

    fn flips_clusters(&self) -> bool {
        false
    }

    fn sample_flip<R: Rng>(&self, _rng: &mut R) {}

    fn apply_flip(&self, _spin: &mut (), _flip: ()) {}

    fn measure<L: Lattice>(
        &self,
        lattice: &L,
        _spins: &[()],
        moments: &ClusterMoments,
        obs: &mut ObservableSet,
    ) {
        push_percolation_observables(lattice.num_sites(), moments, obs)
    }
}

/// Every site is occupied with probability `p`, resampled each sweep. Neighbouring occupied
/// sites are always joined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SitePercolation {
    probability: f64,
}

impl SitePercolation {
    /// Site percolation with occupation probability `probability`.
    pub fn new(probability: f64) -> Result<Self> {
        Ok(Self {
            probability: check_probability(probability)?,
        })
    }

    /// Occupation probability.
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl ClusterModel for SitePercolation {
    type Spin = bool;
    type Flip = ();

    fn prepare<R: Rng>(&self, occupied: &mut [bool], rng: &mut R) {
        occupied
            .iter_mut()
            .for_each(|o| *o = rng.gen::<f64>() < self.probability);
    }

    fn bond_active<R: Rng>(&self, a: &bool, b: &bool, _rng: &mut R) -> bool {
        *a && *b
    }

    fn flips_clusters(&self) -> bool {
        false
    }

    fn sample_flip<R: Rng>(&self, _rng: &mut R) {}

    fn apply_flip(&self, _spin: &mut bool, _flip: ()) {}

    fn measure<L: Lattice>(
        &self,
        lattice: &L,
        _spins: &[bool],
        moments: &ClusterMoments,
        obs: &mut ObservableSet,
    ) {
        push_percolation_observables(lattice.num_sites(), moments, obs)
    }
}

#[cfg(test)]
mod percolation_tests {
    use super::*;
    use crate::classical::SwendsenWang;
    use crate::lattice::SquareLattice;
    use rand::prelude::*;

    #[test]
    fn test_probability_range() {
        assert!(BondPercolation::new(-0.1).is_err());
        assert!(BondPercolation::new(1.1).is_err());
        assert!(SitePercolation::new(f64::NAN).is_err());
        assert!(SitePercolation::new(1.0).is_ok());
    }

    #[test]
    fn test_closed_bonds() {
        let mut sw = SwendsenWang::new(SquareLattice::new(4), BondPercolation::new(0.0).unwrap());
        let mut rng = SmallRng::seed_from_u64(5);
        let moments = sw.sweep(&mut rng);
        let mut obs = ObservableSet::new();
        sw.measure(&moments, &mut obs);
        assert_eq!(obs.mean("Number of Clusters"), Some(16.0));
        assert_eq!(obs.mean("Strength of Largest Cluster"), Some(1.0 / 16.0));
        assert_eq!(obs.mean("Average Cluster Size"), Some(15.0 / 16.0));
    }

    #[test]
    fn test_open_bonds() {
        let mut sw = SwendsenWang::new(SquareLattice::new(4), BondPercolation::new(1.0).unwrap());
        let mut rng = SmallRng::seed_from_u64(5);
        let moments = sw.sweep(&mut rng);
        assert_eq!(moments.num_clusters, 1);
        assert_eq!(moments.max_weight, 16);
    }

    #[test]
    fn test_site_percolation_limits() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut full = SwendsenWang::new(SquareLattice::new(4), SitePercolation::new(1.0).unwrap());
        assert_eq!(full.sweep(&mut rng).num_clusters, 1);
        assert!(full.spins().iter().all(|o| *o));

        let mut empty =
            SwendsenWang::new(SquareLattice::new(4), SitePercolation::new(0.0).unwrap());
        assert_eq!(empty.sweep(&mut rng).num_clusters, 16);
        assert!(empty.spins().iter().all(|o| !*o));
    }
}
