use crate::classical::ClusterModel;
use crate::cluster::{ClusterMoments, UnionFind};
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use rand::Rng;

/// Runs Swendsen-Wang sweeps of a [`ClusterModel`] on a [`Lattice`].
///
/// ```
/// use cluster_mc::classical::{Ising, SwendsenWang};
/// use cluster_mc::lattice::SquareLattice;
/// use cluster_mc::observables::ObservableSet;
/// use rand::prelude::*;
///
/// let ising = Ising::new(2.27).unwrap();
/// let mut sw = SwendsenWang::new(SquareLattice::new(8), ising);
/// let mut rng = SmallRng::seed_from_u64(1234);
/// let mut obs = ObservableSet::new();
/// for _ in 0..100 {
///     let moments = sw.sweep(&mut rng);
///     sw.measure(&moments, &mut obs);
/// }
/// assert_eq!(obs.get("Energy Density").unwrap().count(), 100);
/// ```
#[derive(Debug)]
pub struct SwendsenWang<L: Lattice, M: ClusterModel> {
    lattice: L,
    model: M,
    spins: Vec<M::Spin>,
    forest: UnionFind,
    flips: Vec<M::Flip>,
}

impl<L: Lattice, M: ClusterModel> SwendsenWang<L, M> {
    /// Start from the all default configuration.
    pub fn new(lattice: L, model: M) -> Self {
        let n = lattice.num_sites();
        Self {
            spins: vec![M::Spin::default(); n],
            forest: UnionFind::new(n),
            flips: Vec::with_capacity(n),
            lattice,
            model,
        }
    }

    /// Start from a given configuration.
    pub fn new_with_spins(lattice: L, model: M, spins: Vec<M::Spin>) -> Result<Self> {
        let mut sw = Self::new(lattice, model);
        sw.set_spins(spins)?;
        Ok(sw)
    }

    /// The lattice.
    pub fn lattice(&self) -> &L {
        &self.lattice
    }

    /// The model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Current configuration.
    pub fn spins(&self) -> &[M::Spin] {
        &self.spins
    }

    /// Replace the configuration, which must have one valid state per site.
    pub fn set_spins(&mut self, spins: Vec<M::Spin>) -> Result<()> {
        if spins.len() != self.lattice.num_sites() {
            return Err(SimulationError::CheckpointMismatch {
                expected: self.lattice.num_sites(),
                found: spins.len(),
            });
        }
        if let Some(site) = spins.iter().position(|s| !self.model.valid_spin(s)) {
            return Err(SimulationError::invalid(
                "spins",
                format!("site {} holds {:?}", site, spins[site]),
            ));
        }
        self.spins = spins;
        Ok(())
    }

    /// Forest of the last sweep, labeled.
    pub fn forest(&self) -> &UnionFind {
        &self.forest
    }

    /// Perform one sweep and return the moments of the clusters it built.
    pub fn sweep<R: Rng>(&mut self, rng: &mut R) -> ClusterMoments {
        let Self {
            lattice,
            model,
            spins,
            forest,
            flips,
        } = self;
        model.prepare(spins, rng);
        forest.reset(lattice.num_sites());
        model.connect(&*lattice, spins, rng, |s0, s1| {
            forest.union(s0, s1);
        });
        let moments = forest.label_with_moments();
        Self::flip_clusters(model, spins, forest, flips, moments.num_clusters, rng);
        moments
    }

    /// Perform one sweep with the unions spread over the rayon thread pool.
    ///
    /// Bonds are drawn from `rng` in the same order as [`SwendsenWang::sweep`], so both build
    /// the same partition.
    #[cfg(feature = "parallel")]
    pub fn sweep_parallel<R: Rng>(&mut self, rng: &mut R) -> ClusterMoments {
        use crate::cluster::ConcurrentUnionFind;

        let Self {
            lattice,
            model,
            spins,
            forest,
            flips,
        } = self;
        model.prepare(spins, rng);
        let mut pairs = Vec::new();
        model.connect(&*lattice, spins, rng, |s0, s1| pairs.push((s0, s1)));
        let concurrent = ConcurrentUnionFind::new(lattice.num_sites());
        concurrent.union_all(&pairs);
        *forest = concurrent.into_forest();
        let moments = forest.label_with_moments();
        Self::flip_clusters(model, spins, forest, flips, moments.num_clusters, rng);
        moments
    }

    fn flip_clusters<R: Rng>(
        model: &M,
        spins: &mut [M::Spin],
        forest: &UnionFind,
        flips: &mut Vec<M::Flip>,
        num_clusters: usize,
        rng: &mut R,
    ) {
        if !model.flips_clusters() {
            return;
        }
        flips.clear();
        flips.extend((0..num_clusters).map(|_| model.sample_flip(rng)));
        spins
            .iter_mut()
            .enumerate()
            .for_each(|(s, spin)| model.apply_flip(spin, flips[forest.id(s)]));
    }

    /// Push the measurements of the current configuration.
    pub fn measure(&self, moments: &ClusterMoments, obs: &mut ObservableSet) {
        self.model.measure(&self.lattice, &self.spins, moments, obs);
    }
}
