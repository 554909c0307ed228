use crate::classical::infinite::exponential;
use crate::cluster::{UnionFind, Verify};
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use crate::sse::loop_update::{ClusterStats, LoopEstimators};
use crate::sse::operator_string::LocalOperator;
use crate::sse::{staggered_magnetization2, LoopUpdate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::mem;

/// A bond operator at a point in imaginary time, measured in units of the inverse temperature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedOperator {
    op: LocalOperator,
    time: f64,
}

impl TimedOperator {
    /// Place `op` at `time`, which lies in `[0, 1)`.
    pub fn new(op: LocalOperator, time: f64) -> Self {
        Self { op, time }
    }

    /// The operator.
    pub fn op(&self) -> &LocalOperator {
        &self.op
    }

    /// Imaginary time of the operator.
    pub fn time(&self) -> f64 {
        self.time
    }
}

/// Loop cluster algorithm for the spin-1/2 antiferromagnetic Heisenberg model in the continuous
/// imaginary time path integral.
///
/// Diagonal operators are proposed as a Poisson process of rate `beta * N_b / 2` on antiparallel
/// bonds, so there is no expansion cutoff and no operator string to grow. Spins are `true` when
/// down.
///
/// ```
/// use cluster_mc::lattice::ChainLattice;
/// use cluster_mc::observables::ObservableSet;
/// use cluster_mc::sse::ContinuousTimeLoop;
/// use rand::prelude::*;
///
/// let mut sim = ContinuousTimeLoop::new(ChainLattice::new(8), 1.0 / 0.2).unwrap();
/// let mut rng = SmallRng::seed_from_u64(29833);
/// let mut obs = ObservableSet::new();
/// for _ in 0..100 {
///     let est = sim.sweep(&mut rng).unwrap();
///     sim.measure(&est, &mut obs);
/// }
/// assert!(obs.mean("Energy Density").unwrap() < 0.0);
/// ```
#[derive(Debug)]
pub struct ContinuousTimeLoop<L: Lattice> {
    lattice: L,
    beta: f64,
    spins: Vec<bool>,
    operators: Vec<TimedOperator>,
    previous: Vec<TimedOperator>,
    forest: UnionFind,
    current: Vec<usize>,
    clusters: Vec<ClusterStats>,
}

impl<L: Lattice> ContinuousTimeLoop<L> {
    /// Start from all spins up and no operators at inverse temperature `beta`.
    pub fn new(lattice: L, beta: f64) -> Result<Self> {
        if beta.is_nan() || beta <= 0.0 || beta.is_infinite() {
            return Err(SimulationError::invalid(
                "temperature",
                format!("inverse temperature must be positive and finite, got {}", beta),
            ));
        }
        if lattice.num_sites() == 0 || lattice.num_bonds() == 0 {
            return Err(SimulationError::invalid(
                "length",
                "lattice needs at least one site and one bond",
            ));
        }
        let nsites = lattice.num_sites();
        Ok(Self {
            beta,
            spins: vec![false; nsites],
            operators: Vec::new(),
            previous: Vec::new(),
            forest: UnionFind::new(nsites),
            current: (0..nsites).collect(),
            clusters: Vec::new(),
            lattice,
        })
    }

    /// The lattice.
    pub fn lattice(&self) -> &L {
        &self.lattice
    }

    /// Inverse temperature.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Spins at imaginary time zero.
    pub fn spins(&self) -> &[bool] {
        &self.spins
    }

    /// Operators in time order.
    pub fn operators(&self) -> &[TimedOperator] {
        &self.operators
    }

    /// Forest of the last sweep, labeled.
    pub fn forest(&self) -> &UnionFind {
        &self.forest
    }

    /// Replace the state with spins and time ordered operators, which must fit together.
    pub fn set_state(
        &mut self,
        spins: Vec<bool>,
        operators: Option<Vec<TimedOperator>>,
    ) -> Result<()> {
        if spins.len() != self.lattice.num_sites() {
            return Err(SimulationError::CheckpointMismatch {
                expected: self.lattice.num_sites(),
                found: spins.len(),
            });
        }
        let previous_spins = mem::replace(&mut self.spins, spins);
        let previous_ops = mem::replace(&mut self.operators, operators.unwrap_or_default());
        if self.verify() {
            Ok(())
        } else {
            self.spins = previous_spins;
            self.operators = previous_ops;
            Err(SimulationError::InvariantViolation(
                "operators are not time ordered or not periodic for the given spins".to_string(),
            ))
        }
    }

    /// Perform one diagonal update, loop construction and loop flip.
    pub fn sweep<R: Rng>(&mut self, rng: &mut R) -> Result<LoopEstimators> {
        let nsites = self.lattice.num_sites();
        let nbonds = self.lattice.num_bonds();
        let rate = self.beta * nbonds as f64 / 2.0;

        self.forest.reset(nsites);
        self.current.clear();
        self.current.extend(0..nsites);

        // Merge the surviving operators of the last sweep with freshly proposed ones.
        mem::swap(&mut self.operators, &mut self.previous);
        self.operators.clear();
        let mut next = 0;
        let mut t = exponential(rng, rate);
        loop {
            let mut op = match self.previous.get(next) {
                Some(old) if t >= old.time => {
                    next += 1;
                    if old.op.is_diagonal() {
                        continue;
                    }
                    *old
                }
                None if t >= 1.0 => break,
                _ => {
                    let b = rng.gen_range(0..nbonds);
                    let (s0, s1) = self.lattice.bond(b);
                    let time = t;
                    t += exponential(rng, rate);
                    if self.spins[s0] == self.spins[s1] {
                        continue;
                    }
                    TimedOperator::new(LocalOperator::diagonal(b), time)
                }
            };

            let (s0, s1) = self.lattice.bond(op.op.bond());
            op.op.lower = self.forest.union(self.current[s0], self.current[s1]);
            op.op.upper = self.forest.add();
            self.current[s0] = op.op.upper;
            self.current[s1] = op.op.upper;
            if op.op.is_offdiagonal() {
                self.spins[s0] ^= true;
                self.spins[s1] ^= true;
            }
            self.operators.push(op);
        }

        for s in 0..nsites {
            self.forest.union(s, self.current[s]);
        }

        let num_clusters = self.forest.label();
        ClusterStats::draw(&mut self.clusters, num_clusters, rng);

        for op in self.operators.iter_mut() {
            let id_lower = self.forest.id(op.op.lower);
            let id_upper = self.forest.id(op.op.upper);
            self.clusters[id_lower].length += 2.0 * op.time;
            self.clusters[id_upper].length -= 2.0 * op.time;
            if self.clusters[id_lower].flip ^ self.clusters[id_upper].flip {
                op.op.toggle();
            }
        }

        for s in 0..nsites {
            let cluster = &mut self.clusters[self.forest.id(s)];
            cluster.size += 1;
            cluster.mag += if self.spins[s] { -1 } else { 1 };
            cluster.length += 1.0;
            if cluster.flip {
                self.spins[s] ^= true;
            }
        }

        Ok(LoopEstimators::collect(&self.clusters, self.operators.len()))
    }

    /// Push the improved measurements of a sweep.
    pub fn measure(&self, est: &LoopEstimators, obs: &mut ObservableSet) {
        let n = self.lattice.num_sites() as f64;
        let nb = self.lattice.num_bonds() as f64;
        let beta = self.beta;
        let energy = 0.25 * nb - est.num_operators as f64 / beta;
        obs.push("Number of Clusters", est.num_clusters as f64);
        obs.push("Energy Density", energy / n);
        obs.push("Staggered Magnetization^2", 0.25 * est.size2 / n);
        obs.push(
            "Staggered Magnetization^2 (unimproved)",
            staggered_magnetization2(&self.lattice, &self.spins),
        );
        obs.push("Uniform Susceptibility", 0.25 * beta * est.mag2 / n);
        obs.push("Staggered Susceptibility", 0.25 * beta * est.length2 / n);
    }
}

impl<L: Lattice> Verify for ContinuousTimeLoop<L> {
    /// Operators are time ordered on antiparallel pairs and the world lines close in time.
    fn verify(&self) -> bool {
        let nbonds = self.lattice.num_bonds();
        let ordered = self
            .operators
            .windows(2)
            .all(|pair| pair[0].time <= pair[1].time);
        let well_formed = self.operators.iter().all(|op| {
            (0.0..1.0).contains(&op.time) && !op.op.is_identity() && op.op.bond() < nbonds
        });
        if !(ordered && well_formed) {
            return false;
        }
        let mut spins = self.spins.clone();
        for op in self.operators.iter() {
            let (s0, s1) = self.lattice.bond(op.op.bond());
            if spins[s0] == spins[s1] {
                return false;
            }
            if op.op.is_offdiagonal() {
                spins[s0] ^= true;
                spins[s1] ^= true;
            }
        }
        spins == self.spins
    }
}

impl<L: Lattice> LoopUpdate for ContinuousTimeLoop<L> {
    type Operators = Vec<TimedOperator>;

    fn sweep<R: Rng>(&mut self, rng: &mut R) -> Result<LoopEstimators> {
        ContinuousTimeLoop::sweep(self, rng)
    }

    fn measure(&self, est: &LoopEstimators, obs: &mut ObservableSet) {
        ContinuousTimeLoop::measure(self, est, obs)
    }

    fn spins(&self) -> &[bool] {
        &self.spins
    }

    fn snapshot(&self) -> Vec<TimedOperator> {
        self.operators.clone()
    }

    fn set_state(&mut self, spins: Vec<bool>, operators: Option<Vec<TimedOperator>>) -> Result<()> {
        ContinuousTimeLoop::set_state(self, spins, operators)
    }
}

#[cfg(test)]
mod continuous_time_tests {
    use super::*;
    use crate::lattice::{ChainLattice, SquareLattice};
    use rand::prelude::*;

    #[test]
    fn test_rejects_bad_beta() {
        assert!(ContinuousTimeLoop::new(ChainLattice::new(4), -1.0).is_err());
        assert!(ContinuousTimeLoop::new(ChainLattice::new(4), f64::NAN).is_err());
        assert!(ContinuousTimeLoop::new(ChainLattice::new(0), 1.0).is_err());
    }

    #[test]
    fn test_consistent_after_every_sweep() {
        let mut sim = ContinuousTimeLoop::new(ChainLattice::new(8), 5.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(29833);
        for _ in 0..200 {
            let est = sim.sweep(&mut rng).unwrap();
            assert!(sim.verify());
            assert!(sim.forest().verify());
            assert_eq!(sim.forest().total_weight(), 8);
            assert_eq!(est.num_operators, sim.operators().len());
            let offdiagonal = sim
                .operators()
                .iter()
                .filter(|op| op.op().is_offdiagonal())
                .count();
            assert_eq!(offdiagonal % 2, 0);
        }
    }

    #[test]
    fn test_square_lattice() {
        let mut sim = ContinuousTimeLoop::new(SquareLattice::new(4), 2.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            sim.sweep(&mut rng).unwrap();
            assert!(sim.verify());
        }
    }

    #[test]
    fn test_set_state_checks_order_and_periodicity() {
        let mut sim = ContinuousTimeLoop::new(ChainLattice::new(4), 1.0).unwrap();
        let neel = vec![false, true, false, true];
        let first = TimedOperator::new(LocalOperator::offdiagonal(0), 0.25);
        let second = TimedOperator::new(LocalOperator::offdiagonal(0), 0.75);

        assert!(sim.set_state(neel.clone(), Some(vec![first])).is_err());
        assert!(sim
            .set_state(neel.clone(), Some(vec![second, first]))
            .is_err());
        assert_eq!(sim.spins(), &[false; 4]);
        assert!(sim.operators().is_empty());

        sim.set_state(neel.clone(), Some(vec![first, second])).unwrap();
        assert_eq!(sim.operators().len(), 2);
        assert_eq!(sim.spins(), neel.as_slice());
    }

    #[test]
    fn test_snapshot_restores() {
        let mut sim = ContinuousTimeLoop::new(ChainLattice::new(6), 3.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..20 {
            sim.sweep(&mut rng).unwrap();
        }
        let mut other = ContinuousTimeLoop::new(ChainLattice::new(6), 3.0).unwrap();
        LoopUpdate::set_state(&mut other, sim.spins().to_vec(), Some(sim.snapshot())).unwrap();
        assert_eq!(other.operators(), sim.operators());
    }
}
