use crate::cluster::{UnionFind, Verify};
use crate::error::{Result, SimulationError};
use crate::lattice::Lattice;
use crate::observables::ObservableSet;
use crate::sse::operator_string::OperatorString;
use crate::sse::{staggered_magnetization2, LoopUpdate};
use rand::Rng;
use std::mem;

/// Running totals of one loop cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) struct ClusterStats {
    pub(super) flip: bool,
    pub(super) size: i64,
    pub(super) mag: i64,
    pub(super) length: f64,
}

impl ClusterStats {
    /// Fresh totals for `num_clusters` loops, each flipped with probability one half.
    pub(super) fn draw<R: Rng>(clusters: &mut Vec<Self>, num_clusters: usize, rng: &mut R) {
        clusters.clear();
        clusters.extend((0..num_clusters).map(|_| ClusterStats {
            flip: rng.gen::<f64>() < 0.5,
            ..ClusterStats::default()
        }));
    }
}

/// Improved estimator sums from a single loop update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopEstimators {
    /// Non-identity operators after the diagonal update.
    pub num_operators: usize,
    /// Number of loop clusters.
    pub num_clusters: usize,
    /// Sum of squared cluster sizes at time zero.
    pub size2: f64,
    /// Sum of squared cluster magnetizations at time zero.
    pub mag2: f64,
    /// Sum of squared imaginary time lengths.
    pub length2: f64,
}

impl LoopEstimators {
    pub(super) fn collect(clusters: &[ClusterStats], num_operators: usize) -> Self {
        let square = |x: i64| (x as f64) * (x as f64);
        clusters.iter().fold(
            LoopEstimators {
                num_operators,
                num_clusters: clusters.len(),
                ..LoopEstimators::default()
            },
            |mut acc, c| {
                acc.size2 += square(c.size);
                acc.mag2 += square(c.mag);
                acc.length2 += c.length * c.length;
                acc
            },
        )
    }
}

/// Loop cluster algorithm for the spin-1/2 antiferromagnetic Heisenberg model in the stochastic
/// series expansion.
///
/// Spins are `true` when down. The diagonal update and the construction of loop fragments run
/// in a single pass over the operator string, afterwards every loop is flipped with probability
/// one half.
///
/// ```
/// use cluster_mc::lattice::ChainLattice;
/// use cluster_mc::observables::ObservableSet;
/// use cluster_mc::sse::HeisenbergLoop;
/// use rand::prelude::*;
///
/// let mut sim = HeisenbergLoop::new(ChainLattice::new(8), 1.0 / 0.2).unwrap();
/// let mut rng = SmallRng::seed_from_u64(29833);
/// let mut obs = ObservableSet::new();
/// for _ in 0..100 {
///     let est = sim.sweep(&mut rng).unwrap();
///     sim.measure(&est, &mut obs);
/// }
/// assert!(obs.mean("Energy Density").unwrap() < 0.0);
/// ```
#[derive(Debug)]
pub struct HeisenbergLoop<L: Lattice> {
    lattice: L,
    beta: f64,
    spins: Vec<bool>,
    operators: OperatorString,
    forest: UnionFind,
    current: Vec<usize>,
    clusters: Vec<ClusterStats>,
}

impl<L: Lattice> HeisenbergLoop<L> {
    /// Start from all spins up and an empty operator string at inverse temperature `beta`.
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
            operators: OperatorString::new(lattice.num_bonds()),
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

    /// The operator string.
    pub fn operators(&self) -> &OperatorString {
        &self.operators
    }

    /// Forest of the last sweep, labeled.
    pub fn forest(&self) -> &UnionFind {
        &self.forest
    }

    /// Replace the state with spins and an operator string, which must fit together.
    pub fn set_state(
        &mut self,
        spins: Vec<bool>,
        operators: Option<OperatorString>,
    ) -> Result<()> {
        if spins.len() != self.lattice.num_sites() {
            return Err(SimulationError::CheckpointMismatch {
                expected: self.lattice.num_sites(),
                found: spins.len(),
            });
        }
        let operators = match operators {
            Some(operators) => OperatorString::from_ops(operators.ops().to_vec()),
            None => OperatorString::new(self.lattice.num_bonds()),
        };
        let previous_spins = mem::replace(&mut self.spins, spins);
        let previous_ops = mem::replace(&mut self.operators, operators);
        if self.verify() {
            Ok(())
        } else {
            self.spins = previous_spins;
            self.operators = previous_ops;
            Err(SimulationError::InvariantViolation(
                "operator string is not periodic for the given spins".to_string(),
            ))
        }
    }

    /// Perform one diagonal update, loop construction and loop flip.
    pub fn sweep<R: Rng>(&mut self, rng: &mut R) -> Result<LoopEstimators> {
        self.operators.maybe_grow()?;

        let nsites = self.lattice.num_sites();
        let nbonds = self.lattice.num_bonds();
        let lb2 = nbonds as f64 * self.beta / 2.0;

        self.forest.reset(nsites);
        self.current.clear();
        self.current.extend(0..nsites);

        for slot in 0..self.operators.capacity() {
            let capacity = self.operators.capacity() as f64;
            let op = self.operators.ops()[slot];
            if op.is_identity() {
                let b = rng.gen_range(0..nbonds);
                let (s0, s1) = self.lattice.bond(b);
                let empty = capacity - self.operators.num_operators() as f64;
                if self.spins[s0] != self.spins[s1] && empty * rng.gen::<f64>() < lb2 {
                    self.operators.insert_diagonal(slot, b);
                } else {
                    continue;
                }
            } else if op.is_diagonal() {
                let empty = capacity - self.operators.num_operators() as f64;
                if lb2 * rng.gen::<f64>() < empty + 1.0 {
                    self.operators.remove(slot);
                    continue;
                }
            }

            let op = &mut self.operators.ops_mut()[slot];
            let (s0, s1) = self.lattice.bond(op.bond());
            op.lower = self.forest.union(self.current[s0], self.current[s1]);
            op.upper = self.forest.add();
            self.current[s0] = op.upper;
            self.current[s1] = op.upper;
            if op.is_offdiagonal() {
                self.spins[s0] ^= true;
                self.spins[s1] ^= true;
            }
        }

        for s in 0..nsites {
            self.forest.union(s, self.current[s]);
        }

        let num_clusters = self.forest.label();
        ClusterStats::draw(&mut self.clusters, num_clusters, rng);

        let num_operators = self.operators.num_operators();
        let mut t = 0.0;
        for op in self.operators.ops_mut().iter_mut() {
            if op.is_identity() {
                continue;
            }
            let id_lower = self.forest.id(op.lower);
            let id_upper = self.forest.id(op.upper);
            self.clusters[id_lower].length += 2.0 * t;
            self.clusters[id_upper].length -= 2.0 * t;
            if self.clusters[id_lower].flip ^ self.clusters[id_upper].flip {
                op.toggle();
            }
            t += 1.0;
        }

        for s in 0..nsites {
            let cluster = &mut self.clusters[self.forest.id(s)];
            cluster.size += 1;
            cluster.mag += if self.spins[s] { -1 } else { 1 };
            cluster.length += num_operators as f64;
            if cluster.flip {
                self.spins[s] ^= true;
            }
        }

        Ok(LoopEstimators::collect(&self.clusters, num_operators))
    }

    /// Push the improved measurements of a sweep.
    pub fn measure(&self, est: &LoopEstimators, obs: &mut ObservableSet) {
        let n = self.lattice.num_sites() as f64;
        let nb = self.lattice.num_bonds() as f64;
        let nop = est.num_operators as f64;
        let beta = self.beta;
        let length_term = if est.num_operators > 0 {
            est.length2 / nop
        } else {
            0.0
        };
        let energy = 0.25 * nb - nop / beta;
        obs.push("Number of Clusters", est.num_clusters as f64);
        obs.push("Energy Density", energy / n);
        obs.push("Staggered Magnetization^2", 0.25 * est.size2 / n);
        obs.push(
            "Staggered Magnetization^2 (unimproved)",
            staggered_magnetization2(&self.lattice, &self.spins),
        );
        obs.push("Uniform Susceptibility", 0.25 * beta * est.mag2 / n);
        obs.push(
            "Staggered Susceptibility",
            0.25 * beta * (length_term + est.size2) / (nop + 1.0) / n,
        );
    }
}

impl<L: Lattice> LoopUpdate for HeisenbergLoop<L> {
    type Operators = OperatorString;

    fn sweep<R: Rng>(&mut self, rng: &mut R) -> Result<LoopEstimators> {
        HeisenbergLoop::sweep(self, rng)
    }

    fn measure(&self, est: &LoopEstimators, obs: &mut ObservableSet) {
        HeisenbergLoop::measure(self, est, obs)
    }

    fn spins(&self) -> &[bool] {
        &self.spins
    }

    fn snapshot(&self) -> OperatorString {
        self.operators.clone()
    }

    fn set_state(&mut self, spins: Vec<bool>, operators: Option<OperatorString>) -> Result<()> {
        HeisenbergLoop::set_state(self, spins, operators)
    }
}

impl<L: Lattice> Verify for HeisenbergLoop<L> {
    /// Non-identity operators sit on antiparallel pairs and the world lines close in time.
    fn verify(&self) -> bool {
        let nbonds = self.lattice.num_bonds();
        let mut spins = self.spins.clone();
        for op in self.operators.ops().iter().filter(|op| !op.is_identity()) {
            if op.bond() >= nbonds {
                return false;
            }
            let (s0, s1) = self.lattice.bond(op.bond());
            if spins[s0] == spins[s1] {
                return false;
            }
            if op.is_offdiagonal() {
                spins[s0] ^= true;
                spins[s1] ^= true;
            }
        }
        let counted = self
            .operators
            .ops()
            .iter()
            .filter(|op| !op.is_identity())
            .count();
        spins == self.spins && counted == self.operators.num_operators()
    }
}

#[cfg(test)]
mod loop_tests {
    use super::*;
    use crate::lattice::{ChainLattice, SquareLattice};
    use crate::sse::LocalOperator;
    use rand::prelude::*;

    fn offdiagonal_count(ops: &[LocalOperator]) -> usize {
        ops.iter().filter(|op| op.is_offdiagonal()).count()
    }

    #[test]
    fn test_rejects_bad_beta() {
        assert!(HeisenbergLoop::new(ChainLattice::new(4), 0.0).is_err());
        assert!(HeisenbergLoop::new(ChainLattice::new(4), f64::INFINITY).is_err());
        assert!(HeisenbergLoop::new(ChainLattice::new(0), 1.0).is_err());
    }

    #[test]
    fn test_periodic_after_every_sweep() {
        let mut sim = HeisenbergLoop::new(ChainLattice::new(8), 5.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(29833);
        for _ in 0..200 {
            let est = sim.sweep(&mut rng).unwrap();
            assert!(sim.verify());
            assert!(sim.forest().verify());
            assert_eq!(offdiagonal_count(sim.operators().ops()) % 2, 0);
            assert_eq!(est.num_operators, sim.operators().num_operators());
            assert_eq!(sim.forest().total_weight(), 8);
        }
    }

    #[test]
    fn test_square_lattice() {
        let mut sim = HeisenbergLoop::new(SquareLattice::new(4), 2.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            sim.sweep(&mut rng).unwrap();
            assert!(sim.verify());
        }
    }

    #[test]
    fn test_capacity_grows() {
        let mut sim = HeisenbergLoop::new(ChainLattice::new(8), 10.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            sim.sweep(&mut rng).unwrap();
        }
        // <n> is roughly beta * N_b / 2 at low temperature, far above the initial 8 slots.
        assert!(sim.operators().capacity() > 8);
        assert!(sim.operators().capacity().is_power_of_two());
    }

    #[test]
    fn test_cluster_sizes_sum() {
        let mut sim = HeisenbergLoop::new(ChainLattice::new(6), 3.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..20 {
            let est = sim.sweep(&mut rng).unwrap();
            assert!(est.size2 >= 6.0);
            assert!(est.size2 <= 36.0);
        }
    }

    #[test]
    fn test_set_state_checks_periodicity() {
        let mut sim = HeisenbergLoop::new(ChainLattice::new(4), 1.0).unwrap();
        let mut ops = vec![LocalOperator::identity(); 4];
        ops[0] = LocalOperator::offdiagonal(0);
        let broken = OperatorString::from_ops(ops.clone());
        assert!(sim
            .set_state(vec![false, true, false, true], Some(broken))
            .is_err());
        assert_eq!(sim.spins(), &[false; 4]);

        ops[2] = LocalOperator::offdiagonal(0);
        let closed = OperatorString::from_ops(ops);
        assert!(sim
            .set_state(vec![false, true, false, true], Some(closed))
            .is_ok());
        assert_eq!(sim.operators().num_operators(), 2);
    }
}
