#![cfg(feature = "parallel")]
extern crate cluster_mc;
extern crate rand;

use cluster_mc::classical::{BondPercolation, Ising, SwendsenWang};
use cluster_mc::cluster::{UnionFind, Verify};
use cluster_mc::lattice::SquareLattice;
use rand::prelude::*;

/// Smallest site index of each site's cluster.
fn canonical(forest: &UnionFind) -> Vec<usize> {
    let mut smallest = vec![usize::MAX; forest.len()];
    (0..forest.len()).for_each(|s| {
        let id = forest.id(s);
        smallest[id] = smallest[id].min(s);
    });
    (0..forest.len()).map(|s| smallest[forest.id(s)]).collect()
}

#[test]
fn parallel_partition_matches_serial_test() {
    for seed in 0..8 {
        let mut serial =
            SwendsenWang::new(SquareLattice::new(32), BondPercolation::new(0.5).unwrap());
        let mut parallel =
            SwendsenWang::new(SquareLattice::new(32), BondPercolation::new(0.5).unwrap());
        let a = serial.sweep(&mut SmallRng::seed_from_u64(seed));
        let b = parallel.sweep_parallel(&mut SmallRng::seed_from_u64(seed));
        assert_eq!(a, b);
        assert!(parallel.forest().verify());
        assert_eq!(canonical(serial.forest()), canonical(parallel.forest()));
    }
}

#[test]
fn parallel_ising_sweeps_test() {
    let mut sw = SwendsenWang::new(SquareLattice::new(16), Ising::new(2.27).unwrap());
    let mut rng = SmallRng::seed_from_u64(29833);
    for _ in 0..20 {
        let moments = sw.sweep_parallel(&mut rng);
        assert!(sw.forest().verify());
        assert_eq!(sw.forest().total_weight(), 256);
        assert!(moments.num_clusters >= 1);
    }
}
