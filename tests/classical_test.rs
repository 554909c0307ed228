extern crate cluster_mc;
extern crate rand;

use cluster_mc::classical::{
    BondPercolation, ClusterModel, InfiniteRangeIsing, Ising, Potts, SitePercolation,
    SwendsenWang,
};
use cluster_mc::cluster::Verify;
use cluster_mc::lattice::{
    ChainLattice, FullyConnectedLattice, GraphLattice, Lattice, SquareLattice,
};
use cluster_mc::observables::ObservableSet;
use rand::prelude::*;

#[test]
fn frozen_ring_flips_together_test() {
    let mut sw = SwendsenWang::new(ChainLattice::new(4), Ising::new(1e-3).unwrap());
    let mut rng = SmallRng::seed_from_u64(29833);
    let mut seen = [false; 2];
    for _ in 0..64 {
        let moments = sw.sweep(&mut rng);
        assert_eq!(moments.num_clusters, 1);
        assert_eq!(moments.max_weight, 4);
        assert_eq!(moments.weight2, 16.0);
        let spins = sw.spins();
        assert!(spins.iter().all(|s| *s == spins[0]));
        seen[spins[0] as usize] = true;
    }
    assert!(seen[0] && seen[1]);
}

#[test]
fn hot_potts_plaquette_test() {
    let mut sw = SwendsenWang::new(SquareLattice::new(2), Potts::new(3, 1e300).unwrap());
    let mut rng = SmallRng::seed_from_u64(1);
    let mut obs = ObservableSet::new();
    for _ in 0..16 {
        let moments = sw.sweep(&mut rng);
        assert_eq!(moments.num_clusters, 4);
        sw.measure(&moments, &mut obs);
    }
    assert_eq!(obs.mean("Number of Clusters"), Some(4.0));
    assert_eq!(obs.mean("Order Parameter^2"), Some(4.0));
}

#[test]
fn percolation_limits_test() {
    let mut rng = SmallRng::seed_from_u64(5);
    let lattice = SquareLattice::new_rectangular(6, 4);
    let mut closed = SwendsenWang::new(lattice.clone(), BondPercolation::new(0.0).unwrap());
    let mut obs = ObservableSet::new();
    let moments = closed.sweep(&mut rng);
    closed.measure(&moments, &mut obs);
    assert_eq!(obs.mean("Number of Clusters"), Some(24.0));
    assert_eq!(obs.mean("Strength of Largest Cluster"), Some(1.0 / 24.0));

    let mut open = SwendsenWang::new(lattice, BondPercolation::new(1.0).unwrap());
    let mut obs = ObservableSet::new();
    let moments = open.sweep(&mut rng);
    open.measure(&moments, &mut obs);
    assert_eq!(obs.mean("Number of Clusters"), Some(1.0));
    assert_eq!(obs.mean("Strength of Largest Cluster"), Some(1.0));
    assert_eq!(obs.mean("Average Cluster Size"), Some(0.0));
}

#[test]
fn site_percolation_clusters_are_occupied_components_test() {
    let lattice = SquareLattice::new(8);
    let graph = GraphLattice::from_lattice(&lattice);
    let mut sw = SwendsenWang::new(lattice, SitePercolation::new(0.6).unwrap());
    let mut rng = SmallRng::seed_from_u64(77);
    for _ in 0..10 {
        sw.sweep(&mut rng);
        let occupied = sw.spins();
        let forest = sw.forest();
        for s in 0..graph.num_sites() {
            for t in graph.neighbors(s) {
                if occupied[s] && occupied[t] {
                    assert_eq!(forest.id(s), forest.id(t));
                }
            }
            if !occupied[s] {
                assert_eq!(forest.weight(s), 1);
                assert!(forest.is_root(s));
            }
        }
    }
}

#[test]
fn ising_ordered_below_critical_test() {
    let mut sw = SwendsenWang::new(SquareLattice::new(16), Ising::new(1.5).unwrap());
    let mut rng = SmallRng::seed_from_u64(29833);
    let mut obs = ObservableSet::new();
    (0..100).for_each(|_| {
        sw.sweep(&mut rng);
    });
    for _ in 0..500 {
        let moments = sw.sweep(&mut rng);
        assert!(sw.forest().verify());
        sw.measure(&moments, &mut obs);
    }
    // At T = 1.5 the magnetization per site is about 0.99.
    let n = 256.0;
    let m2 = obs.mean("Magnetization^2").unwrap() / (n * n);
    let m2_unimproved = obs.mean("Magnetization^2 (unimproved)").unwrap() / (n * n);
    assert!(m2 > 0.9, "{}", m2);
    assert!((m2 - m2_unimproved).abs() < 0.05);
    let binder = obs
        .binder_ratio("Magnetization^2", "Magnetization^4")
        .unwrap();
    assert!(binder > 0.9 && binder < 1.05, "{}", binder);
    let e = obs.mean("Energy Density").unwrap();
    assert!(e < -1.8 && e > -2.0, "{}", e);
}

#[test]
fn infinite_range_matches_pair_count_test() {
    let model = InfiniteRangeIsing::new(2.0).unwrap();
    let lattice = FullyConnectedLattice::new(64);
    let spins = vec![false; 64];
    let mut rng = SmallRng::seed_from_u64(3);
    let trials = 2000;
    let mut links = 0usize;
    for _ in 0..trials {
        model.connect(&lattice, &spins, &mut rng, |_, _| links += 1);
    }
    // Poisson arrivals with rate N / T on the unit interval.
    let mean = links as f64 / trials as f64;
    assert!((mean - 32.0).abs() < 1.0, "{}", mean);
}

#[test]
fn seeded_chains_agree_test() {
    let run = |seed: u64| {
        let mut sw = SwendsenWang::new(SquareLattice::new(8), Potts::new(3, 0.994973).unwrap());
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..32).for_each(|_| {
            sw.sweep(&mut rng);
        });
        sw.spins().to_vec()
    };
    assert_eq!(run(29833), run(29833));
}
