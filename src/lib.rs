#![deny(
    missing_docs,
    unreachable_pub,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

//! `cluster_mc` simulates lattice spin models and percolation with cluster update Monte Carlo.
//!
//! Every algorithm is built on the same engine, a union-find forest over fragments in
//! [`cluster`]:
//! - Swendsen-Wang updates of the Ising, Potts and infinite range Ising models, plus bond and
//!   site percolation, in [`classical`].
//! - The loop algorithm for the spin-1/2 Heisenberg antiferromagnet, both in the stochastic
//!   series expansion and in continuous imaginary time, in [`sse`].
//!
//! The `parallel` feature performs the unions of classical sweeps on the rayon thread pool.
//!
//! # Basic Ising Example
//! ```
//! use cluster_mc::classical::{Ising, SwendsenWang};
//! use cluster_mc::lattice::SquareLattice;
//! use cluster_mc::observables::ObservableSet;
//! use rand::prelude::*;
//!
//! let mut rng = SmallRng::seed_from_u64(29833);
//! let mut sw = SwendsenWang::new(SquareLattice::new(16), Ising::new(2.27).unwrap());
//! let mut obs = ObservableSet::new();
//!
//! // Thermalize, then measure.
//! (0..100).for_each(|_| {
//!     sw.sweep(&mut rng);
//! });
//! for _ in 0..1000 {
//!     let moments = sw.sweep(&mut rng);
//!     sw.measure(&moments, &mut obs);
//! }
//! let binder = obs.binder_ratio("Magnetization^2", "Magnetization^4").unwrap();
//! assert!(binder > 0.0);
//! ```
//!
//! # Running a Named Simulation
//! ```
//! use cluster_mc::config::Parameters;
//! use cluster_mc::worker::{run_simulation, WorkerKind};
//!
//! let mut params = Parameters::defaults_for(WorkerKind::Loop);
//! params.sweeps = 512;
//! params.therm = 64;
//! let report = run_simulation(&params, None).unwrap();
//! assert_eq!(report.sweeps_run, 576);
//! ```

/// Persisted chain state.
pub mod checkpoint;
/// Swendsen-Wang updates for classical models.
pub mod classical;
/// Union-find forest and cluster labeling.
pub mod cluster;
/// Run parameters.
pub mod config;
/// Error types.
pub mod error;
/// Lattice geometries.
pub mod lattice;
/// Measurement accumulators.
pub mod observables;
/// Loop updates for the quantum Heisenberg model.
pub mod sse;
/// Simulation harness and registry.
pub mod worker;

pub use error::{Result, SimulationError};
