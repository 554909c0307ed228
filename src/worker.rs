//! A uniform harness around every simulation: sweep counting, thermalization, measurement and
//! checkpoints, plus a registry to build a worker by name.

use crate::checkpoint::Checkpoint;
use crate::classical::{
    BondPercolation, ClusterModel, InfiniteRangeIsing, Ising, Potts, SitePercolation,
    SwendsenWang,
};
use crate::config::Parameters;
use crate::error::{Result, SimulationError};
use crate::lattice::{ChainLattice, FullyConnectedLattice, Lattice, SquareLattice};
use crate::observables::ObservableSet;
use crate::sse::{ContinuousTimeLoop, HeisenbergLoop, LoopUpdate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Counts sweeps and splits them into thermalization and measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct McSteps {
    done: u64,
    therm: u64,
    sweeps: u64,
}

impl McSteps {
    /// `therm` thermalization sweeps followed by `sweeps` measured ones.
    pub fn new(therm: u64, sweeps: u64) -> Self {
        Self {
            done: 0,
            therm,
            sweeps,
        }
    }

    /// Count one sweep.
    pub fn step(&mut self) {
        self.done += 1;
    }

    /// Sweeps done so far.
    pub fn done(&self) -> u64 {
        self.done
    }

    /// Total number of sweeps to run.
    pub fn total(&self) -> u64 {
        self.therm + self.sweeps
    }

    /// Check if the next sweep should be measured.
    pub fn is_thermalized(&self) -> bool {
        self.done >= self.therm
    }

    /// Check if every sweep has been run.
    pub fn is_finished(&self) -> bool {
        self.done >= self.total()
    }

    /// Fraction of the run completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total() == 0 {
            1.0
        } else {
            (self.done as f64 / self.total() as f64).min(1.0)
        }
    }

    pub(crate) fn set_done(&mut self, done: u64) {
        self.done = done;
    }
}

/// A Markov chain which can be stepped, measured and checkpointed.
pub trait Worker<R: Rng>: Debug {
    /// Title of the simulation.
    fn title(&self) -> &'static str;

    /// Run one sweep, measuring into `obs` once thermalized.
    fn sweep(&mut self, rng: &mut R, obs: &mut ObservableSet) -> Result<()>;

    /// The sweep counter.
    fn steps(&self) -> &McSteps;

    /// Check if measurements are being taken.
    fn is_thermalized(&self) -> bool {
        self.steps().is_thermalized()
    }

    /// Fraction of the run completed.
    fn progress(&self) -> f64 {
        self.steps().progress()
    }

    /// Serialize the chain state.
    fn checkpoint(&self) -> Result<Vec<u8>>;

    /// Continue from a serialized chain state.
    fn restore(&mut self, bytes: &[u8]) -> Result<()>;

    /// Quantities computed from the accumulated means.
    fn derived(&self, _obs: &ObservableSet) -> Vec<(&'static str, f64)> {
        vec![]
    }
}

/// Wraps a [`SwendsenWang`] driver.
#[derive(Debug)]
pub struct ClassicalWorker<L: Lattice, M: ClusterModel> {
    title: &'static str,
    driver: SwendsenWang<L, M>,
    steps: McSteps,
    beta: Option<f64>,
    binder: Option<(&'static str, &'static str)>,
}

impl<L: Lattice, M: ClusterModel> ClassicalWorker<L, M> {
    /// Wrap a driver.
    pub fn new(title: &'static str, driver: SwendsenWang<L, M>, steps: McSteps) -> Self {
        Self {
            title,
            driver,
            steps,
            beta: None,
            binder: None,
        }
    }

    /// Report the specific heat at inverse temperature `beta`.
    pub fn with_specific_heat(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    /// Report the Binder ratio of the two named moments.
    pub fn with_binder_ratio(mut self, m2: &'static str, m4: &'static str) -> Self {
        self.binder = Some((m2, m4));
        self
    }
}

impl<R, L, M> Worker<R> for ClassicalWorker<L, M>
where
    R: Rng,
    L: Lattice + Debug,
    M: ClusterModel + Debug,
{
    fn title(&self) -> &'static str {
        self.title
    }

    fn sweep(&mut self, rng: &mut R, obs: &mut ObservableSet) -> Result<()> {
        let measure = self.steps.is_thermalized();
        #[cfg(feature = "parallel")]
        let moments = self.driver.sweep_parallel(rng);
        #[cfg(not(feature = "parallel"))]
        let moments = self.driver.sweep(rng);
        if measure {
            self.driver.measure(&moments, obs);
        }
        self.steps.step();
        trace!(sweep = self.steps.done(), clusters = moments.num_clusters, "sweep done");
        Ok(())
    }

    fn steps(&self) -> &McSteps {
        &self.steps
    }

    fn checkpoint(&self) -> Result<Vec<u8>> {
        Checkpoint::new(self.steps.done(), self.driver.spins().to_vec()).to_bytes()
    }

    fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        let ckpt = Checkpoint::<M::Spin>::from_bytes(bytes)?;
        self.driver.set_spins(ckpt.spins)?;
        self.steps.set_done(ckpt.sweeps);
        Ok(())
    }

    fn derived(&self, obs: &ObservableSet) -> Vec<(&'static str, f64)> {
        let mut derived = vec![];
        if let Some(ratio) = self.binder.and_then(|(m2, m4)| obs.binder_ratio(m2, m4)) {
            derived.push(("Binder Ratio", ratio));
        }
        let nsites = self.driver.lattice().num_sites();
        if let Some(c) = self.beta.and_then(|beta| obs.specific_heat(beta, nsites)) {
            derived.push(("Specific Heat", c));
        }
        derived
    }
}

/// Wraps a loop update, either [`HeisenbergLoop`] or [`ContinuousTimeLoop`].
#[derive(Debug)]
pub struct LoopWorker<S: LoopUpdate> {
    title: &'static str,
    sim: S,
    steps: McSteps,
}

impl<S: LoopUpdate> LoopWorker<S> {
    /// Wrap a loop simulation.
    pub fn new(title: &'static str, sim: S, steps: McSteps) -> Self {
        Self { title, sim, steps }
    }
}

impl<R: Rng, S: LoopUpdate + Debug> Worker<R> for LoopWorker<S> {
    fn title(&self) -> &'static str {
        self.title
    }

    fn sweep(&mut self, rng: &mut R, obs: &mut ObservableSet) -> Result<()> {
        let measure = self.steps.is_thermalized();
        let est = self.sim.sweep(rng)?;
        if measure {
            self.sim.measure(&est, obs);
        }
        self.steps.step();
        trace!(
            sweep = self.steps.done(),
            operators = est.num_operators,
            clusters = est.num_clusters,
            "sweep done"
        );
        Ok(())
    }

    fn steps(&self) -> &McSteps {
        &self.steps
    }

    fn checkpoint(&self) -> Result<Vec<u8>> {
        Checkpoint::new(self.steps.done(), self.sim.spins().to_vec())
            .with_operators(self.sim.snapshot())
            .to_bytes()
    }

    fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        let ckpt = Checkpoint::<bool, S::Operators>::from_bytes(bytes)?;
        self.sim.set_state(ckpt.spins, ckpt.operators)?;
        self.steps.set_done(ckpt.sweeps);
        Ok(())
    }
}

/// The simulations which can be built by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerKind {
    /// Ising model on the square lattice.
    Ising,
    /// Potts model on the square lattice.
    Potts,
    /// Infinite range Ising model.
    Infinite,
    /// Bond percolation on the square lattice.
    BondPercolation,
    /// Site percolation on the square lattice.
    SitePercolation,
    /// Heisenberg chain with the SSE loop algorithm.
    Loop,
    /// Heisenberg chain with the loop algorithm in continuous imaginary time.
    LoopPi0,
}

impl WorkerKind {
    /// Every registered worker.
    pub const ALL: [WorkerKind; 7] = [
        WorkerKind::Ising,
        WorkerKind::Potts,
        WorkerKind::Infinite,
        WorkerKind::BondPercolation,
        WorkerKind::SitePercolation,
        WorkerKind::Loop,
        WorkerKind::LoopPi0,
    ];

    /// Registered name.
    pub fn name(self) -> &'static str {
        match self {
            WorkerKind::Ising => "ising",
            WorkerKind::Potts => "potts",
            WorkerKind::Infinite => "infinite",
            WorkerKind::BondPercolation => "bond percolation",
            WorkerKind::SitePercolation => "site percolation",
            WorkerKind::Loop => "loop",
            WorkerKind::LoopPi0 => "loop pi0",
        }
    }

    /// Check if the model has a temperature.
    pub fn is_thermal(self) -> bool {
        !matches!(
            self,
            WorkerKind::BondPercolation | WorkerKind::SitePercolation
        )
    }

    /// Check if the model is a quantum loop update.
    pub fn is_quantum(self) -> bool {
        matches!(self, WorkerKind::Loop | WorkerKind::LoopPi0)
    }

    /// Check if the model has an occupation probability.
    pub fn is_percolation(self) -> bool {
        !self.is_thermal()
    }

    /// Build a worker from validated parameters.
    pub fn build<R: Rng>(self, params: &Parameters) -> Result<Box<dyn Worker<R>>> {
        params.validate()?;
        let steps = McSteps::new(params.therm, params.sweeps);
        let beta = 1.0 / params.temperature;
        let square = || SquareLattice::new(params.length);
        let worker: Box<dyn Worker<R>> = match self {
            WorkerKind::Ising => Box::new(
                ClassicalWorker::new(
                    "Swendsen-Wang Cluster Algorithm for Square Lattice Ising Model",
                    SwendsenWang::new(square(), Ising::new(params.temperature)?),
                    steps,
                )
                .with_specific_heat(beta)
                .with_binder_ratio("Magnetization^2", "Magnetization^4"),
            ),
            WorkerKind::Potts => Box::new(
                ClassicalWorker::new(
                    "Swendsen-Wang Cluster Algorithm for Square Lattice Potts Model",
                    SwendsenWang::new(square(), Potts::new(params.q, params.temperature)?),
                    steps,
                )
                .with_specific_heat(beta)
                .with_binder_ratio("Order Parameter^2", "Order Parameter^4"),
            ),
            WorkerKind::Infinite => Box::new(
                ClassicalWorker::new(
                    "O(N) Swendsen-Wang Cluster Algorithm for Infinite Range Ising Model",
                    SwendsenWang::new(
                        FullyConnectedLattice::new(params.num_sites),
                        InfiniteRangeIsing::new(params.temperature)?,
                    ),
                    steps,
                )
                .with_specific_heat(beta)
                .with_binder_ratio("Magnetization^2", "Magnetization^4"),
            ),
            WorkerKind::BondPercolation => Box::new(ClassicalWorker::new(
                "Bond Percolation Problem on Square Lattice",
                SwendsenWang::new(square(), BondPercolation::new(params.probability)?),
                steps,
            )),
            WorkerKind::SitePercolation => Box::new(ClassicalWorker::new(
                "Site Percolation Problem on Square Lattice",
                SwendsenWang::new(square(), SitePercolation::new(params.probability)?),
                steps,
            )),
            WorkerKind::Loop => Box::new(LoopWorker::new(
                "Loop Algorithm for Spin-1/2 Antiferromagnetic Heisenberg Model",
                HeisenbergLoop::new(ChainLattice::new(params.length), beta)?,
                steps,
            )),
            WorkerKind::LoopPi0 => Box::new(LoopWorker::new(
                "Continuous Time Loop Algorithm for Spin-1/2 Antiferromagnetic Heisenberg Model",
                ContinuousTimeLoop::new(ChainLattice::new(params.length), beta)?,
                steps,
            )),
        };
        Ok(worker)
    }
}

impl Display for WorkerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkerKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        WorkerKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| SimulationError::UnknownModel(s.to_string()))
    }
}

/// Outcome of [`run_simulation`].
#[derive(Debug)]
pub struct SimulationReport {
    /// Title of the simulation.
    pub title: &'static str,
    /// Accumulated observables.
    pub observables: ObservableSet,
    /// Quantities computed from the observables.
    pub derived: Vec<(&'static str, f64)>,
    /// Sweeps run in this invocation.
    pub sweeps_run: u64,
    /// Wall clock time of the sweeps.
    pub elapsed: Duration,
    /// Chain state after the last sweep.
    pub checkpoint: Vec<u8>,
}

impl SimulationReport {
    /// Sweeps per second.
    pub fn speed(&self) -> f64 {
        self.sweeps_run as f64 / self.elapsed.as_secs_f64().max(f64::MIN_POSITIVE)
    }
}

/// Build the worker named in `params`, optionally restore it, and run it to the end.
///
/// The random stream is a [`ChaCha8Rng`] seeded with `params.seed`, so runs are reproducible.
/// A restored run continues the sweep counter but starts a fresh stream.
pub fn run_simulation(params: &Parameters, restore: Option<&[u8]>) -> Result<SimulationReport> {
    let mut worker = params.model.build::<ChaCha8Rng>(params)?;
    if let Some(bytes) = restore {
        worker.restore(bytes)?;
        info!(sweeps = worker.steps().done(), "restored checkpoint");
    }
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut obs = ObservableSet::new();
    debug!(model = %params.model, seed = params.seed, "starting run");

    let start = Instant::now();
    let first = worker.steps().done();
    let mut was_thermalized = worker.is_thermalized();
    while !worker.steps().is_finished() {
        worker.sweep(&mut rng, &mut obs)?;
        if !was_thermalized && worker.is_thermalized() {
            debug!(sweeps = worker.steps().done(), "thermalized");
            was_thermalized = true;
        }
    }
    let elapsed = start.elapsed();
    let sweeps_run = worker.steps().done() - first;
    info!(
        sweeps = sweeps_run,
        elapsed = elapsed.as_secs_f64(),
        "run finished"
    );

    Ok(SimulationReport {
        title: worker.title(),
        derived: worker.derived(&obs),
        observables: obs,
        sweeps_run,
        elapsed,
        checkpoint: worker.checkpoint()?,
    })
}

#[cfg(test)]
mod worker_tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_mc_steps() {
        let mut steps = McSteps::new(2, 3);
        assert!(!steps.is_thermalized());
        steps.step();
        steps.step();
        assert!(steps.is_thermalized());
        assert!(!steps.is_finished());
        (0..3).for_each(|_| steps.step());
        assert!(steps.is_finished());
        assert_eq!(steps.progress(), 1.0);
    }

    #[test]
    fn test_names_roundtrip() {
        for kind in WorkerKind::ALL.iter() {
            assert_eq!(kind.name().parse::<WorkerKind>().unwrap(), *kind);
        }
        assert_eq!(
            "bond-percolation".parse::<WorkerKind>().unwrap(),
            WorkerKind::BondPercolation
        );
        assert_eq!(
            "loop_pi0".parse::<WorkerKind>().unwrap(),
            WorkerKind::LoopPi0
        );
        assert!(matches!(
            "xy".parse::<WorkerKind>(),
            Err(SimulationError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_measures_only_after_therm() {
        let mut params = Parameters::defaults_for(WorkerKind::Ising);
        params.therm = 5;
        params.sweeps = 7;
        let mut worker = WorkerKind::Ising.build::<SmallRng>(&params).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut obs = ObservableSet::new();
        while !worker.steps().is_finished() {
            worker.sweep(&mut rng, &mut obs).unwrap();
        }
        assert_eq!(obs.get("Number of Clusters").unwrap().count(), 7);
    }

    #[test]
    fn test_restore_continues_counter() {
        let mut params = Parameters::defaults_for(WorkerKind::Potts);
        params.therm = 0;
        params.sweeps = 10;
        let mut worker = WorkerKind::Potts.build::<SmallRng>(&params).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut obs = ObservableSet::new();
        (0..4).for_each(|_| worker.sweep(&mut rng, &mut obs).unwrap());
        let bytes = worker.checkpoint().unwrap();

        let mut other = WorkerKind::Potts.build::<SmallRng>(&params).unwrap();
        other.restore(&bytes).unwrap();
        assert_eq!(other.steps().done(), 4);
        assert_eq!(other.checkpoint().unwrap(), bytes);
    }

    #[test]
    fn test_loop_checkpoints_do_not_mix() {
        let mut params = Parameters::defaults_for(WorkerKind::Loop);
        params.therm = 0;
        params.sweeps = 10;
        let mut rng = SmallRng::seed_from_u64(5);
        let mut obs = ObservableSet::new();
        let mut sse = WorkerKind::Loop.build::<SmallRng>(&params).unwrap();
        (0..10).for_each(|_| sse.sweep(&mut rng, &mut obs).unwrap());
        let bytes = sse.checkpoint().unwrap();

        let mut pi0 = WorkerKind::LoopPi0.build::<SmallRng>(&params).unwrap();
        let err = pi0.restore(&bytes).unwrap_err();
        assert!(matches!(err, SimulationError::Checkpoint(_)));
        assert_eq!(pi0.steps().done(), 0);
    }
}
