//! Command line front end: build a named simulation, run it and print its observables.
//!
//! ```bash
//! cluster-mc --model ising -l 16 -t 2.27
//! cluster-mc --model potts -q 4 --config potts.toml
//! cluster-mc --model loop -m 4096 --checkpoint loop.json
//! cluster-mc --model loop-pi0 -l 16 -t 0.1
//! RUST_LOG=debug cluster-mc --model infinite -n 256 --restore infinite.json
//! ```

use clap::Parser;
use cluster_mc::config::{ParameterOverrides, Parameters};
use cluster_mc::worker::{run_simulation, WorkerKind};
use cluster_mc::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cluster-mc")]
#[command(about = "Cluster algorithm Monte Carlo for spin models and percolation")]
#[command(version)]
struct Args {
    /// Model to simulate: ising, potts, infinite, bond-percolation, site-percolation, loop
    /// or loop-pi0
    #[arg(long)]
    model: Option<WorkerKind>,

    /// Seed of the random stream
    #[arg(short, long)]
    seed: Option<u64>,

    /// Linear size of the lattice
    #[arg(short, long)]
    length: Option<usize>,

    /// Number of sites of the infinite range model
    #[arg(short, long)]
    num_sites: Option<usize>,

    /// Temperature
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Occupation probability for percolation
    #[arg(short, long)]
    probability: Option<f64>,

    /// Number of Potts states
    #[arg(short)]
    q: Option<u32>,

    /// Measured sweeps, thermalization defaults to an eighth of them
    #[arg(short = 'm', long)]
    sweeps: Option<u64>,

    /// Thermalization sweeps
    #[arg(long)]
    therm: Option<u64>,

    /// TOML parameter file, command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the final chain state here
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Continue from a chain state written by --checkpoint
    #[arg(long)]
    restore: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            model: self.model,
            seed: self.seed,
            length: self.length,
            num_sites: self.num_sites,
            temperature: self.temperature,
            probability: self.probability,
            q: self.q,
            sweeps: self.sweeps,
            therm: self.therm,
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut overrides = args.overrides();
    if let Some(path) = &args.config {
        let file = ParameterOverrides::from_toml_str(&std::fs::read_to_string(path)?)?;
        overrides = overrides.or(file);
    }
    let params = Parameters::from_overrides(&overrides);
    params.validate()?;

    let restore = args.restore.as_ref().map(std::fs::read).transpose()?;
    let report = run_simulation(&params, restore.as_deref())?;

    println!("{}", report.title);
    println!("{}", params);
    println!("{}", report.observables);
    for (name, value) in &report.derived {
        println!("{} = {}", name, value);
    }
    info!(
        elapsed = report.elapsed.as_secs_f64(),
        speed = report.speed(),
        "MCS/sec"
    );

    if let Some(path) = &args.checkpoint {
        std::fs::write(path, &report.checkpoint)?;
        info!(path = %path.display(), "checkpoint written");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
