//! Collision simulation CLI
//!
//! Estimates the collisions and cluster matches one epoch of disclosures
//! produces against a simulated receiver population.
//!
//! ## Usage
//! ```bash
//! cargo run --release --bin collision_sim -- config.json
//! cargo run --release --bin collision_sim -- config.json --workers 16 --seed 42
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use collision_core::SimulationConfig;
use collision_experiments::{run_simulation, ConsoleProgress, RunOptions, DEFAULT_WORKER_POOL_SIZE};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_FIELDS: &str = "\
The configuration file is a JSON object containing:
  numberOfDisclosures: number of simulated epoch disclosures
  numberOfReceivers: number of simulated receivers
  receptionProfile: list of floats for proximate transmitter probabilities (first entry for none)
  receptionMaxBurstPeriod: maximum contiguous slices of one reception state (chosen randomly up to this value)
  epochLength: length of an epoch in frames
  matchesNeeded: number of collisions needed in a cluster for a match
  clusterSlices: number of slices in a cluster in which sufficient collisions are required";

/// Collision simulation
///
/// Counts are per epoch; multiply by the number of epochs of interest.
#[derive(Parser, Debug)]
#[command(name = "collision_sim")]
#[command(version, about, long_about = None, after_help = CONFIG_FIELDS)]
struct Args {
    /// Path to the JSON configuration file
    config: PathBuf,

    /// Number of workers in the simulation pool
    #[arg(
        short = 'w',
        long,
        env = "COLLISION_SIM_WORKERS",
        default_value_t = DEFAULT_WORKER_POOL_SIZE
    )]
    workers: usize,

    /// Random seed for a reproducible run. When omitted, workers seed from the OS.
    #[arg(long)]
    seed: Option<u64>,

    /// Only announce the phases; no progress bar or per-worker lines
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("warn,collision_core=info,collision_experiments=info")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match SimulationConfig::from_path(&args.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            eprintln!();
            eprintln!("{CONFIG_FIELDS}");
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions {
        workers: args.workers,
        seed: args.seed,
    };
    info!(
        config = %args.config.display(),
        workers = options.workers,
        seed = ?options.seed,
        "loaded configuration"
    );

    let console = if args.quiet {
        ConsoleProgress::phases_only()
    } else {
        ConsoleProgress::new()
    };

    let result = run_simulation(&config, options, &console);
    console.finish();

    match result {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Error simulating disclosures: {error}");
            ExitCode::FAILURE
        }
    }
}
