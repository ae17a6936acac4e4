//! Parallel Monte Carlo orchestration for the collision engine.
//!
//! Builds a population of simulated receivers, then replays many fresh
//! disclosures against it on a fixed-size worker pool and aggregates the
//! collision and match totals for one epoch.
//!
//! # Quick Start
//!
//! ```no_run
//! use collision_core::SimulationConfig;
//! use collision_experiments::{run_simulation, NoProgress, RunOptions};
//!
//! let config = SimulationConfig::default()
//!     .with_receivers(10_000)
//!     .with_disclosures(1_000);
//!
//! let report = run_simulation(&config, RunOptions::default().with_seed(42), &NoProgress).unwrap();
//! println!("Total collisions = {}", report.collisions);
//! ```
//!
//! # Architecture
//!
//! - [`partition`]: static worker shares, `ceil(total / workers)` each
//! - [`runner`]: the two rayon phases (population build, disclosure trials)
//! - [`progress`]: observer hooks and the console progress bar
//! - [`metrics`]: the final report

pub mod metrics;
pub mod partition;
pub mod progress;
pub mod runner;

pub use metrics::SimulationReport;
pub use partition::{plan_worker_shares, WorkerTask};
pub use progress::{ConsoleProgress, NoProgress, ProgressObserver, TrialProgress};
pub use runner::{
    run_simulation, MonteCarloRunner, Phase, RunOptions, SeededRngSource, WorkerRngSource,
    DEFAULT_WORKER_POOL_SIZE,
};
