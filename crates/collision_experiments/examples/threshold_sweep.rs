//! Example: sweep the cluster-match threshold over one receiver population.
//!
//! Builds the population once, then replays the same seeded disclosures for
//! each `matchesNeeded` value so the rows are directly comparable.
//!
//! ```bash
//! cargo run --release -p collision_experiments --example threshold_sweep
//! ```

use collision_core::SimulationConfig;
use collision_experiments::{MonteCarloRunner, NoProgress, RunOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base = SimulationConfig::default()
        .with_receivers(2_000)
        .with_disclosures(64)
        .with_epoch_length(144)
        .with_reception_profile(vec![0.7, 0.9, 0.97, 1.0]);

    let runner = MonteCarloRunner::new(RunOptions::default().with_seed(42))?;
    println!("Building receiver population...");
    let population = runner.build_population(&base, &NoProgress)?;
    println!("Built {} receivers", population.len());

    println!("| matchesNeeded | collisions | matches | matches/disclosure |");
    println!("|---------------|------------|---------|--------------------|");
    for matches_needed in 1..=4 {
        let config = base.clone().with_cluster_rule(matches_needed, base.cluster_slices);
        let (disclosures, totals) = runner.run_disclosures(&population, &config, &NoProgress)?;
        println!(
            "| {:13} | {:10} | {:7} | {:18.6} |",
            matches_needed,
            totals.collisions,
            totals.matches,
            totals.matches as f64 / disclosures.max(1) as f64
        );
    }

    Ok(())
}
