//! Aggregate results of a simulation run.

use std::fmt;

use collision_core::CollisionCount;

/// Totals for one epoch across the realized receiver population and
/// disclosure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    /// Receivers actually built (rounded up to a multiple of the pool size).
    pub receivers: usize,
    /// Disclosures actually simulated (rounded the same way).
    pub disclosures: usize,
    pub collisions: u64,
    pub matches: u64,
}

impl SimulationReport {
    pub fn new(receivers: usize, disclosures: usize, totals: CollisionCount) -> Self {
        Self {
            receivers,
            disclosures,
            collisions: totals.collisions,
            matches: totals.matches,
        }
    }

    /// Expected collisions per disclosure per epoch.
    pub fn collisions_per_disclosure(&self) -> f64 {
        Self::per(self.collisions, self.disclosures)
    }

    /// Expected matches per disclosure per epoch.
    pub fn matches_per_disclosure(&self) -> f64 {
        Self::per(self.matches, self.disclosures)
    }

    fn per(count: u64, denominator: usize) -> f64 {
        if denominator == 0 {
            return 0.0;
        }
        count as f64 / denominator as f64
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Receivers = {}", self.receivers)?;
        writeln!(f, "Disclosures = {}", self.disclosures)?;
        writeln!(f, "Total collisions = {}", self.collisions)?;
        writeln!(f, "Total matches = {}", self.matches)?;
        writeln!(
            f,
            "Collisions per disclosure = {:.6}",
            self.collisions_per_disclosure()
        )?;
        write!(f, "Matches per disclosure = {:.6}", self.matches_per_disclosure())
    }
}
