//! Simulation parameters loaded from a JSON configuration file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codes::SLICES_PER_FRAME;
use crate::detector::ClusterRule;
use crate::error::{ConfigError, SimulationError};
use crate::receiver::{profile_is_well_formed, ReceptionModel};

/// Parameters for one simulation run.
///
/// Counts are per epoch; scale the resulting collision totals by the number
/// of epochs of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Disclosures (trials) to simulate.
    pub number_of_disclosures: usize,
    /// Target receiver population; rounded up to a multiple of the worker pool.
    pub number_of_receivers: usize,
    /// Cumulative probabilities of 0, 1, 2, ... transmitters being in range.
    pub reception_profile: Vec<f64>,
    /// Longest reception burst, drawn uniformly from `1..=value`.
    pub reception_max_burst_period: usize,
    /// Frames per epoch.
    pub epoch_length: usize,
    /// Collisions needed in a cluster window for a match.
    pub matches_needed: usize,
    /// Cluster window width in slices.
    pub cluster_slices: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            number_of_disclosures: 100,
            number_of_receivers: 1_000,
            reception_profile: vec![0.9, 0.97, 1.0],
            reception_max_burst_period: 64,
            epoch_length: 144,
            matches_needed: 2,
            cluster_slices: 16,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        self.reception_model().validate()?;
        if !profile_is_well_formed(&self.reception_profile) {
            warn!(
                profile = ?self.reception_profile,
                "reception profile is not ascending to 1.0; draws above the last threshold keep the previous transmitter count"
            );
        }
        Ok(())
    }

    pub fn slices_per_epoch(&self) -> usize {
        self.epoch_length * SLICES_PER_FRAME
    }

    pub fn max_transmitters(&self) -> usize {
        self.reception_profile.len().saturating_sub(1)
    }

    pub fn cluster_rule(&self) -> ClusterRule {
        ClusterRule::new(self.matches_needed, self.cluster_slices)
    }

    pub fn reception_model(&self) -> ReceptionModel<'_> {
        ReceptionModel::new(
            self.epoch_length,
            &self.reception_profile,
            self.reception_max_burst_period,
        )
    }

    pub fn with_disclosures(mut self, number_of_disclosures: usize) -> Self {
        self.number_of_disclosures = number_of_disclosures;
        self
    }

    pub fn with_receivers(mut self, number_of_receivers: usize) -> Self {
        self.number_of_receivers = number_of_receivers;
        self
    }

    pub fn with_reception_profile(mut self, reception_profile: Vec<f64>) -> Self {
        self.reception_profile = reception_profile;
        self
    }

    pub fn with_max_burst_period(mut self, reception_max_burst_period: usize) -> Self {
        self.reception_max_burst_period = reception_max_burst_period;
        self
    }

    pub fn with_epoch_length(mut self, epoch_length: usize) -> Self {
        self.epoch_length = epoch_length;
        self
    }

    pub fn with_cluster_rule(mut self, matches_needed: usize, cluster_slices: usize) -> Self {
        self.matches_needed = matches_needed;
        self.cluster_slices = cluster_slices;
        self
    }
}
