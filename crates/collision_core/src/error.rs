//! Error types shared by the engine and the orchestration layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while generating streams, synthesizing receivers, or
/// running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The random source could not supply secret bytes or a seed.
    #[error("random source exhausted: {0}")]
    RandomSource(#[from] rand::Error),

    /// The reception profile cannot drive the receiver model.
    #[error("invalid reception profile: {0}")]
    InvalidProfile(String),

    /// Any other parameter outside the range the engine can run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool could not be started.
    #[error("worker pool could not be started: {0}")]
    WorkerPool(String),
}

/// Errors raised while loading a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] SimulationError),
}
