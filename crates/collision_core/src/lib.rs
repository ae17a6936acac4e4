//! Engine for estimating how often a disclosed code stream collides with
//! codes overheard by simulated receivers during one epoch.
//!
//! - [`codes`]: ratcheted slice-code streams
//! - [`receiver`]: burst/profile reception traces
//! - [`detector`]: collision counting and cluster matching
//! - [`config`]: run parameters loaded from JSON
//!
//! Parallel orchestration lives in the `collision_experiments` crate.

pub mod codes;
pub mod config;
pub mod detector;
pub mod error;
pub mod receiver;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use codes::{generate, EpochSecrets, SliceCodeStream, SLICES_PER_FRAME};
pub use config::SimulationConfig;
pub use detector::{count_collisions, is_cluster_match, ClusterRule, CollisionCount};
pub use error::{ConfigError, SimulationError};
pub use receiver::{ReceivedDuringSlice, ReceptionModel, ReceptionTrace};
