//! # Simulation Driver
//!
//! Wires [`sim_scheduler`], [`sim_miner`] and [`sim_persistence`] into the
//! two runnable scenarios (a general-topology honest network, and the
//! three-miner mixed SPV/attack race) plus a confirmation-depth sweep over
//! the latter.

mod config;
mod error;
mod report;
mod scenario;
mod sweep;
mod topology;

pub use config::{MixedConfig, RaceMode, StandardConfig};
pub use error::DriverError;
pub use report::{MinerReport, RunReport};
pub use scenario::{mixed_spv_attack, standard};
pub use sweep::{confirmation_depth_sweep, SweepPoint};
