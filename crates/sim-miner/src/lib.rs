//! # Miner Actors
//!
//! Honest, SPV, and attacker mining behaviour, expressed as three
//! cooperating [`sim_scheduler::Activity`] implementations per miner
//! sharing one [`core::MinerCore`]: a mining loop that produces blocks,
//! a main loop that validates them, and a service loop that answers the
//! network. SPV additionally runs a small background activity
//! reconciling a gossiped head it hasn't synced yet.

mod constants;
mod core;
mod error;
mod main_loop;
mod miner;
mod mining;
mod service;
mod spv;

pub use constants::{BLOCK_RATE, LINK_DELAY, MAX_BLOCK_SIZE, VERIFY_RATE};
pub use core::{AttackerState, MinerCore, Policy, SharedBackend, SharedRng, SpvState, VerifyResult};
pub use error::MinerError;
pub use miner::Miner;
