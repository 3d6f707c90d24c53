//! CLI argument and subcommand definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use sim_persistence::BackendKind;

#[derive(Parser, Debug)]
#[command(name = "btcsimulator", about = "Discrete-event proof-of-work mining simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the general-topology honest network scenario.
    Standard(StandardArgs),
    /// Run the three-miner mixed SPV/attacker race.
    MixedSpvAttack(MixedArgs),
    /// Sweep target confirmation depth and report the attacker's win fraction.
    Sweep(SweepArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Backend {
    Null,
    InMemory,
}

impl From<Backend> for BackendKind {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Null => BackendKind::Null,
            Backend::InMemory => BackendKind::InMemory,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RaceModeArg {
    Single,
    Accumulating,
}

#[derive(Args, Debug)]
pub struct StandardArgs {
    /// Number of miners.
    #[arg(long, default_value_t = 10)]
    pub miners: usize,

    /// Simulated run length, in days.
    #[arg(long, default_value_t = 1.0)]
    pub days: f64,

    /// Probability any two miners are directly linked.
    #[arg(long, default_value_t = 0.5)]
    pub edge_probability: f64,

    /// RNG seed. Omit for OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value = "null")]
    pub backend: Backend,
}

#[derive(Args, Debug)]
pub struct MixedArgs {
    /// Attacker's hash share.
    #[arg(long)]
    pub alpha: f64,

    /// Honest network's hash share.
    #[arg(long)]
    pub beta: f64,

    /// Simulated run length, in days (ignored in single-race mode).
    #[arg(long, default_value_t = 1.0)]
    pub days: f64,

    /// Target confirmation depth.
    #[arg(long)]
    pub k: u64,

    /// Fraction of full validation time the SPV miner spends (0 = blind).
    #[arg(long, default_value_t = 0.0)]
    pub val_frac: f64,

    #[arg(long, value_enum, default_value = "single")]
    pub race_mode: RaceModeArg,

    /// Re-base onto an observed valid head while not yet forked.
    #[arg(long, default_value_t = true)]
    pub rebase_when_unforked: bool,

    /// Reset every miner to genesis after each race resolves (accumulating mode only).
    #[arg(long, default_value_t = false)]
    pub full_reset: bool,

    /// RNG seed. Omit for OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value = "null")]
    pub backend: Backend,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Attacker's hash share.
    #[arg(long)]
    pub alpha: f64,

    /// Honest network's hash share.
    #[arg(long)]
    pub beta: f64,

    /// Fraction of full validation time the SPV miner spends (0 = blind).
    #[arg(long, default_value_t = 0.0)]
    pub val_frac: f64,

    /// Re-base onto an observed valid head while not yet forked.
    #[arg(long, default_value_t = true)]
    pub rebase_when_unforked: bool,

    /// Comma-separated confirmation depths to sweep, e.g. "1,2,3,6".
    #[arg(long, value_delimiter = ',')]
    pub k_values: Vec<u64>,

    /// Independent single-race trials per confirmation depth.
    #[arg(long, default_value_t = 100)]
    pub trials: u32,

    /// Base RNG seed; each trial derives its own seed from this.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(long, value_enum, default_value = "null")]
    pub backend: Backend,
}
