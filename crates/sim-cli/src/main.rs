//! # Simulator CLI
//!
//! Entry point wiring telemetry, the pub-sub bus and [`sim_driver`]'s
//! scenario constructors behind three subcommands: `standard`,
//! `mixed-spv-attack` and `sweep`.

mod args;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use args::{Cli, Command, MixedArgs, StandardArgs, SweepArgs};
use sim_bus::InMemorySimBus;
use sim_driver::{DriverError, MixedConfig, RaceMode, StandardConfig};
use sim_telemetry::{init_telemetry, TelemetryConfig};

/// Persistence-unreachable is the one failure mode the driver treats as
/// distinct from ordinary argument/validation errors.
const PERSISTENCE_UNREACHABLE: u8 = 255; // -1 as a process exit byte

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry = match init_telemetry(TelemetryConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize telemetry: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            match e.downcast_ref::<DriverError>() {
                Some(DriverError::Persistence(_)) => ExitCode::from(PERSISTENCE_UNREACHABLE),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let bus = InMemorySimBus::new();

    match cli.command {
        Command::Standard(args) => run_standard(args, &bus),
        Command::MixedSpvAttack(args) => run_mixed(args, &bus),
        Command::Sweep(args) => run_sweep(args, &bus),
    }
}

fn run_standard(args: StandardArgs, bus: &InMemorySimBus) -> Result<()> {
    let config = StandardConfig {
        n: args.miners,
        days: args.days,
        edge_probability: args.edge_probability,
    };
    let report = sim_driver::standard(config, args.seed, args.backend.into(), bus)?;
    info!(stopped_at = report.stopped_at, miners = report.miners.len(), "standard run complete");
    for miner in &report.miners {
        println!(
            "{}\theight={}\tblocks={}",
            miner.name,
            miner.chain_height.unwrap_or(0),
            miner.block_count
        );
    }
    Ok(())
}

fn run_mixed(args: MixedArgs, bus: &InMemorySimBus) -> Result<()> {
    let race_mode = match args.race_mode {
        args::RaceModeArg::Single => RaceMode::SingleRace,
        args::RaceModeArg::Accumulating => RaceMode::Accumulating,
    };
    let config = MixedConfig {
        alpha: args.alpha,
        beta: args.beta,
        days: args.days,
        k: args.k,
        val_frac: args.val_frac,
        race_mode,
        rebase_when_unforked: args.rebase_when_unforked,
        full_reset: args.full_reset,
    };
    let report = sim_driver::mixed_spv_attack(config, args.seed, args.backend.into(), bus)?;
    info!(stopped_at = report.stopped_at, "mixed race complete");
    if let Some((wins, loses)) = report.attacker_tally() {
        println!("wins={wins}\tloses={loses}");
    }
    for miner in &report.miners {
        println!(
            "{}\theight={}\tblocks={}",
            miner.name,
            miner.chain_height.unwrap_or(0),
            miner.block_count
        );
    }
    Ok(())
}

fn run_sweep(args: SweepArgs, bus: &InMemorySimBus) -> Result<()> {
    let base = MixedConfig {
        alpha: args.alpha,
        beta: args.beta,
        days: 1.0,
        k: 1,
        val_frac: args.val_frac,
        race_mode: RaceMode::SingleRace,
        rebase_when_unforked: args.rebase_when_unforked,
        full_reset: false,
    };
    let points = sim_driver::confirmation_depth_sweep(
        base,
        &args.k_values,
        args.trials,
        args.seed,
        args.backend.into(),
        bus,
    )?;
    for point in points {
        println!("{},{:.4}", point.k, point.win_fraction);
    }
    Ok(())
}
