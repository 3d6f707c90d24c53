//! Parameter sweep over target confirmation depth: repeated independent
//! single-race trials at each `k`, reporting the attacker's observed win
//! fraction.

use sim_bus::EventPublisher;
use sim_persistence::BackendKind;

use crate::config::{MixedConfig, RaceMode};
use crate::error::DriverError;
use crate::scenario::mixed_spv_attack;

/// One row of the sweep: `k` and the attacker's win fraction over `trials`
/// independent single races.
#[derive(Debug, Clone, Copy)]
pub struct SweepPoint {
    pub k: u64,
    pub trials: u32,
    pub wins: u32,
    pub win_fraction: f64,
}

/// Run `trials` independent single-race trials at each confirmation depth in
/// `k_values`, seeding each trial deterministically from `base_seed` and its
/// index so the sweep itself is reproducible.
pub fn confirmation_depth_sweep(
    base: MixedConfig,
    k_values: &[u64],
    trials: u32,
    base_seed: u64,
    backend_kind: BackendKind,
    bus: &dyn EventPublisher,
) -> Result<Vec<SweepPoint>, DriverError> {
    let mut points = Vec::with_capacity(k_values.len());
    for &k in k_values {
        let config = MixedConfig { k, race_mode: RaceMode::SingleRace, ..base };
        let mut wins = 0u32;
        for trial in 0..trials {
            let seed = base_seed.wrapping_add(u64::from(k) * 1_000_003 + u64::from(trial));
            let report = mixed_spv_attack(config, Some(seed), backend_kind, bus)?;
            if let Some((w, l)) = report.attacker_tally() {
                if w > l {
                    wins += 1;
                }
            }
        }
        points.push(SweepPoint {
            k,
            trials,
            wins,
            win_fraction: f64::from(wins) / f64::from(trials),
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_bus::InMemorySimBus;

    #[test]
    fn sweep_reports_one_point_per_k_value() {
        let base = MixedConfig {
            alpha: 0.4,
            beta: 0.6,
            days: 1.0,
            k: 1,
            val_frac: 1.0,
            race_mode: RaceMode::SingleRace,
            rebase_when_unforked: true,
            full_reset: false,
        };
        let bus = InMemorySimBus::new();
        let points = confirmation_depth_sweep(base, &[1, 2], 3, 7, BackendKind::Null, &bus).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].k, 1);
        assert_eq!(points[1].k, 2);
        assert_eq!(points[0].trials, 3);
    }
}
