//! Regression coverage for the two canonical scenarios and the sweep
//! helper, run end to end against `sim-driver`'s public API the way
//! `sim-cli` does, rather than poking at miner internals directly.

#[cfg(test)]
mod tests {
    use sim_bus::InMemorySimBus;
    use sim_driver::{
        confirmation_depth_sweep, mixed_spv_attack, standard, MixedConfig, RaceMode, StandardConfig,
    };
    use sim_persistence::BackendKind;

    fn bus() -> InMemorySimBus {
        InMemorySimBus::new()
    }

    fn count_wins(config: MixedConfig, trials: u32, base_seed: u64, bus: &InMemorySimBus) -> u32 {
        let mut wins = 0;
        for trial in 0..trials {
            let seed = base_seed.wrapping_add(u64::from(trial));
            let report = mixed_spv_attack(config, Some(seed), BackendKind::Null, bus).unwrap();
            if let Some((w, l)) = report.attacker_tally() {
                if w > l {
                    wins += 1;
                }
            }
        }
        wins
    }

    /// With zero attacker hash share there is no race to win, and the
    /// honest chain should have advanced well past a handful of blocks in a
    /// full day of mining.
    #[test]
    fn zero_attacker_share_never_wins_a_race() {
        let bus = bus();
        let config = MixedConfig {
            alpha: 0.0,
            beta: 1.0,
            days: 1.0,
            k: 3,
            val_frac: 0.0,
            race_mode: RaceMode::Accumulating,
            rebase_when_unforked: true,
            full_reset: false,
        };
        let report = mixed_spv_attack(config, Some(1), BackendKind::Null, &bus).unwrap();
        let (wins, _loses) = report.attacker_tally().expect("attacker miner always reports a tally");
        assert_eq!(wins, 0, "an attacker with zero hash share can never win a race");

        let honest = report.miners.iter().find(|m| m.name == "hon").unwrap();
        assert!(
            honest.chain_height.unwrap_or(0) >= 50,
            "a day at the nominal block rate should clear far more than 50 blocks, got {:?}",
            honest.chain_height
        );
    }

    /// A small attacker share against a 6-block confirmation target should
    /// win only rarely.
    #[test]
    fn small_attacker_share_rarely_wins_a_deep_confirmation_race() {
        let bus = bus();
        let base = MixedConfig {
            alpha: 0.1,
            beta: 0.9,
            days: 1.0,
            k: 6,
            val_frac: 0.0,
            race_mode: RaceMode::SingleRace,
            rebase_when_unforked: true,
            full_reset: false,
        };
        let points = confirmation_depth_sweep(base, &[6], 300, 7, BackendKind::Null, &bus).unwrap();
        assert!(
            points[0].win_fraction <= 0.2,
            "expected a low win fraction for alpha=0.1 at k=6, got {}",
            points[0].win_fraction
        );
    }

    /// A blind SPV miner (val_frac = 0) confirms on header alone, which
    /// should make the attacker's race no harder to win than the same race
    /// fought against a purely honest network of equivalent combined share.
    #[test]
    fn blind_spv_confirmation_does_not_hurt_the_attacker() {
        let bus = bus();
        let with_spv = MixedConfig {
            alpha: 0.3,
            beta: 0.6,
            days: 10.0,
            k: 3,
            val_frac: 0.0,
            race_mode: RaceMode::SingleRace,
            rebase_when_unforked: true,
            full_reset: false,
        };
        let baseline = MixedConfig { beta: 0.7, ..with_spv };

        let trials = 300;
        let spv_wins = count_wins(with_spv, trials, 11, &bus);
        let baseline_wins = count_wins(baseline, trials, 101, &bus);

        assert!(
            spv_wins >= baseline_wins,
            "blind SPV's header-first confirmation should give the attacker at least as good a win rate as the honest baseline: spv={spv_wins} baseline={baseline_wins}"
        );
    }

    /// An SPV miner that fully validates before confirming (val_frac = 1)
    /// degenerates to an honest participant, so the attacker's win rate
    /// should track the no-SPV baseline closely.
    #[test]
    fn fully_validating_spv_degenerates_to_honest_baseline() {
        let bus = bus();
        let with_spv = MixedConfig {
            alpha: 0.3,
            beta: 0.6,
            days: 10.0,
            k: 3,
            val_frac: 1.0,
            race_mode: RaceMode::SingleRace,
            rebase_when_unforked: true,
            full_reset: false,
        };
        let baseline = MixedConfig { beta: 0.7, val_frac: 0.0, ..with_spv };

        let trials = 300;
        let spv_wins = count_wins(with_spv, trials, 13, &bus);
        let baseline_wins = count_wins(baseline, trials, 103, &bus);

        let spv_rate = f64::from(spv_wins) / f64::from(trials);
        let baseline_rate = f64::from(baseline_wins) / f64::from(trials);
        assert!(
            (spv_rate - baseline_rate).abs() <= 0.12,
            "fully-validating SPV should track the honest baseline: spv={spv_rate} baseline={baseline_rate}"
        );
    }

    /// A dominant attacker share should win nearly every race.
    #[test]
    fn dominant_attacker_share_wins_almost_every_race() {
        let bus = bus();
        let base = MixedConfig {
            alpha: 0.6,
            beta: 0.3,
            days: 1.0,
            k: 10,
            val_frac: 0.0,
            race_mode: RaceMode::SingleRace,
            rebase_when_unforked: true,
            full_reset: false,
        };
        let points = confirmation_depth_sweep(base, &[10], 100, 17, BackendKind::Null, &bus).unwrap();
        assert!(
            points[0].win_fraction >= 0.8,
            "expected alpha=0.6 to win the overwhelming majority of races, got {}",
            points[0].win_fraction
        );
    }

    /// The standard all-honest run is fully determined by its seed, down to
    /// the chain-head fingerprint of every miner.
    #[test]
    fn standard_run_is_deterministic_for_a_fixed_seed() {
        let config = StandardConfig { n: 3, days: 1.0, edge_probability: 0.5 };

        let bus_a = bus();
        let first = standard(config, Some(42), BackendKind::Null, &bus_a).unwrap();
        let bus_b = bus();
        let second = standard(config, Some(42), BackendKind::Null, &bus_b).unwrap();

        assert_eq!(first.stopped_at, second.stopped_at);
        assert_eq!(first.miners.len(), second.miners.len());
        for (a, b) in first.miners.iter().zip(second.miners.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.chain_head, b.chain_head, "chain-head fingerprint must be reproducible");
            assert_eq!(a.block_count, b.block_count);
            assert_eq!(a.race_tally, b.race_tally);
        }
    }
}
