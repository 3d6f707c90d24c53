//! What a run hands back once it stops.

use sim_scheduler::Time;
use sim_types::Fingerprint;

#[derive(Debug, Clone)]
pub struct MinerReport {
    pub id: u64,
    pub name: String,
    pub chain_head: Option<Fingerprint>,
    pub chain_height: Option<u64>,
    pub block_count: usize,
    /// `Some((wins, loses))` for the attacker, `None` otherwise.
    pub race_tally: Option<(u64, u64)>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub stopped_at: Time,
    pub miners: Vec<MinerReport>,
}

impl RunReport {
    /// The attacker's tally, if one was present in this run.
    pub fn attacker_tally(&self) -> Option<(u64, u64)> {
        self.miners.iter().find_map(|m| m.race_tally)
    }
}
