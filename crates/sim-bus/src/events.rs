//! Events that flow over the pub-sub channel.

use serde::{Deserialize, Serialize};
use sim_types::Action;

/// Topic every simulation run publishes to.
pub const TOPIC: &str = "/btcsimulator";

/// Messages published on [`TOPIC`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimEvent {
    /// Published once, at run start: the wire action vocabulary in use.
    EventNameTable(Vec<(u8, String)>),
    /// Published once, at run end.
    SimulationEnded,
}

impl SimEvent {
    /// The event-name table as published at the start of every run.
    pub fn name_table() -> Self {
        SimEvent::EventNameTable(
            Action::TABLE
                .iter()
                .map(|(action, name)| (*action as u8, (*name).to_string()))
                .collect(),
        )
    }
}
