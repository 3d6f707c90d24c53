//! # Envelope & Action Vocabulary
//!
//! The message shapes exchanged over the network layer (`sim-network`)
//! between miner endpoints. Every envelope is addressed to exactly one
//! destination and carries either a fingerprint (requests, head
//! announcements) or a full block (responses).

use crate::entities::{Block, Fingerprint};
use serde::{Deserialize, Serialize};

/// The action tag for a network message, mirroring the event-name table
/// published at run start (see the driver's pub-sub channel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// "Hey! I need a block!" — payload is the wanted fingerprint.
    BlockRequest = 1,
    /// "Here is the block you wanted!" — payload is the block itself.
    BlockResponse = 2,
    /// "I have a new chain head!" — payload is the new head's fingerprint.
    HeadNew = 3,
    /// "Just mined a new block!" — reserved for external observers; the
    /// core miner loop notifies locally via signals rather than envelopes.
    BlockNew = 4,
    /// Attacker reached `invalid_len == k`.
    AttackWin = 5,
    /// Attacker reached `honest_len == k`.
    AttackLose = 6,
}

impl Action {
    /// The full event-name table, in the constant order the driver
    /// publishes at run start.
    pub const TABLE: [(Action, &'static str); 6] = [
        (Action::BlockRequest, "BLOCK_REQUEST"),
        (Action::BlockResponse, "BLOCK_RESPONSE"),
        (Action::HeadNew, "HEAD_NEW"),
        (Action::BlockNew, "BLOCK_NEW"),
        (Action::AttackWin, "ATTACK_WIN"),
        (Action::AttackLose, "ATTACK_LOSE"),
    ];
}

/// The payload carried by an envelope: either a fingerprint (requests and
/// head announcements) or a full block (responses).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Payload {
    /// A fingerprint, used by `BLOCK_REQUEST` and `HEAD_NEW`.
    Fingerprint(Fingerprint),
    /// A full block, used by `BLOCK_RESPONSE`.
    Block(Block),
}

impl Payload {
    /// The fingerprint this payload refers to, whether carried directly or
    /// derived from a full block.
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Payload::Fingerprint(fp) => *fp,
            Payload::Block(block) => block.fingerprint(),
        }
    }
}

/// A directed, addressed message in flight between two miner endpoints.
/// Consumed only by the endpoint whose id equals `destination`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// Id of the sending miner.
    pub origin: u64,
    /// Id of the intended recipient miner.
    pub destination: u64,
    /// The action this envelope carries out.
    pub action: Action,
    /// The payload (fingerprint or block) for this action.
    pub payload: Payload,
}

impl Envelope {
    /// Construct a new envelope.
    pub fn new(origin: u64, destination: u64, action: Action, payload: Payload) -> Self {
        Self { origin, destination, action, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Block;

    #[test]
    fn payload_fingerprint_derives_from_block() {
        let block = Block::genesis(0);
        let payload = Payload::Block(block.clone());
        assert_eq!(payload.fingerprint(), block.fingerprint());
    }

    #[test]
    fn action_discriminants_match_event_name_table() {
        assert_eq!(Action::BlockRequest as u8, 1);
        assert_eq!(Action::BlockResponse as u8, 2);
        assert_eq!(Action::HeadNew as u8, 3);
        assert_eq!(Action::BlockNew as u8, 4);
        assert_eq!(Action::AttackWin as u8, 5);
        assert_eq!(Action::AttackLose as u8, 6);
    }
}
