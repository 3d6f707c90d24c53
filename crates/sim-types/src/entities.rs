//! # Core Domain Entities
//!
//! `Block` and its fingerprint identity. A block is produced once by a
//! miner's mining loop and never mutated afterwards; everything a miner
//! layers on top of it (validated_yet, chain membership, ...) lives in the
//! miner's own chain view, never on the block itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A block's content-addressed identity.
///
/// Computed from the canonical byte encoding of a block's fields (see
/// [`Block::fingerprint`]); two blocks with identical fields always collide,
/// which is the intended definition of "the same block" in this simulator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_prefix(&self.0))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_prefix(&self.0))
    }
}

fn hex_prefix(bytes: &[u8; 32]) -> String {
    bytes[..6].iter().map(|b| format!("{b:02x}")).collect()
}

/// A block's parent reference: either the genesis sentinel or a concrete
/// fingerprint. Modelled as an enum rather than a magic value so the
/// "unknown parent" and "no parent" cases can never be confused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentRef {
    /// This block is the genesis block; it has no parent.
    Genesis,
    /// The fingerprint of the parent block.
    Block(Fingerprint),
}

/// Immutable block record.
///
/// `size` and `valid` are semantic fields only: there is no real hashing or
/// signature verification backing them, per this simulator's non-goals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    /// Parent reference (genesis sentinel or a fingerprint).
    pub prev: ParentRef,
    /// Height along the chain from genesis (genesis = 0).
    pub height: u64,
    /// Virtual simulation time at which the block was created, in seconds.
    pub time: f64,
    /// Id of the miner that produced this block.
    pub miner_id: u64,
    /// Human-readable name of the producing miner ("hon", "spv", "att", ...).
    pub miner_name: String,
    /// Block payload size in bytes; drives validation delay downstream.
    pub size: u32,
    /// Whether the producing miner's policy marked this block valid.
    pub valid: bool,
}

impl Block {
    /// Build the genesis block for a run. Always valid, height 0, size 0.
    pub fn genesis(miner_id: u64) -> Self {
        Self {
            prev: ParentRef::Genesis,
            height: 0,
            time: 0.0,
            miner_id,
            miner_name: "seed".to_string(),
            size: 0,
            valid: true,
        }
    }

    /// Canonical byte-stable encoding used for fingerprinting: the field
    /// order is fixed (height, time, miner_id, size, valid, prev) so the
    /// same logical block always hashes to the same fingerprint regardless
    /// of in-memory representation.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&self.height.to_be_bytes());
        buf.extend_from_slice(&self.time.to_bits().to_be_bytes());
        buf.extend_from_slice(&self.miner_id.to_be_bytes());
        buf.extend_from_slice(&self.size.to_be_bytes());
        buf.push(self.valid as u8);
        match self.prev {
            ParentRef::Genesis => buf.push(0),
            ParentRef::Block(fp) => {
                buf.push(1);
                buf.extend_from_slice(&fp.0);
            }
        }
        buf
    }

    /// Compute this block's fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Fingerprint(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_fingerprint_is_stable() {
        let a = Block::genesis(0);
        let b = Block::genesis(0);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn differing_fields_change_fingerprint() {
        let a = Block::genesis(0);
        let mut b = a.clone();
        b.height = 1;
        b.prev = ParentRef::Block(a.fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn validated_yet_style_metadata_is_not_part_of_block() {
        // Block carries no mutable annotation field; SPV miners track
        // "validated_yet" in their own chain view instead.
        let b = Block::genesis(0);
        assert!(b.valid);
    }
}
