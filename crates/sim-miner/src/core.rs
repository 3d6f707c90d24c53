//! Shared miner state and the chain-selection policies that act on it.
//!
//! The three variants (honest, SPV, attacker) are small overrides on
//! `add_block`, `mine_next` and `validate_delay` rather than separate
//! types reached through inheritance. `Policy` is a tagged union of
//! their per-variant state and capabilities.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use rand::Rng;
use rand_distr::{Distribution, Exp};
use sim_network::Socket;
use sim_persistence::PersistenceBackend;
use sim_scheduler::{Scheduler, SignalId, SignalValue, Time};
use sim_telemetry::{record_attack_outcome, record_reorg};
use sim_types::{Action, Block, Fingerprint, ParentRef, Payload};

use crate::constants::{BLOCK_RATE, MAX_BLOCK_SIZE, VERIFY_RATE};

/// Shared RNG stream. Every miner activity draws from it in a
/// scheduler-fixed order, which is what makes a run reproducible from a
/// fixed seed.
pub type SharedRng = Rc<RefCell<rand::rngs::StdRng>>;

pub type SharedBackend = Rc<RefCell<dyn PersistenceBackend>>;

/// What `verify_block` decided about a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyResult {
    /// `height == blocks[prev].height + 1`, and not a rejected self-fork.
    Accept,
    /// `prev` is not yet known locally.
    UnknownPrev,
    /// `prev` known but height mismatch, or a self-mined fork off stale state.
    Reject,
}

/// Per-variant state and behaviour.
pub enum Policy {
    Honest,
    Spv(SpvState),
    Attacker(AttackerState),
}

/// Discriminant-only view of [`Policy`], used to pick a dispatch arm
/// without holding a borrow of `policy` across a `&mut self` call.
enum PolicyKind {
    Honest,
    Spv,
    Attacker,
}

pub struct SpvState {
    /// Longest known chain that is actually valid, tracked independently
    /// of whatever head this miner is currently building on.
    pub chain_head_others: Option<Fingerprint>,
    /// Most recently gossiped head this miner hasn't fetched yet, if any.
    pub pending_head: Option<Fingerprint>,
    /// Fraction of full validation time actually spent (0 = blind, 1 = full).
    pub val_frac: f64,
}

pub struct AttackerState {
    /// Longest *valid* chain observed from peers.
    pub chain_head_others: Option<Fingerprint>,
    pub invalid_len: u64,
    pub honest_len: u64,
    pub k: u64,
    pub wins: u64,
    pub loses: u64,
    /// Re-base `chain_head` onto a new valid tip while not yet forked.
    pub rebase_when_unforked: bool,
    /// Signal the driver watches to detect race resolution.
    pub race_outcome: SignalId,
}

/// A reorg is a new head that does not directly extend the previous one:
/// the chain's tip switched branches rather than simply growing by one.
fn is_reorg(chain_head: Option<Fingerprint>, prev: ParentRef) -> bool {
    match (chain_head, prev) {
        (Some(head), ParentRef::Block(prev_fp)) => head != prev_fp,
        (Some(_), ParentRef::Genesis) => true,
        (None, _) => false,
    }
}

/// State and behaviour shared by every miner variant.
pub struct MinerCore {
    pub id: u64,
    pub name: String,
    hashrate: f64,
    socket: Socket,
    rng: SharedRng,
    backend: SharedBackend,

    blocks: HashMap<Fingerprint, Block>,
    pub blocks_new: VecDeque<Block>,
    chain_head: Option<Fingerprint>,
    /// SPV-adopted heads awaiting their deferred validity check.
    spv_deferred: VecDeque<Fingerprint>,

    pub policy: Policy,

    pub block_mined: SignalId,
    pub block_received: SignalId,
    pub continue_mining: SignalId,
}

impl MinerCore {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        name: String,
        hashrate: f64,
        socket: Socket,
        rng: SharedRng,
        backend: SharedBackend,
        policy: Policy,
        sched: &mut Scheduler,
    ) -> Self {
        Self {
            id,
            name,
            hashrate,
            socket,
            rng,
            backend,
            blocks: HashMap::new(),
            blocks_new: VecDeque::new(),
            chain_head: None,
            spv_deferred: VecDeque::new(),
            policy,
            block_mined: sched.new_signal(),
            block_received: sched.new_signal(),
            continue_mining: sched.new_signal(),
        }
    }

    /// Seed this miner's view of the chain with the shared genesis block.
    pub fn seed_genesis(&mut self, genesis: Block) {
        let fp = genesis.fingerprint();
        self.chain_head = Some(fp);
        if let Policy::Attacker(attacker) = &mut self.policy {
            attacker.chain_head_others = Some(fp);
        }
        if let Policy::Spv(spv) = &mut self.policy {
            spv.chain_head_others = Some(fp);
        }
        self.blocks.insert(fp, genesis);
    }

    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    pub fn chain_head(&self) -> Option<Fingerprint> {
        self.chain_head
    }

    pub fn chain_head_block(&self) -> Option<&Block> {
        self.chain_head.and_then(|fp| self.blocks.get(&fp))
    }

    pub fn block(&self, fp: Fingerprint) -> Option<&Block> {
        self.blocks.get(&fp)
    }

    pub fn known(&self, fp: Fingerprint) -> bool {
        self.blocks.contains_key(&fp)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Sample the next inter-arrival delay for this miner's hash share.
    pub fn sample_mining_interval(&self) -> Time {
        let lambda = self.hashrate * BLOCK_RATE;
        let exp = Exp::new(lambda).expect("hashrate > 0");
        exp.sample(&mut *self.rng.borrow_mut())
    }

    /// Build the next block this miner would mine, per its policy.
    pub fn mine_next(&self, now: Time) -> Block {
        let head = self.chain_head.expect("genesis seeded before mining starts");
        let head_block = &self.blocks[&head];
        let height = head_block.height + 1;
        match &self.policy {
            Policy::Honest => {
                let size = self.sample_block_size();
                Block {
                    prev: ParentRef::Block(head),
                    height,
                    time: now,
                    miner_id: self.id,
                    miner_name: self.name.clone(),
                    size,
                    valid: true,
                }
            }
            Policy::Spv(_) => Block {
                prev: ParentRef::Block(head),
                height,
                time: now,
                miner_id: self.id,
                miner_name: self.name.clone(),
                size: 0,
                valid: head_block.valid,
            },
            Policy::Attacker(_) => {
                let size = self.sample_block_size();
                Block {
                    prev: ParentRef::Block(head),
                    height,
                    time: now,
                    miner_id: self.id,
                    miner_name: self.name.clone(),
                    size,
                    valid: false,
                }
            }
        }
    }

    fn sample_block_size(&self) -> u32 {
        self.rng.borrow_mut().gen_range(0.0..MAX_BLOCK_SIZE) as u32
    }

    /// How long validating a queued block takes, per policy.
    pub fn validate_delay(&self, block: &Block) -> Time {
        match &self.policy {
            Policy::Spv(spv) => spv.val_frac * block.size as f64 / VERIFY_RATE,
            Policy::Honest | Policy::Attacker(_) => block.size as f64 / VERIFY_RATE,
        }
    }

    /// Classify a queued block against locally known state.
    pub fn verify_block(&self, block: &Block) -> VerifyResult {
        let prev_fp = match block.prev {
            ParentRef::Genesis => return VerifyResult::Accept,
            ParentRef::Block(fp) => fp,
        };
        let Some(prev_block) = self.blocks.get(&prev_fp) else {
            return VerifyResult::UnknownPrev;
        };
        if block.height != prev_block.height + 1 {
            return VerifyResult::Reject;
        }
        if block.miner_id == self.id && self.chain_head != Some(prev_fp) {
            return VerifyResult::Reject;
        }
        VerifyResult::Accept
    }

    /// Insert a block and let the active policy decide what happens to
    /// chain heads. Returns whether `chain_head` changed.
    pub fn add_block(&mut self, block: Block, sched: &mut Scheduler) {
        let fp = block.fingerprint();
        let height = block.height;
        let valid = block.valid;
        let miner_id = block.miner_id;
        let prev = block.prev;
        self.persist_block(fp, &block);
        self.blocks.insert(fp, block);

        let kind = match &self.policy {
            Policy::Honest => PolicyKind::Honest,
            Policy::Spv(_) => PolicyKind::Spv,
            Policy::Attacker(_) => PolicyKind::Attacker,
        };
        match kind {
            PolicyKind::Honest => {
                if valid {
                    self.adopt_if_taller(fp, height, prev, sched);
                }
            }
            PolicyKind::Spv => {
                self.add_block_spv(fp, height, prev, valid, sched);
            }
            PolicyKind::Attacker => {
                self.add_block_attacker(fp, height, prev, valid, miner_id, sched);
            }
        }
    }

    fn adopt_if_taller(&mut self, fp: Fingerprint, height: u64, prev: ParentRef, sched: &mut Scheduler) {
        let taller = match self.chain_head {
            None => true,
            Some(head) => height > self.blocks[&head].height,
        };
        if taller {
            if is_reorg(self.chain_head, prev) {
                record_reorg();
            }
            self.chain_head = Some(fp);
            self.socket
                .broadcast(sched, Action::HeadNew, Payload::Fingerprint(fp));
        }
    }

    /// SPV dispatch: adopt the taller head outright (any validity) and
    /// queue it for a deferred validity check, while separately tracking
    /// the longest chain known to actually be valid.
    fn add_block_spv(
        &mut self,
        fp: Fingerprint,
        height: u64,
        prev: ParentRef,
        valid: bool,
        sched: &mut Scheduler,
    ) {
        let Policy::Spv(spv) = &mut self.policy else {
            unreachable!("dispatched only for the SPV policy")
        };
        if spv.pending_head == Some(fp) {
            spv.pending_head = None;
        }
        if valid {
            let taller_valid = match spv.chain_head_others {
                None => true,
                Some(head) => height > self.blocks[&head].height,
            };
            if taller_valid {
                spv.chain_head_others = Some(fp);
            }
        }

        let taller = match self.chain_head {
            None => true,
            Some(head) => height > self.blocks[&head].height,
        };
        if taller {
            if is_reorg(self.chain_head, prev) {
                record_reorg();
            }
            self.chain_head = Some(fp);
            self.spv_deferred.push_back(fp);
            self.socket
                .broadcast(sched, Action::HeadNew, Payload::Fingerprint(fp));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_block_attacker(
        &mut self,
        fp: Fingerprint,
        height: u64,
        prev: ParentRef,
        valid: bool,
        _miner_id: u64,
        sched: &mut Scheduler,
    ) {
        let Policy::Attacker(attacker) = &mut self.policy else {
            unreachable!("dispatched only for the attacker policy")
        };

        if !valid {
            let taller = match self.chain_head {
                None => true,
                Some(head) => height > self.blocks[&head].height,
            };
            if taller {
                if is_reorg(self.chain_head, prev) {
                    record_reorg();
                }
                self.chain_head = Some(fp);
                attacker.invalid_len += 1;
                self.socket
                    .broadcast(sched, Action::HeadNew, Payload::Fingerprint(fp));
            }
        } else {
            let taller = match attacker.chain_head_others {
                None => true,
                Some(head) => height > self.blocks[&head].height,
            };
            if taller {
                attacker.chain_head_others = Some(fp);
                if attacker.invalid_len > 0 {
                    attacker.honest_len += 1;
                } else if attacker.rebase_when_unforked {
                    self.chain_head = Some(fp);
                }
            }
        }

        let Policy::Attacker(attacker) = &mut self.policy else {
            unreachable!()
        };
        if attacker.invalid_len >= attacker.k {
            attacker.wins += 1;
            record_attack_outcome("win");
            let signal = attacker.race_outcome;
            attacker.race_outcome = sched.new_signal();
            attacker.invalid_len = 0;
            attacker.honest_len = 0;
            sched
                .succeed(signal, SignalValue::Unit)
                .expect("race outcome signal still pending");
        } else if attacker.honest_len >= attacker.k {
            attacker.loses += 1;
            record_attack_outcome("lose");
            let signal = attacker.race_outcome;
            attacker.race_outcome = sched.new_signal();
            attacker.invalid_len = 0;
            attacker.honest_len = 0;
            sched
                .succeed(signal, SignalValue::Unit)
                .expect("race outcome signal still pending");
        }
    }

    fn persist_block(&self, fp: Fingerprint, block: &Block) {
        let fields = vec![
            ("height".to_string(), block.height.to_string()),
            ("miner_id".to_string(), block.miner_id.to_string()),
            ("valid".to_string(), block.valid.to_string()),
            ("time".to_string(), block.time.to_string()),
        ];
        let path = format!("block/{fp}");
        let _ = self.backend.borrow_mut().record(&path, fields);
        let _ = self
            .backend
            .borrow_mut()
            .record_index(&format!("chain/{}", self.id), block.height as f64, &fp.to_string());
    }

    /// A freshly mined or received block arrived; wake the main loop.
    pub fn notify_new_block(&mut self, block: Block, sched: &mut Scheduler) {
        let old = self.block_mined;
        self.block_mined = sched.new_signal();
        sched
            .succeed(old, SignalValue::Block(block))
            .expect("block_mined signal still pending");
    }

    pub fn notify_received_block(&mut self, block: Block, sched: &mut Scheduler) {
        let old = self.block_received;
        self.block_received = sched.new_signal();
        sched
            .succeed(old, SignalValue::Block(block))
            .expect("block_received signal still pending");
    }

    /// Nudge background activities (currently only SPV's dual-head
    /// reconciliation) that a validation round just completed.
    pub fn notify_continue_mining(&mut self, sched: &mut Scheduler) {
        let old = self.continue_mining;
        self.continue_mining = sched.new_signal();
        sched
            .succeed(old, SignalValue::Unit)
            .expect("continue_mining signal still pending");
    }

    /// The signal the driver watches to detect a race resolving, for the
    /// attacker policy only.
    pub fn race_outcome_signal(&self) -> Option<SignalId> {
        match &self.policy {
            Policy::Attacker(attacker) => Some(attacker.race_outcome),
            Policy::Honest | Policy::Spv(_) => None,
        }
    }

    /// `(wins, loses)` so far, for the attacker policy only.
    pub fn race_tally(&self) -> Option<(u64, u64)> {
        match &self.policy {
            Policy::Attacker(attacker) => Some((attacker.wins, attacker.loses)),
            Policy::Honest | Policy::Spv(_) => None,
        }
    }

    /// Record a head gossiped by a peer, for SPV's background
    /// reconciliation activity to act on. A no-op for other policies.
    pub fn note_announced_head(&mut self, fp: Fingerprint) {
        if let Policy::Spv(spv) = &mut self.policy {
            spv.pending_head = Some(fp);
        }
    }

    /// The most recently gossiped head SPV hasn't fetched yet, if any.
    pub fn spv_pending_head(&self) -> Option<Fingerprint> {
        match &self.policy {
            Policy::Spv(spv) => spv.pending_head,
            Policy::Honest | Policy::Attacker(_) => None,
        }
    }

    /// Pop the next SPV-adopted head awaiting its deferred validity
    /// check, oldest first.
    pub fn pop_spv_deferred(&mut self) -> Option<Fingerprint> {
        self.spv_deferred.pop_front()
    }

    /// How long SPV's background activity waits before reading a
    /// deferred block's actual validity bit.
    pub fn spv_deferred_delay(&self, fp: Fingerprint) -> Time {
        let Policy::Spv(spv) = &self.policy else {
            unreachable!("dispatched only for the SPV policy")
        };
        let size = self.blocks[&fp].size as f64;
        spv.val_frac * size / VERIFY_RATE
    }

    /// SPV's deferred validity check: if the head this miner is still
    /// sitting on turned out invalid, fall back to the longest chain
    /// known to actually be valid.
    pub fn spv_resolve_deferred(&mut self, fp: Fingerprint) {
        if self.blocks[&fp].valid || self.chain_head != Some(fp) {
            return;
        }
        let Policy::Spv(spv) = &mut self.policy else {
            unreachable!("dispatched only for the SPV policy")
        };
        if let Some(fallback) = spv.chain_head_others {
            if fallback != fp {
                self.chain_head = Some(fallback);
            }
        }
    }

    /// Re-seed chain state back to genesis (full-reset race mode).
    pub fn reset_to_genesis(&mut self, genesis: Block) {
        self.blocks.clear();
        self.blocks_new.clear();
        self.spv_deferred.clear();
        self.seed_genesis(genesis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use sim_network::{EnvelopeStore, Socket};
    use sim_persistence::NullBackend;

    fn test_core(id: u64, policy: Policy, sched: &mut Scheduler) -> MinerCore {
        let store = EnvelopeStore::new();
        let socket = Socket::new(id, store);
        let rng: SharedRng = Rc::new(RefCell::new(rand::rngs::StdRng::seed_from_u64(42)));
        let backend: SharedBackend = Rc::new(RefCell::new(NullBackend::new()));
        let mut core = MinerCore::new(id, format!("m{id}"), 1.0, socket, rng, backend, policy, sched);
        core.seed_genesis(Block::genesis(0));
        core
    }

    fn child_of(parent: &Block, miner_id: u64, valid: bool) -> Block {
        Block {
            prev: ParentRef::Block(parent.fingerprint()),
            height: parent.height + 1,
            time: parent.time + 1.0,
            miner_id,
            miner_name: "x".to_string(),
            size: 10,
            valid,
        }
    }

    #[test]
    fn verify_block_rejects_unknown_parent() {
        let mut sched = Scheduler::new();
        let core = test_core(0, Policy::Honest, &mut sched);
        let orphan = child_of(&Block::genesis(99), 1, true);
        assert_eq!(core.verify_block(&orphan), VerifyResult::UnknownPrev);
    }

    #[test]
    fn verify_block_rejects_height_mismatch() {
        let mut sched = Scheduler::new();
        let core = test_core(0, Policy::Honest, &mut sched);
        let genesis = Block::genesis(0);
        let mut bad = child_of(&genesis, 1, true);
        bad.height = 5;
        assert_eq!(core.verify_block(&bad), VerifyResult::Reject);
    }

    #[test]
    fn verify_block_rejects_self_mined_fork_off_stale_head() {
        let mut sched = Scheduler::new();
        let mut core = test_core(0, Policy::Honest, &mut sched);
        let genesis = Block::genesis(0);
        let first = child_of(&genesis, 0, true);
        core.add_block(first.clone(), &mut sched);
        assert_eq!(core.chain_head(), Some(first.fingerprint()));

        // A self-mined block extending stale (genesis) state is rejected.
        let stale_fork = child_of(&genesis, 0, true);
        assert_eq!(core.verify_block(&stale_fork), VerifyResult::Reject);
    }

    #[test]
    fn honest_ignores_invalid_blocks_for_head_selection() {
        let mut sched = Scheduler::new();
        let mut core = test_core(0, Policy::Honest, &mut sched);
        let genesis = Block::genesis(0);
        let invalid = child_of(&genesis, 1, false);
        core.add_block(invalid, &mut sched);
        assert_eq!(core.chain_head(), Some(genesis.fingerprint()));
    }

    #[test]
    fn honest_adopts_taller_valid_chain() {
        let mut sched = Scheduler::new();
        let mut core = test_core(0, Policy::Honest, &mut sched);
        let genesis = Block::genesis(0);
        let valid = child_of(&genesis, 1, true);
        let fp = valid.fingerprint();
        core.add_block(valid, &mut sched);
        assert_eq!(core.chain_head(), Some(fp));
    }

    #[test]
    fn spv_adopts_taller_chain_regardless_of_validity() {
        let mut sched = Scheduler::new();
        let mut core = test_core(
            0,
            Policy::Spv(SpvState { chain_head_others: None, pending_head: None, val_frac: 0.0 }),
            &mut sched,
        );
        let genesis = Block::genesis(0);
        let invalid = child_of(&genesis, 1, false);
        let fp = invalid.fingerprint();
        core.add_block(invalid, &mut sched);
        assert_eq!(core.chain_head(), Some(fp));
    }

    #[test]
    fn spv_deferred_check_reverts_an_invalid_head_to_the_valid_chain() {
        let mut sched = Scheduler::new();
        let mut core = test_core(
            0,
            Policy::Spv(SpvState { chain_head_others: None, pending_head: None, val_frac: 0.0 }),
            &mut sched,
        );
        let genesis = Block::genesis(0);
        let invalid = child_of(&genesis, 2, false);
        let invalid_fp = invalid.fingerprint();
        core.add_block(invalid, &mut sched);
        assert_eq!(core.chain_head(), Some(invalid_fp), "SPV adopts the taller head sight unseen");

        let valid = child_of(&genesis, 1, true);
        let valid_fp = valid.fingerprint();
        core.add_block(valid, &mut sched);
        assert_eq!(
            core.chain_head(),
            Some(invalid_fp),
            "an equal-height valid block never displaces the already-adopted head"
        );

        assert_eq!(core.pop_spv_deferred(), Some(invalid_fp));
        core.spv_resolve_deferred(invalid_fp);
        assert_eq!(
            core.chain_head(),
            Some(valid_fp),
            "the deferred check must fall back to the longest known-valid chain once it reads the invalid bit"
        );
    }

    fn attacker_core(sched: &mut Scheduler, k: u64) -> MinerCore {
        let race_outcome = sched.new_signal();
        test_core(
            0,
            Policy::Attacker(AttackerState {
                chain_head_others: None,
                invalid_len: 0,
                honest_len: 0,
                k,
                wins: 0,
                loses: 0,
                rebase_when_unforked: true,
                race_outcome,
            }),
            sched,
        )
    }

    #[test]
    fn attacker_wins_when_invalid_chain_reaches_k() {
        let mut sched = Scheduler::new();
        let mut core = attacker_core(&mut sched, 2);
        let genesis = Block::genesis(0);
        let b1 = child_of(&genesis, 0, false);
        let b2 = child_of(&b1, 0, false);
        core.add_block(b1, &mut sched);
        core.add_block(b2, &mut sched);
        let Policy::Attacker(attacker) = &core.policy else { unreachable!() };
        assert_eq!(attacker.wins, 1);
        assert_eq!(attacker.invalid_len, 0, "race state resets after resolution");
    }

    #[test]
    fn attacker_loses_when_honest_chain_reaches_k_after_a_fork() {
        let mut sched = Scheduler::new();
        let mut core = attacker_core(&mut sched, 2);
        let genesis = Block::genesis(0);
        // Attacker forks first (invalid_len = 1)...
        let own = child_of(&genesis, 0, false);
        core.add_block(own, &mut sched);
        // ...then the honest network outpaces it by two valid blocks.
        let h1 = child_of(&genesis, 1, true);
        let h2 = child_of(&h1, 1, true);
        core.add_block(h1, &mut sched);
        core.add_block(h2, &mut sched);
        let Policy::Attacker(attacker) = &core.policy else { unreachable!() };
        assert_eq!(attacker.loses, 1);
    }
}
