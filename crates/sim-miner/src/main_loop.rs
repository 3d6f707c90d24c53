//! The main loop: wait for a mined or received block, then validate
//! whatever landed in the queue against locally known chain state.
//!
//! The mining activity is interrupted unconditionally the instant this
//! loop wakes, before a single block is validated — a block already
//! mid-flight toward a `Timeout` must never mint atop a head this round
//! is about to replace. `continue_mining` only fires once the round is
//! done, at which point the mining activity resamples against whatever
//! head now stands.
//!
//! Validation is a small internal state machine rather than a spawned
//! activity: each queued block takes `validate_delay` virtual seconds to
//! process, one at a time, mirroring serial block connection. A count of
//! blocks captured at the start of the round keeps a block re-enqueued
//! for an unknown parent from being re-validated within the same round —
//! it waits for the next wake instead.

use std::cell::RefCell;
use std::rc::Rc;

use sim_scheduler::{ActivityId, Activity, Event, Fired, InterruptReason, Resumption, Scheduler};
use sim_telemetry::record_block_rejected;
use sim_types::{Action, Block, ParentRef, Payload};

use crate::core::{MinerCore, VerifyResult};

enum State {
    Idle,
    Validating {
        remaining_after: usize,
        current: Block,
    },
}

pub struct MainLoopActivity {
    core: Rc<RefCell<MinerCore>>,
    mining: Option<ActivityId>,
    state: State,
}

impl MainLoopActivity {
    /// `mining` is `None` for a zero-hashrate miner, which never mines and
    /// so has no mining activity to interrupt on a head change.
    pub fn new(core: Rc<RefCell<MinerCore>>, mining: Option<ActivityId>) -> Self {
        Self { core, mining, state: State::Idle }
    }

    fn wait_event(&self) -> Event {
        let core = self.core.borrow();
        Event::AnyOf(vec![
            Event::Signal(core.block_mined),
            Event::Signal(core.block_received),
        ])
    }

    /// Start (or continue) a validation round. `remaining_before` is how
    /// many blocks from this round still need to be popped, including the
    /// one this call pops.
    fn begin_validate(&mut self, remaining_before: usize, sched: &mut Scheduler) -> Event {
        let mut core = self.core.borrow_mut();
        let Some(block) = core.blocks_new.pop_front() else {
            drop(core);
            return self.finish_round(sched);
        };
        let delay = core.validate_delay(&block);
        self.state = State::Validating { remaining_after: remaining_before - 1, current: block };
        Event::Timeout(delay)
    }

    fn finish_round(&mut self, sched: &mut Scheduler) -> Event {
        self.state = State::Idle;
        self.core.borrow_mut().notify_continue_mining(sched);
        self.wait_event()
    }

    fn classify_and_apply(&mut self, block: Block, sched: &mut Scheduler) {
        let verdict = self.core.borrow().verify_block(&block);
        match verdict {
            VerifyResult::Accept => {
                self.core.borrow_mut().add_block(block, sched);
            }
            VerifyResult::UnknownPrev => {
                let missing = match block.prev {
                    ParentRef::Block(fp) => Some(fp),
                    ParentRef::Genesis => None,
                };
                let mut core = self.core.borrow_mut();
                core.blocks_new.push_back(block);
                if let Some(fp) = missing {
                    core.socket()
                        .broadcast(sched, Action::BlockRequest, Payload::Fingerprint(fp));
                }
            }
            VerifyResult::Reject => {
                record_block_rejected("height_mismatch_or_stale_fork");
            }
        }
    }
}

impl Activity for MainLoopActivity {
    fn name(&self) -> &str {
        "main-loop"
    }

    fn start(&mut self, _sched: &mut Scheduler) -> Event {
        self.state = State::Idle;
        self.wait_event()
    }

    fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> Event {
        let state = std::mem::replace(&mut self.state, State::Idle);
        match (state, resumption) {
            (State::Idle, Resumption::Fired(Fired::Any(_))) => {
                if let Some(mining) = self.mining {
                    sched.interrupt(mining, InterruptReason::NewBlockPending);
                }
                let remaining = self.core.borrow().blocks_new.len();
                self.begin_validate(remaining, sched)
            }
            (State::Validating { remaining_after, current }, Resumption::Fired(Fired::Timeout)) => {
                self.classify_and_apply(current, sched);
                if remaining_after > 0 {
                    self.begin_validate(remaining_after, sched)
                } else {
                    self.finish_round(sched)
                }
            }
            _ => unreachable!("main loop's state and resumption kind must always agree"),
        }
    }
}
