//! SPV's deferred background activity. Two jobs, run after every
//! main-loop validation round:
//!
//! 1. If a gossiped head is still unsynced, re-request it.
//! 2. Drain the queue of SPV-adopted heads awaiting their deferred
//!    validity check, one at a time: wait `val_frac * size / verifyrate`
//!    virtual seconds per head, then read its actual validity bit and
//!    fall back to the longest known-valid chain if it turned out
//!    invalid.
//!
//! Harmless to spawn for non-SPV policies — both jobs are no-ops there.

use std::cell::RefCell;
use std::rc::Rc;

use sim_scheduler::{Activity, Event, Fired, Resumption, Scheduler};
use sim_types::{Action, Fingerprint, Payload};

use crate::core::MinerCore;

enum State {
    Waiting,
    Checking(Fingerprint),
}

pub struct SpvReconcileActivity {
    core: Rc<RefCell<MinerCore>>,
    state: State,
}

impl SpvReconcileActivity {
    pub fn new(core: Rc<RefCell<MinerCore>>) -> Self {
        Self { core, state: State::Waiting }
    }

    fn wait_event(&self) -> Event {
        Event::Signal(self.core.borrow().continue_mining)
    }

    fn fetch_pending_head(&self, sched: &mut Scheduler) {
        let core = self.core.borrow();
        let Some(fp) = core.spv_pending_head() else { return };
        if !core.known(fp) {
            core.socket()
                .broadcast(sched, Action::BlockRequest, Payload::Fingerprint(fp));
        }
    }

    /// Pop the next deferred head, if any, and start timing its check.
    fn advance(&mut self) -> Event {
        match self.core.borrow_mut().pop_spv_deferred() {
            Some(fp) => {
                let delay = self.core.borrow().spv_deferred_delay(fp);
                self.state = State::Checking(fp);
                Event::Timeout(delay)
            }
            None => {
                self.state = State::Waiting;
                self.wait_event()
            }
        }
    }
}

impl Activity for SpvReconcileActivity {
    fn name(&self) -> &str {
        "spv-reconcile"
    }

    fn start(&mut self, _sched: &mut Scheduler) -> Event {
        self.state = State::Waiting;
        self.wait_event()
    }

    fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> Event {
        match (&self.state, resumption) {
            (State::Waiting, Resumption::Fired(Fired::Signal(_, _))) => {
                self.fetch_pending_head(sched);
                self.advance()
            }
            (State::Checking(fp), Resumption::Fired(Fired::Timeout)) => {
                self.core.borrow_mut().spv_resolve_deferred(*fp);
                self.advance()
            }
            _ => unreachable!("spv-reconcile's state and resumption kind must always agree"),
        }
    }
}
