//! The mining loop: sample an inter-arrival delay, produce a block at the
//! end of it, hand the block to the main loop's validation pipeline, repeat.
//!
//! A change of chain head while this activity is mid-wait interrupts it.
//! Rather than resample immediately, it then waits on `continue_mining` —
//! fired once the main loop's validation round that triggered the
//! interrupt has actually applied the new head — before restarting; this
//! keeps a mined block from ever extending state that's still mid-update.

use std::cell::RefCell;
use std::rc::Rc;

use sim_scheduler::{Activity, Event, Fired, Resumption, Scheduler};
use sim_telemetry::record_block_mined;

use crate::core::MinerCore;

#[derive(Clone, Copy)]
enum State {
    Mining,
    WaitingToContinue,
}

pub struct MiningActivity {
    core: Rc<RefCell<MinerCore>>,
    state: State,
}

impl MiningActivity {
    pub fn new(core: Rc<RefCell<MinerCore>>) -> Self {
        Self { core, state: State::Mining }
    }

    fn start_timeout(&self) -> Event {
        Event::Timeout(self.core.borrow().sample_mining_interval())
    }
}

impl Activity for MiningActivity {
    fn name(&self) -> &str {
        "mining"
    }

    fn start(&mut self, _sched: &mut Scheduler) -> Event {
        self.state = State::Mining;
        self.start_timeout()
    }

    fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> Event {
        match (self.state, resumption) {
            (State::Mining, Resumption::Fired(Fired::Timeout)) => {
                let now = sched.now();
                let block = self.core.borrow().mine_next(now);
                record_block_mined();
                let mut core = self.core.borrow_mut();
                core.blocks_new.push_back(block.clone());
                core.notify_new_block(block, sched);
                drop(core);
                self.state = State::Mining;
                self.start_timeout()
            }
            (State::Mining, Resumption::Interrupted(_)) => {
                self.state = State::WaitingToContinue;
                Event::Signal(self.core.borrow().continue_mining)
            }
            (State::WaitingToContinue, Resumption::Fired(Fired::Signal(_, _))) => {
                self.state = State::Mining;
                self.start_timeout()
            }
            _ => unreachable!("mining activity's state and resumption kind must always agree"),
        }
    }
}
