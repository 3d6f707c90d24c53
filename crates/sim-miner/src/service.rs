//! The service loop: answer the network, forever.
//!
//! `BLOCK_REQUEST` is answered from local storage if known (dropped
//! otherwise — the requester will re-broadcast on its next validation
//! round). `BLOCK_RESPONSE` is handed to the main loop's validation
//! queue. `HEAD_NEW` triggers a fetch when the announced tip isn't
//! already known locally, which is how a gossip announcement turns into
//! an actual block transfer.

use std::cell::RefCell;
use std::rc::Rc;

use sim_scheduler::{Activity, Event, Fired, Resumption, Scheduler};
use sim_types::{Action, Envelope, Payload};

use crate::core::MinerCore;

pub struct ServiceActivity {
    core: Rc<RefCell<MinerCore>>,
}

impl ServiceActivity {
    pub fn new(core: Rc<RefCell<MinerCore>>) -> Self {
        Self { core }
    }

    fn handle(&mut self, envelope: Envelope, sched: &mut Scheduler) {
        match envelope.action {
            Action::BlockRequest => {
                let fp = envelope.payload.fingerprint();
                let core = self.core.borrow();
                if let Some(block) = core.block(fp) {
                    let _ = core
                        .socket()
                        .send_event(sched, envelope.origin, Action::BlockResponse, Payload::Block(block.clone()));
                }
            }
            Action::BlockResponse => {
                if let Payload::Block(block) = envelope.payload {
                    let mut core = self.core.borrow_mut();
                    core.blocks_new.push_back(block.clone());
                    core.notify_received_block(block, sched);
                }
            }
            Action::HeadNew => {
                let fp = envelope.payload.fingerprint();
                let mut core = self.core.borrow_mut();
                core.note_announced_head(fp);
                if !core.known(fp) {
                    let _ = core
                        .socket()
                        .send_event(sched, envelope.origin, Action::BlockRequest, Payload::Fingerprint(fp));
                }
            }
            Action::BlockNew | Action::AttackWin | Action::AttackLose => {
                // Informational only; no peer ever sends these over the wire.
            }
        }
    }
}

impl Activity for ServiceActivity {
    fn name(&self) -> &str {
        "service"
    }

    fn start(&mut self, sched: &mut Scheduler) -> Event {
        self.core.borrow().socket().receive(sched)
    }

    fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> Event {
        if let Resumption::Fired(Fired::Signal(_, value)) = resumption {
            let envelope = value.into_envelope().expect("service loop only waits on envelopes");
            self.handle(envelope, sched);
        } else {
            unreachable!("service loop only ever waits on its socket");
        }
        self.core.borrow().socket().receive(sched)
    }
}
