//! The shared envelope store: one FIFO per destination, so receivers never
//! contend and removal is atomic in virtual time.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use sim_scheduler::{Scheduler, SignalId, SignalValue};
use sim_types::Envelope;

/// Shared handle to the store, cloned cheaply into every [`crate::Socket`].
pub type SharedStore = Rc<RefCell<EnvelopeStore>>;

#[derive(Default)]
pub struct EnvelopeStore {
    queues: HashMap<u64, VecDeque<Envelope>>,
    waiters: HashMap<u64, SignalId>,
}

impl EnvelopeStore {
    pub fn new() -> SharedStore {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Deliver an envelope to its destination: if a receiver is already
    /// waiting, wake it immediately; otherwise buffer it in FIFO order.
    pub fn deliver(store: &SharedStore, envelope: Envelope, sched: &mut Scheduler) {
        let dst = envelope.destination;
        let waiter = store.borrow_mut().waiters.remove(&dst);
        match waiter {
            Some(signal) => sched
                .succeed(signal, SignalValue::Envelope(envelope))
                .expect("receive() waiter signal must still be pending"),
            None => store.borrow_mut().queues.entry(dst).or_default().push_back(envelope),
        }
    }

    /// Register interest in the next envelope for `dst`. Returns the signal
    /// to wait on; if an envelope is already buffered it is delivered to
    /// this signal immediately (same virtual instant).
    pub fn await_next(store: &SharedStore, dst: u64, sched: &mut Scheduler) -> SignalId {
        let buffered = store.borrow_mut().queues.get_mut(&dst).and_then(VecDeque::pop_front);
        let signal = sched.new_signal();
        match buffered {
            Some(envelope) => sched
                .succeed(signal, SignalValue::Envelope(envelope))
                .expect("freshly allocated signal is always pending"),
            None => {
                store.borrow_mut().waiters.insert(dst, signal);
            }
        }
        signal
    }
}
