use std::collections::HashMap;

use sim_scheduler::{Activity, Event, Resumption, Scheduler};
use sim_types::{Action, Envelope, Payload};

use crate::error::NetworkError;
use crate::link::Link;
use crate::store::{EnvelopeStore, SharedStore};

/// A miner's network endpoint: its outgoing links, keyed by peer id, and a
/// handle to the store shared by every socket in the simulation.
pub struct Socket {
    id: u64,
    links: HashMap<u64, Link>,
    store: SharedStore,
}

impl Socket {
    pub fn new(id: u64, store: SharedStore) -> Self {
        Self {
            id,
            links: HashMap::new(),
            store,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn add_link(&mut self, link: Link) {
        debug_assert_eq!(link.src, self.id);
        self.links.insert(link.dst, link);
    }

    pub fn peers(&self) -> impl Iterator<Item = u64> + '_ {
        self.links.keys().copied()
    }

    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    /// Schedule delivery of `(action, payload)` to `to`, after the link's
    /// propagation delay elapses.
    pub fn send_event(
        &self,
        sched: &mut Scheduler,
        to: u64,
        action: Action,
        payload: Payload,
    ) -> Result<(), NetworkError> {
        let link = self
            .links
            .get(&to)
            .ok_or(NetworkError::NoLink { src: self.id, dst: to })?;
        let envelope = Envelope::new(self.id, to, action, payload);
        sched.spawn(Box::new(DeliverLink {
            store: self.store.clone(),
            envelope: Some(envelope),
            delay: link.delay,
        }));
        Ok(())
    }

    /// Send `(action, payload)` to every connected peer.
    pub fn broadcast(&self, sched: &mut Scheduler, action: Action, payload: Payload) {
        for peer in self.links.keys().copied().collect::<Vec<_>>() {
            self.send_event(sched, peer, action, payload.clone())
                .expect("broadcast only targets known links");
        }
    }

    /// The event to wait on for this socket's next inbound envelope.
    pub fn receive(&self, sched: &mut Scheduler) -> Event {
        Event::Signal(EnvelopeStore::await_next(&self.store, self.id, sched))
    }
}

/// A one-shot activity modeling the propagation delay of a single send:
/// wait `delay`, then deposit the envelope in the shared store.
struct DeliverLink {
    store: SharedStore,
    envelope: Option<Envelope>,
    delay: sim_scheduler::Time,
}

impl Activity for DeliverLink {
    fn name(&self) -> &str {
        "link-delivery"
    }

    fn start(&mut self, _sched: &mut Scheduler) -> Event {
        Event::Timeout(self.delay)
    }

    fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> Event {
        debug_assert!(matches!(resumption, Resumption::Fired(_)));
        let envelope = self.envelope.take().expect("delivered exactly once");
        EnvelopeStore::deliver(&self.store, envelope, sched);
        Event::Halt
    }
}
