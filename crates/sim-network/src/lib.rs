//! # Message Bus & Link
//!
//! Typed envelope routing between miner endpoints. Each miner owns a
//! [`Socket`] referencing its outgoing [`Link`]s and a store shared by
//! every socket in the run; propagation delay is just a scheduler
//! timeout between send and delivery.

mod error;
mod link;
mod socket;
mod store;

pub use error::NetworkError;
pub use link::Link;
pub use socket::Socket;
pub use store::{EnvelopeStore, SharedStore};

#[cfg(test)]
mod tests {
    use super::*;
    use sim_scheduler::{Fired, Resumption, Scheduler, StopCondition};
    use sim_types::{Action, Block, Payload};

    #[test]
    fn send_event_delivers_after_link_delay() {
        let store = EnvelopeStore::new();
        let mut a = Socket::new(0, store.clone());
        let b = Socket::new(1, store.clone());
        a.add_link(Link::new(0, 1, 0.02));

        let mut sched = Scheduler::new();
        a.send_event(&mut sched, 1, Action::BlockRequest, Payload::Fingerprint(Block::genesis(0).fingerprint()))
            .unwrap();

        // Nothing has arrived yet at time 0.
        let signal = b.receive(&mut sched);
        let sim_scheduler::Event::Signal(_) = signal else { panic!("expected a signal") };

        sched.run(StopCondition::Time(0.02));
        assert_eq!(sched.now(), 0.02);
    }

    struct Receiver {
        socket: Socket,
        received: std::rc::Rc<std::cell::RefCell<Vec<sim_types::Envelope>>>,
    }
    impl sim_scheduler::Activity for Receiver {
        fn name(&self) -> &str {
            "receiver"
        }
        fn start(&mut self, sched: &mut Scheduler) -> sim_scheduler::Event {
            self.socket.receive(sched)
        }
        fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> sim_scheduler::Event {
            if let Resumption::Fired(Fired::Signal(_, value)) = resumption {
                self.received.borrow_mut().push(value.into_envelope().unwrap());
            }
            self.socket.receive(sched)
        }
    }

    #[test]
    fn receiver_activity_wakes_on_delivery() {
        let store = EnvelopeStore::new();
        let mut sched = Scheduler::new();
        let mut sender = Socket::new(0, store.clone());
        let receiver_socket = Socket::new(1, store.clone());
        sender.add_link(Link::new(0, 1, 0.02));

        let received = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        sched.spawn(Box::new(Receiver {
            socket: receiver_socket,
            received: received.clone(),
        }));
        sender
            .send_event(&mut sched, 1, Action::BlockRequest, Payload::Fingerprint(Block::genesis(0).fingerprint()))
            .unwrap();

        sched.run(StopCondition::Time(1.0));
        assert_eq!(received.borrow().len(), 1);
        assert_eq!(received.borrow()[0].action, Action::BlockRequest);
    }
}
