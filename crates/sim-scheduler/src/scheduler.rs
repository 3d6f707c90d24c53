//! The engine: a priority queue over virtual time, a signal registry, and
//! the activity slab. Modeled on the step-function driver pattern (see
//! `activity.rs`) rather than on stackful coroutines.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use tracing::{debug, trace};

use crate::activity::Activity;
use crate::domain::{Event, Fired, InterruptReason, Resumption, SignalId, SignalValue, Time};
use crate::error::SchedulerError;

/// Handle to a registered activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(usize);

/// What to run the scheduler until.
#[derive(Clone, Copy, Debug)]
pub enum StopCondition {
    /// Stop once virtual time reaches this instant (inclusive of events
    /// scheduled exactly at it).
    Time(Time),
    /// Stop the instant this signal fires, regardless of virtual time.
    Signal(SignalId),
}

/// Uniquely identifies one `wait()` issuance, so stale leaves from an
/// abandoned wait (the losing half of an `any_of`, or a wait an activity
/// was interrupted out of) can be told apart from the activity's current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GroupId(u64);

enum LeafValue {
    Timeout,
    Signal(SignalId, SignalValue),
}

struct QueueItem {
    fire_time: Time,
    seq: u64,
    activity: ActivityId,
    group: GroupId,
    path: Vec<usize>,
    value: LeafValue,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time && self.seq == other.seq
    }
}
impl Eq for QueueItem {}
impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest (time, seq) sorts first.
        other
            .fire_time
            .partial_cmp(&self.fire_time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

enum SignalState {
    Pending(Vec<(ActivityId, GroupId, Vec<usize>)>),
    Fired(SignalValue),
}

struct Slot {
    activity: Option<Box<dyn Activity>>,
    current_group: Option<GroupId>,
}

/// The simulation clock and event broker. Owns virtual time, the pending
/// event queue, every live signal, and every registered activity.
pub struct Scheduler {
    now: Time,
    seq: u64,
    next_group: u64,
    next_signal: u64,
    queue: BinaryHeap<QueueItem>,
    signals: HashMap<SignalId, SignalState>,
    activities: Vec<Slot>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            now: 0.0,
            seq: 0,
            next_group: 0,
            next_signal: 0,
            queue: BinaryHeap::new(),
            signals: HashMap::new(),
            activities: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Time {
        self.now
    }

    fn next_seq(&mut self) -> u64 {
        let s = self.seq;
        self.seq += 1;
        s
    }

    /// Allocate a fresh one-shot signal.
    pub fn new_signal(&mut self) -> SignalId {
        let id = SignalId(self.next_signal);
        self.next_signal += 1;
        self.signals.insert(id, SignalState::Pending(Vec::new()));
        id
    }

    /// Register an activity and run it to its first suspension point.
    pub fn spawn(&mut self, mut activity: Box<dyn Activity>) -> ActivityId {
        let id = ActivityId(self.activities.len());
        let first_event = activity.start(self);
        self.activities.push(Slot {
            activity: Some(activity),
            current_group: None,
        });
        self.register_wait(id, first_event);
        id
    }

    /// Succeed a pending signal, waking every activity waiting on it (at
    /// the current instant, in FIFO registration order).
    pub fn succeed(&mut self, signal: SignalId, value: SignalValue) -> Result<(), SchedulerError> {
        let waiters = match self.signals.get_mut(&signal) {
            Some(SignalState::Pending(waiters)) => std::mem::take(waiters),
            Some(SignalState::Fired(_)) | None => {
                return Err(SchedulerError::SignalAlreadyFired(signal));
            }
        };
        self.signals
            .insert(signal, SignalState::Fired(value.clone()));
        let now = self.now;
        for (activity, group, path) in waiters {
            let seq = self.next_seq();
            self.queue.push(QueueItem {
                fire_time: now,
                seq,
                activity,
                group,
                path,
                value: LeafValue::Signal(signal, value.clone()),
            });
        }
        Ok(())
    }

    /// Interrupt an activity, abandoning whatever it was waiting on and
    /// synchronously delivering `reason`. Any outstanding leaf of the
    /// abandoned wait that fires later is dropped as stale.
    pub fn interrupt(&mut self, activity: ActivityId, reason: InterruptReason) {
        self.activities[activity.0].current_group = None;
        let next_event = self.dispatch(activity, Resumption::Interrupted(reason));
        self.register_wait(activity, next_event);
    }

    fn dispatch(&mut self, activity: ActivityId, resumption: Resumption) -> Event {
        let mut slot = self.activities[activity.0].activity.take().expect("activity re-entered");
        let event = slot.resume(resumption, self);
        self.activities[activity.0].activity = Some(slot);
        event
    }

    fn register_wait(&mut self, activity: ActivityId, event: Event) {
        let group = GroupId(self.next_group);
        self.next_group += 1;
        self.activities[activity.0].current_group = Some(group);
        self.register_leaves(activity, group, Vec::new(), event);
    }

    fn register_leaves(&mut self, activity: ActivityId, group: GroupId, path: Vec<usize>, event: Event) {
        match event {
            Event::Timeout(dt) => {
                let seq = self.next_seq();
                self.queue.push(QueueItem {
                    fire_time: self.now + dt,
                    seq,
                    activity,
                    group,
                    path,
                    value: LeafValue::Timeout,
                });
            }
            Event::Signal(id) => match self.signals.get_mut(&id) {
                Some(SignalState::Pending(waiters)) => waiters.push((activity, group, path)),
                Some(SignalState::Fired(value)) => {
                    let value = value.clone();
                    let seq = self.next_seq();
                    self.queue.push(QueueItem {
                        fire_time: self.now,
                        seq,
                        activity,
                        group,
                        path,
                        value: LeafValue::Signal(id, value),
                    });
                }
                None => panic!("wait registered on unknown signal {id:?}"),
            },
            Event::AnyOf(branches) => {
                for (i, branch) in branches.into_iter().enumerate() {
                    let mut branch_path = path.clone();
                    branch_path.push(i);
                    self.register_leaves(activity, group, branch_path, branch);
                }
            }
            Event::Halt => {
                // No leaves registered: this activity never resumes again.
            }
        }
    }

    /// Run the clock forward until `stop`. Returns the virtual time the
    /// scheduler stopped at.
    pub fn run(&mut self, stop: StopCondition) -> Time {
        loop {
            let Some(peek_time) = self.queue.peek().map(|i| i.fire_time) else {
                break;
            };
            if let StopCondition::Time(until) = stop {
                if peek_time > until {
                    self.now = until;
                    break;
                }
            }

            // Gather every item at this exact instant, grouped by (activity, group)
            // but preserving first-seen (registration/seq) order across groups.
            // Dispatch can itself enqueue zero-delay follow-ups at the same instant,
            // so keep re-gathering until the instant is exhausted.
            let mut order: Vec<(ActivityId, GroupId)> = Vec::new();
            let mut batch: HashMap<(ActivityId, GroupId), Vec<(Vec<usize>, LeafValue)>> =
                HashMap::new();
            while let Some(item) = self.queue.peek() {
                if item.fire_time != peek_time {
                    break;
                }
                let item = self.queue.pop().unwrap();
                self.now = item.fire_time;
                let key = (item.activity, item.group);
                if !batch.contains_key(&key) {
                    order.push(key);
                }
                batch.entry(key).or_default().push((item.path, item.value));
            }

            for (activity, group) in order {
                let leaves = batch.remove(&(activity, group)).unwrap();
                if self.activities[activity.0].current_group != Some(group) {
                    trace!(activity = activity.0, "dropping stale wake, wait already abandoned");
                    continue;
                }
                let fired = build_fired(leaves);
                debug!(activity = activity.0, time = self.now, "resuming activity");
                let next_event = self.dispatch(activity, Resumption::Fired(fired));
                self.register_wait(activity, next_event);
            }

            if let StopCondition::Signal(id) = stop {
                if matches!(self.signals.get(&id), Some(SignalState::Fired(_))) {
                    break;
                }
            }
        }
        self.now
    }
}

fn build_fired(leaves: Vec<(Vec<usize>, LeafValue)>) -> Fired {
    debug_assert!(!leaves.is_empty());
    if leaves.len() == 1 && leaves[0].0.is_empty() {
        return match &leaves[0].1 {
            LeafValue::Timeout => Fired::Timeout,
            LeafValue::Signal(id, v) => Fired::Signal(*id, v.clone()),
        };
    }
    let mut groups: BTreeMap<usize, Vec<(Vec<usize>, LeafValue)>> = BTreeMap::new();
    for (mut path, value) in leaves {
        let idx = path.remove(0);
        groups.entry(idx).or_default().push((path, value));
    }
    Fired::Any(
        groups
            .into_iter()
            .map(|(idx, sub)| (idx, build_fired(sub)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Ticker {
        log: Rc<RefCell<Vec<String>>>,
        remaining: u32,
    }
    impl Activity for Ticker {
        fn name(&self) -> &str {
            "ticker"
        }
        fn start(&mut self, _sched: &mut Scheduler) -> Event {
            Event::Timeout(1.0)
        }
        fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> Event {
            assert!(matches!(resumption, Resumption::Fired(Fired::Timeout)));
            self.log.borrow_mut().push(format!("tick@{}", sched.now()));
            self.remaining -= 1;
            Event::Timeout(1.0)
        }
    }

    #[test]
    fn timeouts_fire_in_order_and_stop_at_budget() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        sched.spawn(Box::new(Ticker {
            log: log.clone(),
            remaining: 10,
        }));
        let stopped_at = sched.run(StopCondition::Time(3.5));
        assert_eq!(stopped_at, 3.5);
        assert_eq!(&*log.borrow(), &["tick@1", "tick@2", "tick@3"]);
    }

    // Mirrors the real miner pattern: a fired slot is rearmed with a fresh
    // signal id before the next wait; an unfired slot is reused as-is.
    struct AnyOfWaiter {
        a: SignalId,
        b: SignalId,
        log: Rc<RefCell<Vec<String>>>,
    }
    impl Activity for AnyOfWaiter {
        fn name(&self) -> &str {
            "any-of-waiter"
        }
        fn start(&mut self, _sched: &mut Scheduler) -> Event {
            Event::AnyOf(vec![Event::Signal(self.a), Event::Signal(self.b)])
        }
        fn resume(&mut self, resumption: Resumption, sched: &mut Scheduler) -> Event {
            if let Resumption::Fired(Fired::Any(branches)) = resumption {
                self.log
                    .borrow_mut()
                    .push(format!("woke@{} branches={}", sched.now(), branches.len()));
                for (idx, _) in branches {
                    if idx == 0 {
                        self.a = sched.new_signal();
                    } else {
                        self.b = sched.new_signal();
                    }
                }
            }
            Event::AnyOf(vec![Event::Signal(self.a), Event::Signal(self.b)])
        }
    }

    #[test]
    fn any_of_wakes_once_per_branch_and_leaves_sibling_untouched() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let a = sched.new_signal();
        let b = sched.new_signal();
        let id = sched.spawn(Box::new(AnyOfWaiter { a, b, log: log.clone() }));

        sched.succeed(a, SignalValue::Unit).unwrap();
        sched.run(StopCondition::Time(0.0));
        assert_eq!(&*log.borrow(), &["woke@0 branches=1"]);

        // The activity re-armed branch 0 with a fresh signal and kept `b` as
        // its still-unfired branch 1 (left untouched, per contract, rather
        // than cancelled). Interrupting now abandons that wait too, without
        // ever having fired `b`.
        sched.interrupt(id, InterruptReason::NewBlockPending);

        // `b` belongs only to abandoned waits at this point; firing it must
        // not re-wake the activity.
        sched.succeed(b, SignalValue::Unit).unwrap();
        sched.run(StopCondition::Time(0.0));
        assert_eq!(log.borrow().len(), 1, "stale sibling fire must not re-wake the activity");
    }

    #[test]
    fn interrupt_delivers_synchronously_and_abandons_the_wait() {
        struct Interruptible {
            log: Rc<RefCell<Vec<String>>>,
        }
        impl Activity for Interruptible {
            fn name(&self) -> &str {
                "interruptible"
            }
            fn start(&mut self, _sched: &mut Scheduler) -> Event {
                Event::Timeout(100.0)
            }
            fn resume(&mut self, resumption: Resumption, _sched: &mut Scheduler) -> Event {
                match resumption {
                    Resumption::Interrupted(reason) => {
                        self.log.borrow_mut().push(format!("interrupted:{reason:?}"));
                        Event::Timeout(1.0)
                    }
                    Resumption::Fired(Fired::Timeout) => {
                        self.log.borrow_mut().push("timed out".into());
                        Event::Timeout(1.0)
                    }
                    _ => unreachable!(),
                }
            }
        }
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let id = sched.spawn(Box::new(Interruptible { log: log.clone() }));
        sched.interrupt(id, InterruptReason::NewBlockPending);
        assert_eq!(&*log.borrow(), &["interrupted:NewBlockPending"]);
        // the abandoned 100.0 timeout must not fire later and double-resume.
        sched.run(StopCondition::Time(2.0));
        assert_eq!(&*log.borrow(), &["interrupted:NewBlockPending", "timed out", "timed out"]);
    }
}
