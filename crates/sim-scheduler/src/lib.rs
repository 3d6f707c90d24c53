//! # Event Scheduler
//!
//! A single-threaded, deterministic discrete-event engine: virtual time,
//! one-shot signals, `any_of` composition over them, and interruptible
//! activities whose bodies are written as explicit step functions rather
//! than as stackful coroutines (Rust has no stable generators).
//!
//! Everything here runs on one thread with `Rc`/`RefCell`, never `Arc`,
//! `Mutex`, or an async runtime: ordering within a virtual instant must be
//! reproducible, which a scheduler pool would put at risk for no benefit
//! in a domain with no real concurrency to exploit.

pub mod activity;
pub mod domain;
pub mod error;
pub mod scheduler;

pub use activity::Activity;
pub use domain::{Event, Fired, InterruptReason, Resumption, SignalId, SignalValue, Time};
pub use error::SchedulerError;
pub use scheduler::{ActivityId, Scheduler, StopCondition};
