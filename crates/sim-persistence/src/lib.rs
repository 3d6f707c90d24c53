//! # Simulation Persistence
//!
//! The driver's one external collaborator: a small port trait for
//! archiving blocks, miners, links and chains, with a no-op and an
//! in-memory adapter in place of a Redis-backed store.

mod backend;
mod error;
mod in_memory;
mod null;

pub use backend::{build_backend, BackendKind, Fields, PersistenceBackend};
pub use error::PersistenceError;
pub use in_memory::{InMemoryBackend, SortedSet};
pub use null::NullBackend;
