//! The persistence port: what the simulation core needs from durable
//! storage, independent of what actually backs it.
//!
//! An outbound port trait plus swappable adapters, in the style of a
//! Redis-backed key/value store, though the shipped adapters here are
//! in-memory only.

use crate::error::PersistenceError;

/// A field record: simple key/value pairs, as a Redis hash would store them.
pub type Fields = Vec<(String, String)>;

/// Where a record or index write is headed, expressed as a flat path
/// (e.g. `["block", &fingerprint.to_string()]`) rather than a schema, since
/// every adapter treats it as an opaque string key.
pub trait PersistenceBackend {
    /// Wipe everything the backend holds. Called once at the start of a
    /// run so successive runs in the same process don't see stale state.
    fn clear(&mut self) -> Result<(), PersistenceError>;

    /// Allocate the next id in a monotonically increasing sequence scoped
    /// to `domain` (e.g. `"miner"`, `"block"`). Stable even with
    /// persistence disabled, so miner ids don't depend on whether a run
    /// is being archived.
    fn allocate_id(&mut self, domain: &str) -> Result<u64, PersistenceError>;

    /// Store (or overwrite) a flat record at `path`.
    fn record(&mut self, path: &str, fields: Fields) -> Result<(), PersistenceError>;

    /// Add `key` to the sorted set `set` with the given `score` (mirrors a
    /// Redis `ZADD`; used for height-ordered chain indices).
    fn record_index(&mut self, set: &str, score: f64, key: &str) -> Result<(), PersistenceError>;
}

/// Construct the configured backend. The only failure mode the driver
/// treats as fatal (exit code -1) is this constructor failing.
pub fn build_backend(kind: BackendKind) -> Result<Box<dyn PersistenceBackend>, PersistenceError> {
    match kind {
        BackendKind::Null => Ok(Box::new(crate::null::NullBackend::new())),
        BackendKind::InMemory => Ok(Box::new(crate::in_memory::InMemoryBackend::new())),
    }
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Every call is a no-op; only id allocation is stateful.
    Null,
    /// Keeps everything in process memory, for offline inspection or tests.
    InMemory,
}
