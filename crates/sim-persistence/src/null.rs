//! A backend that discards everything but id allocation.

use std::collections::HashMap;

use crate::backend::{Fields, PersistenceBackend};
use crate::error::PersistenceError;

/// No-op persistence: every write is dropped. `allocate_id` still counts,
/// so miner/block ids are identical whether or not archival is enabled.
#[derive(Default)]
pub struct NullBackend {
    counters: HashMap<String, u64>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceBackend for NullBackend {
    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.counters.clear();
        Ok(())
    }

    fn allocate_id(&mut self, domain: &str) -> Result<u64, PersistenceError> {
        let counter = self.counters.entry(domain.to_string()).or_insert(0);
        let id = *counter;
        *counter += 1;
        Ok(id)
    }

    fn record(&mut self, _path: &str, _fields: Fields) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn record_index(&mut self, _set: &str, _score: f64, _key: &str) -> Result<(), PersistenceError> {
        Ok(())
    }
}
