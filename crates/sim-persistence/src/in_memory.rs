//! A backend that keeps everything in process memory, for offline
//! inspection and tests, in place of a Redis-backed store.

use std::collections::{BTreeMap, HashMap};

use crate::backend::{Fields, PersistenceBackend};
use crate::error::PersistenceError;

/// An in-memory sorted set: key -> score, iterable in score order.
#[derive(Default, Debug, Clone)]
pub struct SortedSet {
    entries: BTreeMap<String, f64>,
}

impl SortedSet {
    /// Members in ascending score order.
    pub fn members(&self) -> Vec<(&str, f64)> {
        let mut members: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        members.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        members
    }
}

/// In-memory persistence backend.
#[derive(Default)]
pub struct InMemoryBackend {
    counters: HashMap<String, u64>,
    records: HashMap<String, Fields>,
    indices: HashMap<String, SortedSet>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back a stored record, for tests and offline inspection.
    pub fn get_record(&self, path: &str) -> Option<&Fields> {
        self.records.get(path)
    }

    /// Read back a sorted-set index, for tests and offline inspection.
    pub fn get_index(&self, set: &str) -> Option<&SortedSet> {
        self.indices.get(set)
    }
}

impl PersistenceBackend for InMemoryBackend {
    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.counters.clear();
        self.records.clear();
        self.indices.clear();
        Ok(())
    }

    fn allocate_id(&mut self, domain: &str) -> Result<u64, PersistenceError> {
        let counter = self.counters.entry(domain.to_string()).or_insert(0);
        let id = *counter;
        *counter += 1;
        Ok(id)
    }

    fn record(&mut self, path: &str, fields: Fields) -> Result<(), PersistenceError> {
        self.records.insert(path.to_string(), fields);
        Ok(())
    }

    fn record_index(&mut self, set: &str, score: f64, key: &str) -> Result<(), PersistenceError> {
        self.indices
            .entry(set.to_string())
            .or_default()
            .entries
            .insert(key.to_string(), score);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_round_trip() {
        let mut backend = InMemoryBackend::new();
        backend
            .record("block/abc123", vec![("height".into(), "3".into())])
            .unwrap();
        assert_eq!(
            backend.get_record("block/abc123"),
            Some(&vec![("height".to_string(), "3".to_string())])
        );
    }

    #[test]
    fn index_members_come_back_in_score_order() {
        let mut backend = InMemoryBackend::new();
        backend.record_index("chain/0", 3.0, "c").unwrap();
        backend.record_index("chain/0", 1.0, "a").unwrap();
        backend.record_index("chain/0", 2.0, "b").unwrap();
        let members = backend.get_index("chain/0").unwrap().members();
        assert_eq!(members, vec![("a", 1.0), ("b", 2.0), ("c", 3.0)]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut backend = InMemoryBackend::new();
        backend.allocate_id("miner").unwrap();
        backend.record("x", vec![]).unwrap();
        backend.clear().unwrap();
        assert_eq!(backend.allocate_id("miner").unwrap(), 0);
        assert!(backend.get_record("x").is_none());
    }
}
