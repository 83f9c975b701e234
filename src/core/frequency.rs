//! LFU frequency table: victims are the lowest `(frequency, tie_break)` pair
//! in lexicographic order, oldest-first among ties.
//!
//! A `BTreeMap<(u64, u64), Arc<str>>` keeps that ordering for free and never
//! goes stale the way a lazily-invalidated min-heap can; moving an id to a
//! new frequency is one `O(log n)` removal plus one `O(log n)` insertion.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Default)]
pub(crate) struct FrequencyTable {
    by_key: BTreeMap<(u64, u64), Arc<str>>,
    by_id: HashMap<Arc<str>, (u64, u64)>,
}

impl FrequencyTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns the current frequency of `id`, if present.
    pub(crate) fn frequency_of(&self, id: &str) -> Option<u64> {
        self.by_id.get(id).map(|(freq, _)| *freq)
    }

    /// Inserts `id` (which must not already be present) at `frequency`,
    /// stamped with `tick` as its tie-break timestamp. Used both for a
    /// fresh admission (`frequency == 1`) and for re-inserting an id under a
    /// caller-computed frequency after a replacement or an `update`.
    pub(crate) fn insert_with_frequency(&mut self, id: Arc<str>, frequency: u64, tick: u64) {
        debug_assert!(!self.by_id.contains_key(id.as_ref()));
        let key = (frequency, tick);
        self.by_id.insert(id.clone(), key);
        self.by_key.insert(key, id);
    }

    /// Increments an existing, still-present id's frequency in place.
    pub(crate) fn increment(&mut self, id: &str, tick: u64) {
        if let Some((arc_id, &old_key)) = self.by_id.get_key_value(id) {
            let arc_id = arc_id.clone();
            self.by_key.remove(&old_key);
            let new_key = (old_key.0 + 1, tick);
            self.by_id.insert(arc_id.clone(), new_key);
            self.by_key.insert(new_key, arc_id);
        }
    }

    pub(crate) fn remove(&mut self, id: &str) {
        if let Some(key) = self.by_id.remove(id) {
            self.by_key.remove(&key);
        }
    }

    pub(crate) fn peek_victim(&self) -> Option<Arc<str>> {
        self.by_key.iter().next().map(|(_, id)| id.clone())
    }

    pub(crate) fn pop_victim(&mut self) -> Option<Arc<str>> {
        let (&key, id) = self.by_key.iter().next()?;
        let id = id.clone();
        self.by_key.remove(&key);
        self.by_id.remove(id.as_ref());
        Some(id)
    }

    pub(crate) fn clear(&mut self) {
        self.by_key.clear();
        self.by_id.clear();
    }
}
