use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::core::builder::CacheBuilder;
use crate::core::entry::Entry;
use crate::core::frequency::FrequencyTable;
use crate::core::order::OrderTable;
use crate::error::{CacheError, Result};
use crate::policy::{Mode, Policy};
use crate::size::Measure;

const EVICTION_BATCH_SIZE: usize = 1_000;

/// The policy-specific bookkeeping structure. LRU and LRA share the same
/// recency-ordered table and differ only in *when* the cache calls `touch`
/// on it (every read for LRU, never for LRA); LFU uses its own frequency
/// table.
enum PolicyState {
    Recency(OrderTable),
    Frequency(FrequencyTable),
}

impl PolicyState {
    fn len(&self) -> usize {
        match self {
            PolicyState::Recency(t) => t.len(),
            PolicyState::Frequency(t) => t.len(),
        }
    }

    fn remove(&mut self, id: &str) {
        match self {
            PolicyState::Recency(t) => t.remove(id),
            PolicyState::Frequency(t) => t.remove(id),
        }
    }

    fn pop_victim(&mut self) -> Option<Arc<str>> {
        match self {
            PolicyState::Recency(t) => t.pop_victim(),
            PolicyState::Frequency(t) => t.pop_victim(),
        }
    }

    fn clear(&mut self) {
        match self {
            PolicyState::Recency(t) => t.clear(),
            PolicyState::Frequency(t) => t.clear(),
        }
    }
}

struct Inner<V> {
    mode: Mode,
    memory_limit_bytes: u64,
    serialize_threshold_bytes: u64,
    entries: HashMap<Arc<str>, Entry<V>>,
    policy: PolicyState,
    total_charged_bytes: u64,
    monotonic_counter: u64,
}

impl<V> Inner<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    fn tick(&mut self) -> u64 {
        self.monotonic_counter += 1;
        self.monotonic_counter
    }

    fn record_read(&mut self, id: &str, tick: u64) {
        match self.mode {
            Mode::Lru => {
                if let PolicyState::Recency(t) = &mut self.policy {
                    t.touch(id);
                }
            }
            Mode::Lra => {
                // Reads never reorder under LRA; only writes do.
            }
            Mode::Lfu => {
                if let PolicyState::Frequency(t) = &mut self.policy {
                    t.increment(id, tick);
                }
            }
        }
    }

    fn evict_until_fits(&mut self, incoming_bytes: u64) -> SmallVec<[Arc<str>; 8]> {
        let mut evicted = SmallVec::new();
        while self.total_charged_bytes + incoming_bytes > self.memory_limit_bytes
            && !self.entries.is_empty()
        {
            if evicted.len() >= EVICTION_BATCH_SIZE {
                warn!(batch = EVICTION_BATCH_SIZE, "eviction batch limit reached");
                break;
            }
            let Some(victim) = self.policy.pop_victim() else {
                break;
            };
            if let Some(removed) = self.entries.remove(victim.as_ref()) {
                self.total_charged_bytes -= removed.charged_bytes;
                trace!(id = %victim, bytes = removed.charged_bytes, "evicted entry");
                evicted.push(victim);
            }
        }
        evicted
    }

    fn admit(&mut self, id: &str, value: V, is_update: bool) -> Result<()> {
        let entry = Entry::prepare(id, value, self.serialize_threshold_bytes)?;
        self.admit_entry(id, entry, is_update)
    }

    /// Shared admission path for a pre-sized [`Entry`]. Used by
    /// [`Inner::admit`] for the public `put`/`update` surface, and by the
    /// `#[cfg(test)]` byte-pinning hook so both paths evict and update
    /// policy metadata identically.
    fn admit_entry(&mut self, id: &str, entry: Entry<V>, is_update: bool) -> Result<()> {
        let needed = entry.charged_bytes;

        if needed > self.memory_limit_bytes {
            warn!(id, needed, limit = self.memory_limit_bytes, "rejecting oversized value");
            return Err(CacheError::CapacityExceeded {
                id: id.to_string(),
                needed,
                limit: self.memory_limit_bytes,
            });
        }

        let existing = self.entries.remove(id);
        let existing_frequency = match (&existing, &self.policy) {
            (Some(_), PolicyState::Frequency(t)) => t.frequency_of(id),
            _ => None,
        };
        if let Some(existing) = &existing {
            self.total_charged_bytes -= existing.charged_bytes;
            self.policy.remove(id);
        }

        self.evict_until_fits(needed);

        let tick = self.tick();
        let arc_id: Arc<str> = Arc::from(id);

        match &mut self.policy {
            PolicyState::Recency(t) => t.insert_mru(arc_id.clone()),
            PolicyState::Frequency(t) => {
                // Fresh admission, and replacement via `put`, both start at
                // frequency 1. Only `update` on an existing id is a
                // frequency-incrementing access.
                let frequency = match (is_update, existing_frequency) {
                    (true, Some(previous)) => previous + 1,
                    _ => 1,
                };
                t.insert_with_frequency(arc_id.clone(), frequency, tick);
            }
        }

        self.total_charged_bytes += needed;
        self.entries.insert(arc_id, entry);
        debug_assert_eq!(self.entries.len(), self.policy.len());
        debug!(id, needed, total = self.total_charged_bytes, "admitted entry");
        Ok(())
    }
}

/// A bounded-memory, in-process key-value cache with pluggable eviction
/// policy.
///
/// `Cache<V>` is cheap to clone: clones share the same underlying state
/// through an `Arc<Mutex<_>>`, so the cache can be handed to multiple
/// threads. Every public method locks the cache for the duration of one
/// critical section and returns; there are no suspension points while the
/// lock is held.
pub struct Cache<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl<V> Cache<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    /// Returns a [`CacheBuilder`] for constructing a `Cache`.
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    pub(crate) fn from_parts(
        mode: Mode,
        memory_limit_bytes: u64,
        serialize_threshold_bytes: u64,
    ) -> Self {
        let policy = match mode {
            Mode::Lru | Mode::Lra => PolicyState::Recency(OrderTable::new()),
            Mode::Lfu => PolicyState::Frequency(FrequencyTable::new()),
        };
        Self {
            inner: Arc::new(Mutex::new(Inner {
                mode,
                memory_limit_bytes,
                serialize_threshold_bytes,
                entries: HashMap::new(),
                policy,
                total_charged_bytes: 0,
                monotonic_counter: 0,
            })),
        }
    }

    /// Returns a read-only snapshot of this cache's fixed construction
    /// parameters.
    pub fn policy(&self) -> Policy {
        let inner = self.inner.lock();
        Policy::new(inner.mode, inner.memory_limit_bytes, inner.serialize_threshold_bytes)
    }

    /// Inserts or replaces the value stored under `id`. Evicts existing
    /// entries per the active policy until the new entry fits.
    pub fn put(&self, id: &str, value: V) -> Result<()> {
        self.inner.lock().admit(id, value, false)
    }

    /// Returns the value stored under `id`, deserializing it if it was
    /// stored in serialized form. Updates policy metadata per the active
    /// mode.
    pub fn get(&self, id: &str) -> Result<V> {
        let mut inner = self.inner.lock();
        let tick = inner.tick();
        let value = match inner.entries.get(id) {
            Some(entry) => entry.value(id)?,
            None => return Err(CacheError::NotFound(id.to_string())),
        };
        inner.record_read(id, tick);
        Ok(value)
    }

    /// Replaces the value stored under `id`. Errors with
    /// [`CacheError::NotFound`] if `id` is absent; this call never creates
    /// an entry.
    pub fn update(&self, id: &str, value: V) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.entries.contains_key(id) {
            return Err(CacheError::NotFound(id.to_string()));
        }
        inner.admit(id, value, true)
    }

    /// Removes the entry stored under `id`.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let Some(removed) = inner.entries.remove(id) else {
            return Err(CacheError::NotFound(id.to_string()));
        };
        inner.policy.remove(id);
        inner.total_charged_bytes -= removed.charged_bytes;
        debug_assert_eq!(inner.entries.len(), inner.policy.len());
        Ok(())
    }

    /// Returns whether `id` is present. Does not count as an access.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().entries.contains_key(id)
    }

    /// Removes every entry. `monotonic_counter` is preserved rather than
    /// reset, which is the safer default for concurrent observers relying
    /// on strictly increasing stamps.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.policy.clear();
        inner.total_charged_bytes = 0;
    }

    /// Returns a snapshot mapping each id to its currently charged bytes.
    pub fn overview(&self) -> HashMap<String, u64> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .map(|(id, entry)| (id.to_string(), entry.charged_bytes))
            .collect()
    }

    /// Returns a snapshot of every id currently present.
    pub fn identifiers(&self) -> Vec<String> {
        let inner = self.inner.lock();
        inner.entries.keys().map(|id| id.to_string()).collect()
    }

    /// Returns the number of entries currently stored.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Returns `total_charged_bytes`.
    pub fn memory_usage_bytes(&self) -> u64 {
        self.inner.lock().total_charged_bytes
    }

    /// Returns `total_charged_bytes` converted to megabytes
    /// (bytes / 1 048 576).
    pub fn memory_usage_megabytes(&self) -> f64 {
        self.memory_usage_bytes() as f64 / crate::config::BYTES_PER_MEGABYTE as f64
    }

    /// Returns `total_charged_bytes / memory_limit_bytes`, in `[0, 1]`.
    pub fn memory_usage_fraction(&self) -> f64 {
        let inner = self.inner.lock();
        inner.total_charged_bytes as f64 / inner.memory_limit_bytes as f64
    }
}

#[cfg(test)]
impl<V> Cache<V>
where
    V: Measure + Serialize + DeserializeOwned + Clone,
{
    /// Test-only hook letting tests pin an exact byte charge instead of
    /// depending on `Measure`'s real output for a given value, so
    /// eviction-order assertions are deterministic.
    pub(crate) fn put_with_charge(&self, id: &str, value: V, charge_bytes: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        let mut entry = Entry::prepare(id, value, 0)?;
        entry.charged_bytes = charge_bytes;
        inner.admit_entry(id, entry, false)
    }

    pub(crate) fn monotonic_counter(&self) -> u64 {
        self.inner.lock().monotonic_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(mode: &str, limit_bytes: u64) -> Cache<i64> {
        let mode: Mode = mode.parse().unwrap();
        Cache::from_parts(mode, limit_bytes, 0)
    }

    #[test]
    fn lru_evicts_the_least_recently_touched_entry() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 1, 40).unwrap();
        cache.put_with_charge("c", 1, 40).unwrap();

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.memory_usage_bytes(), 80);
    }

    #[test]
    fn lru_get_promotes_an_entry_away_from_eviction() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 1, 40).unwrap();
        cache.get("a").unwrap();
        cache.put_with_charge("c", 1, 40).unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn lra_ignores_reads_when_choosing_a_victim() {
        let cache = cache("LRA", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 1, 40).unwrap();
        cache.get("a").unwrap();
        cache.put_with_charge("c", 1, 40).unwrap();

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn lfu_evicts_by_lowest_frequency_then_oldest_timestamp() {
        let cache = cache("LFU", 120);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 1, 40).unwrap();
        cache.put_with_charge("c", 1, 40).unwrap();

        cache.get("a").unwrap();
        cache.get("b").unwrap();
        // a: freq 2, b: freq 2, c: freq 1 -> c is the lowest.
        cache.put_with_charge("d", 1, 40).unwrap();
        assert!(!cache.contains("c"));
        assert!(cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("d"));

        cache.get("a").unwrap();
        cache.get("a").unwrap();
        // a: freq 4, b: freq 2, d: freq 1 -> d is the lowest, not b.
        cache.put_with_charge("e", 1, 40).unwrap();
        assert!(!cache.contains("d"));
        assert!(cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("e"));
    }

    #[test]
    fn put_rejects_a_value_that_alone_exceeds_the_limit() {
        let cache = cache("LRU", 10);
        let result = cache.put_with_charge("huge", 1, 10_000);
        assert!(matches!(result, Err(CacheError::CapacityExceeded { .. })));
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage_bytes(), 0);
    }

    #[test]
    fn get_on_a_missing_id_is_not_found() {
        let cache = cache("LRU", 100);
        assert!(matches!(cache.get("absent"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn update_on_a_missing_id_is_not_found() {
        let cache = cache("LRU", 100);
        assert!(matches!(cache.update("absent", 1), Err(CacheError::NotFound(_))));
        assert!(!cache.contains("absent"));
    }

    #[test]
    fn delete_on_a_missing_id_is_not_found() {
        let cache = cache("LRU", 100);
        assert!(matches!(cache.delete("absent"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn contains_does_not_count_as_an_access() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 1, 40).unwrap();
        assert!(cache.contains("a"));
        cache.put_with_charge("c", 1, 40).unwrap();
        // `a` was only ever `contains`-checked, never `get`; it must still
        // be the victim ahead of `b`.
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
    }

    #[test]
    fn update_replaces_the_value_and_recomputes_the_charge() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 2, 40).unwrap();
        cache.update("a", 99).unwrap();
        assert_eq!(cache.get("a").unwrap(), 99);
    }

    #[test]
    fn clear_empties_the_cache_but_preserves_the_counter() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 2, 40).unwrap();
        let ticks_before = cache.monotonic_counter();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage_bytes(), 0);
        assert!(cache.monotonic_counter() >= ticks_before);
    }

    #[test]
    fn overview_and_identifiers_reflect_current_contents() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("b", 2, 25).unwrap();

        let overview = cache.overview();
        assert_eq!(overview.get("a"), Some(&40));
        assert_eq!(overview.get("b"), Some(&25));

        let mut ids = cache.identifiers();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn memory_usage_fraction_and_megabytes_are_consistent() {
        let cache = cache("LRU", 1_048_576);
        cache.put_with_charge("a", 1, 524_288).unwrap();
        assert!((cache.memory_usage_fraction() - 0.5).abs() < 1e-9);
        assert!((cache.memory_usage_megabytes() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn monotonic_counter_strictly_increases_across_mutations() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 10).unwrap();
        let after_put = cache.monotonic_counter();
        cache.get("a").unwrap();
        let after_get = cache.monotonic_counter();
        assert!(after_get > after_put);
    }

    #[test]
    fn replacing_an_existing_id_does_not_double_charge() {
        let cache = cache("LRU", 100);
        cache.put_with_charge("a", 1, 40).unwrap();
        cache.put_with_charge("a", 2, 50).unwrap();
        assert_eq!(cache.memory_usage_bytes(), 50);
        assert_eq!(cache.len(), 1);
    }
}

