//! # Report Cache Module
//!
//! LRU cache for built reports, keyed by ledger version.
//!
//! Reports are pure functions of the ledger, so a cached report is
//! valid exactly as long as the ledger version it was built from. The
//! version is part of the cache key: after a mutation the old entries
//! simply stop matching and age out through LRU eviction.
//!
//! The cache uses a logical clock (a monotonic counter, never wall
//! time) for recency, and BTreeMap storage, so behavior is fully
//! deterministic.

use crate::ledger::{Ledger, MonthKey};
use crate::reports::{build_report, Report, ReportKind};
use std::collections::BTreeMap;

/// Default capacity of a report cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// How many entries one eviction pass removes.
pub const DEFAULT_EVICTION_BATCH: usize = 8;

// =============================================================================
// GENERIC LRU CACHE
// =============================================================================

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    last_access: u64,
}

/// Deterministic LRU cache over ordered keys.
#[derive(Debug)]
pub struct LruCache<K: Ord + Clone, V: Clone> {
    slots: BTreeMap<K, Slot<V>>,
    capacity: usize,
    eviction_batch: usize,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl<K: Ord + Clone, V: Clone> Default for LruCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl<K: Ord + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: BTreeMap::new(),
            capacity: capacity.max(1),
            eviction_batch: DEFAULT_EVICTION_BATCH,
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Override the eviction batch size.
    #[must_use]
    pub fn with_eviction_batch(mut self, batch: usize) -> Self {
        self.eviction_batch = batch.max(1);
        self
    }

    /// Fetch a value, marking it recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.clock = self.clock.saturating_add(1);
        let now = self.clock;
        match self.slots.get_mut(key) {
            Some(slot) => {
                slot.last_access = now;
                self.hits = self.hits.saturating_add(1);
                Some(&slot.value)
            }
            None => {
                self.misses = self.misses.saturating_add(1);
                None
            }
        }
    }

    /// Read a value without touching recency or stats.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    /// Insert or replace a value, evicting stale entries if full.
    pub fn insert(&mut self, key: K, value: V) {
        self.clock = self.clock.saturating_add(1);
        let now = self.clock;

        if self.slots.len() >= self.capacity && !self.slots.contains_key(&key) {
            self.evict();
        }

        self.slots.insert(
            key,
            Slot {
                value,
                last_access: now,
            },
        );
    }

    /// Drop every entry. Stats and the clock carry on.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Whether the key is cached.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Cached keys in key order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }

    /// Hit and occupancy counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.slots.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            hit_rate_percent: self.hit_rate_percent(),
        }
    }

    /// Hit rate as an integer percentage, 0-100.
    #[must_use]
    pub fn hit_rate_percent(&self) -> u8 {
        let total = self.hits.saturating_add(self.misses);
        if total == 0 {
            return 0;
        }
        u8::try_from(self.hits.saturating_mul(100) / total).unwrap_or(100)
    }

    /// Remove the least recently used entries, one batch's worth.
    fn evict(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        let quota = self.eviction_batch.min(self.slots.len());

        // Oldest first; ties break on key order for determinism.
        let mut order: Vec<(u64, K)> = self
            .slots
            .iter()
            .map(|(key, slot)| (slot.last_access, key.clone()))
            .collect();
        order.sort_unstable();

        for (_, key) in order.into_iter().take(quota) {
            self.slots.remove(&key);
        }
    }
}

/// Counters describing cache behavior so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: u8,
}

// =============================================================================
// REPORT CACHE
// =============================================================================

/// Cache key for one built report.
///
/// The ledger version is part of the key, so entries built from an
/// older ledger can never be returned for a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportCacheKey {
    pub kind: ReportKind,
    pub month: MonthKey,
    pub version: u64,
}

/// LRU cache of built reports.
pub type ReportCache = LruCache<ReportCacheKey, Report>;

/// Create a report cache with the default capacity.
#[must_use]
pub fn report_cache() -> ReportCache {
    LruCache::new(DEFAULT_CACHE_CAPACITY)
}

/// Fetch a report from the cache, building and caching it on a miss.
pub fn cached_report(
    cache: &mut ReportCache,
    ledger: &Ledger,
    kind: ReportKind,
    month: MonthKey,
) -> Report {
    let key = ReportCacheKey {
        kind,
        month,
        version: ledger.version(),
    };
    if let Some(report) = cache.get(&key) {
        return report.clone();
    }
    let report = build_report(ledger, kind, month);
    cache.insert(key, report.clone());
    report
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ledger::AccountKind;
    use crate::money::Money;

    #[test]
    fn insert_and_get() {
        let mut cache = LruCache::new(8);
        cache.insert(1_u64, "a");
        cache.insert(2_u64, "b");

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), None);
    }

    #[test]
    fn eviction_drops_the_least_recently_used() {
        let mut cache = LruCache::new(3).with_eviction_batch(1);
        cache.insert(1_u64, "a");
        cache.insert(2_u64, "b");
        cache.insert(3_u64, "c");

        let _ = cache.get(&1);
        let _ = cache.get(&2);
        cache.insert(4_u64, "d");

        assert!(cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(!cache.contains(&3));
        assert!(cache.contains(&4));
    }

    #[test]
    fn replacing_a_key_does_not_grow_the_cache() {
        let mut cache = LruCache::new(8);
        cache.insert(1_u64, "old");
        cache.insert(1_u64, "new");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), Some(&"new"));
    }

    #[test]
    fn peek_leaves_stats_alone() {
        let mut cache = LruCache::new(8);
        cache.insert(1_u64, "a");
        let before = cache.stats();

        let _ = cache.peek(&1);
        let _ = cache.peek(&2);

        let after = cache.stats();
        assert_eq!(before.hits, after.hits);
        assert_eq!(before.misses, after.misses);
    }

    #[test]
    fn hit_rate_is_integer_percent() {
        let mut cache = LruCache::<u64, &str>::new(8);
        cache.insert(1, "a");
        let _ = cache.get(&1);
        let _ = cache.get(&2);
        let _ = cache.get(&1);
        let _ = cache.get(&3);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hit_rate_percent, 50);
    }

    #[test]
    fn keys_iterate_in_key_order() {
        let mut cache = LruCache::new(8);
        cache.insert(5_u64, "e");
        cache.insert(1_u64, "a");
        cache.insert(3_u64, "c");
        let keys: Vec<_> = cache.keys().copied().collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn cached_report_builds_once_per_version() {
        let mut ledger = Ledger::new();
        ledger
            .add_account("Checking", AccountKind::Checking, Money::from_cents(100))
            .unwrap();
        let month = MonthKey::new(2025, 6).unwrap();
        let mut cache = report_cache();

        let first = cached_report(&mut cache, &ledger, ReportKind::NetWorth, month);
        let second = cached_report(&mut cache, &ledger, ReportKind::NetWorth, month);
        assert_eq!(first, second);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn mutation_invalidates_through_the_version_key() {
        let mut ledger = Ledger::new();
        ledger
            .add_account("Checking", AccountKind::Checking, Money::from_cents(100))
            .unwrap();
        let month = MonthKey::new(2025, 6).unwrap();
        let mut cache = report_cache();

        let before = cached_report(&mut cache, &ledger, ReportKind::NetWorth, month);
        ledger
            .add_account("Savings", AccountKind::Savings, Money::from_cents(900))
            .unwrap();
        let after = cached_report(&mut cache, &ledger, ReportKind::NetWorth, month);

        assert_ne!(before, after);
        // Both versions sit in the cache under distinct keys.
        assert_eq!(cache.len(), 2);
    }
}
