//! An expiring key/value cache for callers that memoize derived views.
//!
//! Nothing in the aggregator caches on its own. A caller that re-renders the
//! same snapshot often can own a [TtlCache] and key it by whatever identifies
//! the snapshot and parameters.

use std::{hash::Hash, time::Duration};

/// How long entries live by default.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// How many entries are kept by default before the least used are evicted.
pub const DEFAULT_MAX_CAPACITY: u64 = 1_000;

/// The operations a memoizing caller needs from a cache.
pub trait Cache<K, V> {
    /// Get a copy of the value stored under `key` if it has not expired.
    fn get(&self, key: &K) -> Option<V>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: K, value: V);

    /// Remove the value stored under `key`.
    fn invalidate(&self, key: &K);

    /// Remove every stored value.
    fn invalidate_all(&self);
}

/// A [Cache] whose entries expire a fixed time after they were stored.
///
/// Expired entries are removed in the background, and the number of entries
/// is capped so that a long running caller does not grow without bound.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: moka::sync::Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty cache whose entries live for `ttl`, holding at most
    /// [DEFAULT_MAX_CAPACITY] entries.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_CAPACITY)
    }

    /// Create an empty cache whose entries live for `ttl`, holding at most
    /// `max_capacity` entries.
    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        let entries = moka::sync::Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .eviction_listener(|_key, _value, cause| {
                tracing::debug!("removed cache entry: {cause:?}");
            })
            .build();

        Self { ttl, entries }
    }

    /// How long entries live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The approximate number of stored entries.
    ///
    /// Removals are applied lazily, call [TtlCache::run_pending_tasks] first
    /// for an up to date count.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Apply pending removals and evictions now.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<K, V> Cache<K, V> for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key)
    }

    fn set(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    fn invalidate(&self, key: &K) {
        self.entries.invalidate(key);
    }

    fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::{Cache, DEFAULT_TTL, TtlCache};

    const SHORT_TTL: Duration = Duration::from_millis(50);

    fn get_or_compute(
        cache: &impl Cache<String, u32>,
        key: &str,
        compute: impl Fn() -> u32,
    ) -> u32 {
        let key = key.to_owned();
        if let Some(value) = cache.get(&key) {
            return value;
        }

        let value = compute();
        cache.set(key, value);
        value
    }

    #[test]
    fn returns_fresh_entries() {
        let cache = TtlCache::new(DEFAULT_TTL);

        cache.set("weekly".to_owned(), 42);

        assert_eq!(cache.get(&"weekly".to_owned()), Some(42));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = TtlCache::new(SHORT_TTL);
        cache.set("weekly".to_owned(), 42);

        thread::sleep(SHORT_TTL * 2);

        assert_eq!(cache.get(&"weekly".to_owned()), None);
    }

    #[test]
    fn expired_entries_are_removed_without_being_read() {
        let cache = TtlCache::new(SHORT_TTL);
        for key in 0..100 {
            cache.set(key, key);
        }

        thread::sleep(SHORT_TTL * 2);
        cache.set(1_000, 1_000);
        cache.run_pending_tasks();

        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn entry_count_is_capped() {
        let cache = TtlCache::with_capacity(DEFAULT_TTL, 10);
        for key in 0..100 {
            cache.set(key, key);
        }

        cache.run_pending_tasks();

        assert!(cache.entry_count() <= 10, "{} entries", cache.entry_count());
    }

    #[test]
    fn set_replaces_value() {
        let cache = TtlCache::default();
        cache.set("weekly".to_owned(), 1);
        cache.set("weekly".to_owned(), 2);

        assert_eq!(cache.get(&"weekly".to_owned()), Some(2));
    }

    #[test]
    fn invalidate_removes_one_entry() {
        let cache = TtlCache::default();
        cache.set("weekly".to_owned(), 1);
        cache.set("dashboard".to_owned(), 2);

        cache.invalidate(&"weekly".to_owned());

        assert_eq!(cache.get(&"weekly".to_owned()), None);
        assert_eq!(cache.get(&"dashboard".to_owned()), Some(2));
    }

    #[test]
    fn invalidate_all_empties_cache() {
        let cache = TtlCache::default();
        cache.set(1, "a");
        cache.set(2, "b");

        cache.invalidate_all();

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.ttl(), DEFAULT_TTL);
    }

    #[test]
    fn computes_once_until_invalidated() {
        let cache = TtlCache::default();
        let calls = std::cell::Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            7
        };

        assert_eq!(get_or_compute(&cache, "weekly", compute), 7);
        assert_eq!(get_or_compute(&cache, "weekly", compute), 7);
        assert_eq!(calls.get(), 1);

        cache.invalidate_all();

        assert_eq!(get_or_compute(&cache, "weekly", compute), 7);
        assert_eq!(calls.get(), 2);
    }
}
