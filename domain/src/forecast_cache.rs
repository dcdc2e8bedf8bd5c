//! A small time-expiring cache of upstream forecasts keyed by coordinates.
//!
//! Entries live in insertion order. Lookups scan front to back and return the
//! first entry whose key matches; inserts evict from the front once the cache
//! is full, whether or not the evicted entry has expired. Expired entries are
//! only dropped when a lookup runs into them.
//!
//! Adding coordinates that are already cached appends a second entry instead
//! of replacing the first. Lookups keep returning the older entry until it
//! expires or is evicted.

use log::*;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default number of cached forecasts.
pub const DEFAULT_MAX_SIZE: usize = 5;

/// Default time a forecast stays valid after insertion.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry<T> {
    key: String,
    payload: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

pub struct ForecastCache<T> {
    max_size: usize,
    ttl: Duration,
    entries: Mutex<VecDeque<CacheEntry<T>>>,
}

impl<T: Clone> ForecastCache<T> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            max_size,
            ttl,
            entries: Mutex::new(VecDeque::with_capacity(max_size)),
        }
    }

    /// Returns the payload cached for `lat`/`lon`, or `None` on a miss.
    ///
    /// An expired match is removed and reported as a miss.
    pub fn get(&self, lat: &str, lon: &str) -> Option<T> {
        let key = cache_key(lat, lon);
        let mut entries = self.lock();

        let position = entries.iter().position(|entry| entry.key == key)?;
        if entries[position].is_expired(Instant::now()) {
            trace!("Forecast for {key} expired");
            entries.remove(position);
            return None;
        }

        Some(entries[position].payload.clone())
    }

    /// Caches `payload` for `lat`/`lon`, evicting the oldest entry when full.
    pub fn add(&self, lat: &str, lon: &str, payload: T) {
        if self.max_size == 0 {
            return;
        }

        let mut entries = self.lock();
        while entries.len() >= self.max_size {
            if let Some(evicted) = entries.pop_front() {
                trace!("Evicting cached forecast for {}", evicted.key);
            }
        }

        entries.push_back(CacheEntry {
            key: cache_key(lat, lon),
            payload,
            expires_at: Instant::now() + self.ttl,
        });
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // No operation can leave the deque half-modified, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, VecDeque<CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for ForecastCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}

fn cache_key(lat: &str, lon: &str) -> String {
    format!("{lat};{lon}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn returns_cached_payload_for_matching_coordinates() {
        let cache = ForecastCache::default();
        cache.add("10", "10", "sunny");

        assert_eq!(cache.get("10", "10"), Some("sunny"));
        assert_eq!(cache.get("10", "20"), None);
    }

    #[test]
    fn miss_leaves_the_buffer_untouched() {
        let cache = ForecastCache::default();
        cache.add("10", "10", 1);
        cache.add("20", "20", 2);

        assert_eq!(cache.get("30", "30"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entry_is_removed_on_lookup() {
        let cache = ForecastCache::new(DEFAULT_MAX_SIZE, Duration::ZERO);
        cache.add("10", "10", "stale");
        cache.add("20", "20", "also stale");
        sleep(Duration::from_millis(5));

        assert_eq!(cache.get("10", "10"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reads_do_not_extend_the_ttl() {
        let cache = ForecastCache::new(DEFAULT_MAX_SIZE, Duration::from_millis(50));
        cache.add("10", "10", "cloudy");

        sleep(Duration::from_millis(30));
        assert_eq!(cache.get("10", "10"), Some("cloudy"));

        sleep(Duration::from_millis(30));
        assert_eq!(cache.get("10", "10"), None);
    }

    #[test]
    fn full_cache_evicts_the_oldest_entry_first() {
        let cache = ForecastCache::new(5, DEFAULT_TTL);
        for i in 1..=6 {
            cache.add(&i.to_string(), "0", i);
            assert!(cache.len() <= 5);
        }

        assert_eq!(cache.len(), 5);
        assert_eq!(cache.get("1", "0"), None);
        for i in 2..=6 {
            assert_eq!(cache.get(&i.to_string(), "0"), Some(i));
        }
    }

    #[test]
    fn eviction_ignores_expiry_and_recency() {
        let cache = ForecastCache::new(2, DEFAULT_TTL);
        cache.add("a", "0", 'a');
        cache.add("b", "0", 'b');

        // Reading "a" does not protect it from being the next eviction.
        assert_eq!(cache.get("a", "0"), Some('a'));
        cache.add("c", "0", 'c');

        assert_eq!(cache.get("a", "0"), None);
        assert_eq!(cache.get("b", "0"), Some('b'));
        assert_eq!(cache.get("c", "0"), Some('c'));
    }

    #[test]
    fn repeated_add_keeps_the_first_entry_visible() {
        let cache = ForecastCache::new(3, DEFAULT_TTL);
        cache.add("10", "10", "first");
        cache.add("10", "10", "second");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("10", "10"), Some("first"));

        // Once the first copy is evicted the shadowed one shows up.
        cache.add("20", "20", "other");
        cache.add("30", "30", "another");
        assert_eq!(cache.get("10", "10"), Some("second"));
    }

    #[test]
    fn key_is_the_joined_coordinate_string() {
        let cache = ForecastCache::default();
        cache.add("1;2", "3", "joined");

        // "1;2" + ";" + "3" and "1" + ";" + "2;3" produce the same key.
        assert_eq!(cache.get("1", "2;3"), Some("joined"));
    }

    #[test]
    fn zero_capacity_caches_nothing() {
        let cache = ForecastCache::new(0, DEFAULT_TTL);
        cache.add("10", "10", 1);

        assert!(cache.is_empty());
        assert_eq!(cache.get("10", "10"), None);
    }
}
