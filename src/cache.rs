//! In-memory TTL cache for provider responses
//!
//! Deduplicates identical requests issued within a short freshness window.
//! Values are stored as JSON so one cache instance can hold heterogeneous
//! response types. Entries expire by age only; there is no size bound and
//! no eviction beyond expiry-on-read and `clear()`.

use crate::clock::{Clock, SystemClock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct CacheEntry {
    value: Value,
    stored_at_millis: u64,
}

/// Time-bounded key/value cache shared by the API clients.
///
/// Constructed explicitly by whoever composes the clients and passed in,
/// so tests can inject a fresh instance and control the clock.
pub struct ApiCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ApiCache {
    /// Create a cache with the given TTL, using the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit time source.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses and expired entries; expired
    /// entries are evicted on read.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let entry = entries.get(key)?;
        let age_millis = self
            .clock
            .now_millis()
            .saturating_sub(entry.stored_at_millis);

        if age_millis >= self.ttl.as_millis() as u64 {
            tracing::debug!(key, "Cache entry expired");
            entries.remove(key);
            return None;
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                tracing::debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                // Stored under the same key with a different shape; treat as a miss.
                tracing::debug!(key, error = %e, "Cache entry failed to deserialize");
                entries.remove(key);
                None
            }
        }
    }

    /// Stores a value with the current timestamp, overwriting any prior
    /// entry for the key.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> crate::Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| crate::ApiError::malformed(format!("Failed to cache value: {e}")))?;

        let entry = CacheEntry {
            value,
            stored_at_millis: self.clock.now_millis(),
        };

        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    /// Removes all entries. Used for explicit cache-busting.
    pub fn clear(&self) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "Cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(60);

    fn cache_with_manual_clock() -> (ApiCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ApiCache::with_clock(TTL, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_put_then_get_returns_value() {
        let (cache, _clock) = cache_with_manual_clock();

        cache.put("k", &vec![1, 2, 3]).unwrap();
        assert_eq!(cache.get::<Vec<i32>>("k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_get_after_ttl_returns_none() {
        let (cache, clock) = cache_with_manual_clock();

        cache.put("k", &"fresh".to_string()).unwrap();
        clock.advance(TTL.as_millis() as u64);
        assert_eq!(cache.get::<String>("k"), None);
    }

    #[test]
    fn test_get_just_before_ttl_still_fresh() {
        let (cache, clock) = cache_with_manual_clock();

        cache.put("k", &42_u32).unwrap();
        clock.advance(TTL.as_millis() as u64 - 1);
        assert_eq!(cache.get::<u32>("k"), Some(42));
    }

    #[test]
    fn test_put_overwrites_previous_entry() {
        let (cache, _clock) = cache_with_manual_clock();

        cache.put("k", &1_u32).unwrap();
        cache.put("k", &2_u32).unwrap();
        assert_eq!(cache.get::<u32>("k"), Some(2));
    }

    #[test]
    fn test_clear_removes_all_entries() {
        let (cache, _clock) = cache_with_manual_clock();

        cache.put("a", &1_u32).unwrap();
        cache.put("b", &2_u32).unwrap();
        cache.clear();
        assert_eq!(cache.get::<u32>("a"), None);
        assert_eq!(cache.get::<u32>("b"), None);
    }

    #[test]
    fn test_missing_key_is_none() {
        let (cache, _clock) = cache_with_manual_clock();
        assert_eq!(cache.get::<u32>("nope"), None);
    }

    #[test]
    fn test_wrong_type_is_treated_as_miss() {
        let (cache, _clock) = cache_with_manual_clock();

        cache.put("k", &"not a number".to_string()).unwrap();
        assert_eq!(cache.get::<u32>("k"), None);
    }
}
