use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::utils::clock::Clock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    expires_at: DateTime<Utc>,
}

/// In-memory TTL cache shared by every in-flight request.
///
/// Expired entries are evicted lazily: a `get` or `has` that finds one removes it and
/// reports a miss. There is no background sweep and no capacity bound; the key space is one
/// entry per external identity.
pub struct ResponseCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Store `value` until `now + ttl`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.clone(),
            CacheEntry {
                payload: value,
                expires_at,
            },
        );
        debug!(target: "app::heatmap::cache", cache_key = %key, %expires_at, "cached response");
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return None,
                Some(entry) if now < entry.expires_at => {
                    debug!(target: "app::heatmap::cache", cache_key = %key, "cache hit");
                    return Some(entry.payload.clone());
                }
                Some(_) => {}
            }
        }

        self.evict_if_expired(key, now);
        None
    }

    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return false,
                Some(entry) if now < entry.expires_at => return true,
                Some(_) => {}
            }
        }

        self.evict_if_expired(key, now);
        false
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key).is_some()
    }

    /// Drop every entry; returns how many were held.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let cleared = entries.len();
        entries.clear();
        if cleared > 0 {
            debug!(target: "app::heatmap::cache", cleared, "cleared response cache");
        }
        cleared
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_if_expired(&self, key: &str, now: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent `set` may have refreshed the entry between the two locks.
        let expired = entries
            .get(key)
            .map(|entry| now >= entry.expires_at)
            .unwrap_or(false);
        if expired {
            entries.remove(key);
            debug!(target: "app::heatmap::cache", cache_key = %key, "evicted expired entry");
        }
    }
}
