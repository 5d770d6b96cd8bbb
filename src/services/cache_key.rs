use chrono::Duration;

use crate::models::activity::ActivitySource;

/// Which copy of a source's payload a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSlot {
    /// Served directly while its TTL lasts.
    Fresh,
    /// Long-lived copy kept only for answering failed upstream fetches.
    Fallback,
}

/// Unique cache identity constructed from source + external identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCacheKey {
    source: ActivitySource,
    identity: String,
    slot: CacheSlot,
}

impl ResponseCacheKey {
    pub fn fresh(source: ActivitySource, identity: impl Into<String>) -> Self {
        Self {
            source,
            identity: identity.into(),
            slot: CacheSlot::Fresh,
        }
    }

    pub fn fallback(source: ActivitySource, identity: impl Into<String>) -> Self {
        Self {
            source,
            identity: identity.into(),
            slot: CacheSlot::Fallback,
        }
    }

    /// `github:octocat` for fresh payloads, `fallback:github:octocat` for fallback copies.
    pub fn cache_key(&self) -> String {
        match self.slot {
            CacheSlot::Fresh => format!("{}:{}", self.source.as_str(), self.identity),
            CacheSlot::Fallback => format!("fallback:{}:{}", self.source.as_str(), self.identity),
        }
    }

    /// How long this key's payload stays valid. Only remote sources are cached;
    /// LeetCode's calendar changes slowly enough to keep twice as long.
    pub fn ttl(&self) -> Duration {
        match (self.slot, self.source) {
            (CacheSlot::Fallback, _) => Duration::hours(24),
            (CacheSlot::Fresh, ActivitySource::LeetCode) => Duration::hours(2),
            (CacheSlot::Fresh, _) => Duration::hours(1),
        }
    }
}
