//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    pub ttl: Option<Duration>,

    /// Evict the least recently used entry when full instead of
    /// moka's default TinyLFU admission.
    pub lru: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)),
            lru: false,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    /// Set time-to-live for cache entries.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    /// Switch eviction to least-recently-used.
    #[must_use]
    pub fn lru(mut self) -> Self {
        self.lru = true;
        self
    }

    /// Group metadata: 100 groups, 60 second TTL, LRU eviction.
    ///
    /// Role data goes stale quickly after promote/demote, so callers must
    /// still invalidate explicitly on membership changes.
    pub fn group_metadata() -> Self {
        Self::with_capacity(100).ttl(Duration::from_secs(60)).lru()
    }

    /// Per-chat settings flags checked on every inbound group message.
    pub fn chat_flags() -> Self {
        Self::with_capacity(5_000).ttl(Duration::from_secs(300))
    }
}
