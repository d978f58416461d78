//! Cache registry - Central management for all caches.

use std::any::TypeId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::typed::ErasedCache;
use super::{CacheConfig, TypedCache};

/// Central registry for named typed caches.
///
/// Repositories and the permission layer obtain their caches here so that
/// diagnostics (`eval cache`) can report on all of them in one place.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

struct CacheEntry {
    cache: Box<dyn ErasedCache>,
    type_id: TypeId,
    type_name: &'static str,
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing cache or create a new one if it doesn't exist.
    ///
    /// A name already registered with different key/value types is
    /// replaced by a fresh cache and the old one is dropped from the
    /// registry.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let expected = TypeId::of::<TypedCache<K, V>>();

        if let Some(entry) = self.caches.read().get(name)
            && entry.type_id == expected
            && let Some(cache) = entry.cache.as_any().downcast_ref::<TypedCache<K, V>>()
        {
            return cache.clone();
        }

        let mut caches = self.caches.write();

        // Another caller may have created it between the two locks.
        if let Some(entry) = caches.get(name) {
            if entry.type_id == expected
                && let Some(cache) = entry.cache.as_any().downcast_ref::<TypedCache<K, V>>()
            {
                return cache.clone();
            }
            warn!(
                "Cache '{}' re-registered with {} (was {})",
                name,
                std::any::type_name::<TypedCache<K, V>>(),
                entry.type_name
            );
        }

        debug!("Creating cache: {}", name);
        let cache = TypedCache::new(name, config);
        caches.insert(
            name.to_string(),
            CacheEntry {
                cache: Box::new(cache.clone()),
                type_id: expected,
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );

        cache
    }

    /// Entry counts for every registered cache, sorted by name.
    pub fn stats(&self) -> Vec<(String, u64)> {
        let caches = self.caches.read();
        let mut stats: Vec<_> = caches
            .iter()
            .map(|(name, entry)| (name.clone(), entry.cache.entry_count()))
            .collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        stats
    }

    /// Drop every entry from every cache.
    pub fn clear_all(&self) {
        for entry in self.caches.read().values() {
            entry.cache.invalidate_all();
        }
        debug!("Cleared all caches");
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}
