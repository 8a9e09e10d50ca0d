//! Per-resolver resolution cache.
//!
//! Keyed by the trimmed geohash string. Entries are never evicted: coverage
//! metrics are fixed for the life of a resolver, so a cached resolution can
//! not go stale within it.

use hashbrown::HashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::models::GeographyResolution;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
pub struct ResolverCache {
    entries: RwLock<HashMap<String, GeographyResolution>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe the cache, counting a hit or a miss.
    pub fn get(&self, key: &str) -> Option<GeographyResolution> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a resolution. Racing writers for one key hold equal values, so
    /// last write wins.
    pub fn put(&self, key: &str, resolution: GeographyResolution) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), resolution);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeographyScope;

    fn global(hash: &str) -> GeographyResolution {
        GeographyResolution {
            scope: GeographyScope::Global,
            source_geohash: Some(hash.to_string()),
            geocoded_ratio: None,
            weather_coverage: None,
            fallback_reason: None,
        }
    }

    #[test]
    fn test_get_put_counts() {
        let cache = ResolverCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("9q5").is_none());
        cache.put("9q5", global("9q5"));
        assert!(!cache.is_empty());
        assert_eq!(cache.get("9q5"), Some(global("9q5")));

        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_put_same_key_keeps_one_entry() {
        let cache = ResolverCache::new();
        cache.put("dr5", global("dr5"));
        cache.put("dr5", global("dr5"));
        assert_eq!(cache.len(), 1);
    }
}
