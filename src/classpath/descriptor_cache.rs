//! Bounded LRU cache of materialized class descriptors
//!
//! Materializing a [`ClassDescriptor`] means re-reading the stored class
//! bytes and walking the supertype chain, so hot classes (`String`, `List`,
//! the class being edited) are kept here. Eviction only costs latency: a miss
//! is rebuilt from the index entries and yields an equal descriptor.
//!
//! # Thread Safety
//!
//! - `lru::LruCache` is wrapped in `parking_lot::RwLock`
//! - Writes are atomic per key; concurrent builders of the same class race
//!   harmlessly and the last insert wins

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;

use crate::metrics::metrics;
use crate::model::ClassDescriptor;

/// Default number of cached descriptors
pub const DEFAULT_CAPACITY: usize = 256;

/// Cache statistics for monitoring and debugging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Total number of cache lookups
    pub total_queries: u64,

    pub hits: u64,

    pub misses: u64,

    pub evictions: u64,

    /// Current cache size (number of entries)
    pub current_size: usize,

    pub max_capacity: usize,
}

impl CacheStats {
    /// Cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_queries as f64
        }
    }
}

#[derive(Debug)]
pub struct DescriptorCache {
    /// Keyed by fully-qualified class name
    cache: RwLock<LruCache<String, Arc<ClassDescriptor>>>,

    stats: RwLock<CacheStats>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of zero is treated as one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            stats: RwLock::new(CacheStats {
                max_capacity: capacity.get(),
                ..Default::default()
            }),
        }
    }

    /// Look up a descriptor, promoting it on hit
    pub fn get(&self, fqcn: &str) -> Option<Arc<ClassDescriptor>> {
        // `LruCache::get` reorders, so even lookups take the write lock
        let found = self.cache.write().get(fqcn).cloned();

        let mut stats = self.stats.write();
        stats.total_queries += 1;
        if found.is_some() {
            stats.hits += 1;
            metrics().record_descriptor_cache_hit();
        } else {
            stats.misses += 1;
            metrics().record_descriptor_cache_miss();
        }
        found
    }

    pub fn insert(&self, descriptor: Arc<ClassDescriptor>) {
        let key = descriptor.fqcn().to_string();
        let mut cache = self.cache.write();
        // `push` also hands back the old value when the key was already present
        let evicted = matches!(cache.push(key.clone(), descriptor), Some((old, _)) if old != key);

        let mut stats = self.stats.write();
        if evicted {
            stats.evictions += 1;
        }
        stats.current_size = cache.len();
    }

    /// Drop every cached descriptor; statistics other than size are kept
    pub fn clear(&self) {
        self.cache.write().clear();
        self.stats.write().current_size = 0;
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }
}

impl Default for DescriptorCache {
    fn default() -> Self {
        Self::new()
    }
}
