//! Cache configuration.

/// Default number of cached query keys.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Tuning knobs for [`CachedContainmentMap`](crate::CachedContainmentMap).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached query keys. `0` disables caching.
    pub capacity: usize,
}

impl CacheConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// A configuration that never caches; the map then behaves like the
    /// uncached one.
    pub fn disabled() -> Self {
        Self { capacity: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}
