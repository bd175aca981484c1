//! Decoded image cache.
//!
//! Caches decoded images by asset path so repeated renders of unchanged
//! layers skip fetching and decoding. Entries are never evicted; failed
//! loads are not cached, so a later render retries them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use image::RgbaImage;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Total decoded bytes inserted.
    pub bytes_loaded: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Arc<RgbaImage>>,
    stats: CacheStats,
}

/// Thread-safe, append-only image cache. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    inner: Arc<RwLock<Inner>>,
}

impl ImageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an image, counting a hit or miss.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Arc<RgbaImage>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let found = inner.entries.get(path).cloned();
        if found.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        found
    }

    /// Insert a decoded image. An existing entry for the path is kept.
    pub fn insert(&self, path: String, image: RgbaImage) -> Arc<RgbaImage> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = inner.entries.get(&path) {
            return Arc::clone(existing);
        }
        inner.stats.bytes_loaded += image.as_raw().len() as u64;
        let image = Arc::new(image);
        inner.entries.insert(path, Arc::clone(&image));
        image
    }

    /// Check if a path is cached.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(path)
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clear();
    }

    /// Snapshot of the statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::solid_color;

    #[test]
    fn test_cache_insert_and_get() {
        let cache = ImageCache::new();
        cache.insert("hat/cap.png".to_string(), solid_color(10, 10, [255, 0, 0, 255]));

        assert!(cache.contains("hat/cap.png"));
        assert_eq!(cache.len(), 1);
        let image = cache.get("hat/cap.png").expect("cached");
        assert_eq!(image.width(), 10);
    }

    #[test]
    fn test_cache_stats() {
        let cache = ImageCache::new();
        cache.insert("a".to_string(), solid_color(2, 2, [0, 0, 0, 255]));

        let _ = cache.get("a");
        let _ = cache.get("b");
        let _ = cache.get("a");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.bytes_loaded, 16);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ImageCache::new();
        cache.insert("a".to_string(), solid_color(5, 5, [1, 1, 1, 255]));
        let kept = cache.insert("a".to_string(), solid_color(9, 9, [2, 2, 2, 255]));
        assert_eq!(kept.width(), 5);
        assert_eq!(cache.stats().bytes_loaded, 100);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = ImageCache::new();
        let shared = cache.clone();
        shared.insert("a".to_string(), solid_color(1, 1, [0, 0, 0, 0]));
        assert!(cache.contains("a"));
        cache.clear();
        assert!(shared.is_empty());
    }
}
