// src/cache/mod.rs

//! Content-addressed cache of optimised images.
//!
//! Keys come from [`fingerprint::cache_key`]; bytes live in a [`CacheStore`].
//! The cache never changes what a stage writes: a hit returns exactly what
//! the optimiser produced for the same key. Store failures are logged and
//! treated as misses.
//!
//! A full image run brackets its lookups with [`ImageCache::begin_sweep`] and
//! [`ImageCache::prune_untouched`], so entries for deleted or changed images
//! do not pile up.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::fs::FileSystem;

pub mod fingerprint;
pub mod store;

pub use fingerprint::{cache_key, content_hash};
pub use store::{CacheStore, FileCacheStore, MemoryCacheStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct ImageCache {
    store: Mutex<Box<dyn CacheStore>>,
    /// Keys looked up since the last `begin_sweep`.
    touched: Mutex<HashSet<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ImageCache {
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self {
            store: Mutex::new(store),
            touched: Mutex::new(HashSet::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache persisted under `dir`.
    pub fn persistent(fs: Arc<dyn FileSystem>, dir: PathBuf) -> Self {
        Self::new(Box::new(FileCacheStore::new(fs, dir)))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCacheStore::new()))
    }

    /// Return the stored result for this input, or run `compute` and store it.
    ///
    /// Errors from `compute` are returned and nothing is stored.
    pub fn get_or_compute<F>(&self, rel_path: &str, input: &[u8], params: &str, compute: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>>,
    {
        let key = cache_key(rel_path, &content_hash(input), params);
        self.touch(&key);

        match self.load(&key) {
            Ok(Some(bytes)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(image = %rel_path, "image cache hit");
                return Ok(bytes);
            }
            Ok(None) => {}
            Err(e) => warn!(image = %rel_path, error = %e, "image cache lookup failed; recomputing"),
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(image = %rel_path, "image cache miss");
        let output = compute(input)?;

        if let Err(e) = self.save(&key, &output) {
            warn!(image = %rel_path, error = %e, "failed to store image cache entry");
        }
        Ok(output)
    }

    /// Remove every entry. Afterwards the next request for any key misses.
    pub fn clear_all(&self) -> Result<usize> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow!("image cache store lock poisoned"))?;
        store.clear()
    }

    /// Start tracking which keys a full run uses.
    pub fn begin_sweep(&self) {
        self.touched_keys().clear();
    }

    /// Remove every stored entry not looked up since [`Self::begin_sweep`].
    pub fn prune_untouched(&self) -> Result<usize> {
        let keep = std::mem::take(&mut *self.touched_keys());
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow!("image cache store lock poisoned"))?;
        store.retain(&keep)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn touched_keys(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.touched.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(&self, key: &str) {
        self.touched_keys().insert(key.to_string());
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self
            .store
            .lock()
            .map_err(|_| anyhow!("image cache store lock poisoned"))?;
        store.load(key)
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow!("image cache store lock poisoned"))?;
        store.save(key, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn second_request_is_a_hit() {
        let cache = ImageCache::in_memory();
        let calls = Cell::new(0);
        let compute = |input: &[u8]| {
            calls.set(calls.get() + 1);
            Ok(input.iter().rev().copied().collect())
        };

        let first = cache.get_or_compute("src/img/a.png", b"abc", "v1", compute).unwrap();
        let second = cache.get_or_compute("src/img/a.png", b"abc", "v1", compute).unwrap();

        assert_eq!(first, b"cba".to_vec());
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn changed_content_or_params_miss() {
        let cache = ImageCache::in_memory();
        let compute = |input: &[u8]| Ok(input.to_vec());

        cache.get_or_compute("a.png", b"one", "v1", compute).unwrap();
        cache.get_or_compute("a.png", b"two", "v1", compute).unwrap();
        cache.get_or_compute("a.png", b"two", "v2", compute).unwrap();

        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn clear_all_forces_recompute() {
        let cache = ImageCache::in_memory();
        let compute = |input: &[u8]| Ok(input.to_vec());

        cache.get_or_compute("a.png", b"one", "v1", compute).unwrap();
        assert_eq!(cache.clear_all().unwrap(), 1);
        cache.get_or_compute("a.png", b"one", "v1", compute).unwrap();

        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[test]
    fn prune_drops_entries_outside_the_sweep() {
        let cache = ImageCache::in_memory();
        let compute = |input: &[u8]| Ok(input.to_vec());

        cache.get_or_compute("a.png", b"old", "v1", compute).unwrap();
        cache.get_or_compute("b.png", b"b", "v1", compute).unwrap();

        cache.begin_sweep();
        cache.get_or_compute("a.png", b"new", "v1", compute).unwrap();
        cache.get_or_compute("b.png", b"b", "v1", compute).unwrap();
        assert_eq!(cache.prune_untouched().unwrap(), 1);

        cache.get_or_compute("a.png", b"new", "v1", compute).unwrap();
        cache.get_or_compute("b.png", b"b", "v1", compute).unwrap();
        cache.get_or_compute("a.png", b"old", "v1", compute).unwrap();
        assert_eq!(cache.stats(), CacheStats { hits: 3, misses: 4 });
    }

    #[test]
    fn failed_compute_stores_nothing() {
        let cache = ImageCache::in_memory();

        let err = cache.get_or_compute("a.png", b"x", "v1", |_| Err(anyhow!("corrupt")));
        assert!(err.is_err());

        let ok = cache.get_or_compute("a.png", b"x", "v1", |i| Ok(i.to_vec())).unwrap();
        assert_eq!(ok, b"x".to_vec());
        assert_eq!(cache.stats().misses, 2);
    }
}
