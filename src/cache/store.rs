// src/cache/store.rs

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::fs::FileSystem;

/// Abstract storage for optimised image bytes, keyed by cache key.
pub trait CacheStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
    /// Drop every entry; returns how many were removed.
    fn clear(&mut self) -> Result<usize>;
    /// Drop every entry whose key is not in `keep`; returns how many went.
    fn retain(&mut self, keep: &HashSet<String>) -> Result<usize>;
}

/// One file per entry under a cache directory: `<dir>/<key>.bin`.
///
/// Survives process restarts.
pub struct FileCacheStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(fs: Arc<dyn FileSystem>, dir: PathBuf) -> Self {
        Self { fs, dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.bin"))
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        if !self.fs.is_file(&path) {
            return Ok(None);
        }
        let bytes = self
            .fs
            .read(&path)
            .with_context(|| format!("reading cache entry {:?}", path))?;
        Ok(Some(bytes))
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        self.fs
            .write(&path, bytes)
            .with_context(|| format!("writing cache entry {:?}", path))?;
        debug!(key = %key, bytes = bytes.len(), "stored image cache entry (file)");
        Ok(())
    }

    fn clear(&mut self) -> Result<usize> {
        if !self.fs.is_dir(&self.dir) {
            return Ok(0);
        }
        let removed = self
            .fs
            .remove_dir_contents(&self.dir)
            .with_context(|| format!("clearing cache directory {:?}", self.dir))?;
        info!(removed, dir = %self.dir.display(), "cleared image cache (file)");
        Ok(removed)
    }

    fn retain(&mut self, keep: &HashSet<String>) -> Result<usize> {
        if !self.fs.is_dir(&self.dir) {
            return Ok(0);
        }
        let mut removed = 0;
        for path in self.fs.read_dir(&self.dir)? {
            let stale = path.extension().is_some_and(|ext| ext == "bin")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|key| !keep.contains(key));
            if stale && self.fs.is_file(&path) {
                self.fs
                    .remove_file(&path)
                    .with_context(|| format!("pruning cache entry {:?}", path))?;
                removed += 1;
            }
        }
        debug!(removed, kept = keep.len(), "pruned image cache (file)");
        Ok(removed)
    }
}

/// Stores entries in memory only.
#[derive(Default)]
pub struct MemoryCacheStore {
    map: HashMap<String, Vec<u8>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.map.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.map.len();
        self.map.clear();
        info!(removed, "cleared image cache (memory)");
        Ok(removed)
    }

    fn retain(&mut self, keep: &HashSet<String>) -> Result<usize> {
        let before = self.map.len();
        self.map.retain(|key, _| keep.contains(key));
        Ok(before - self.map.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn file_store_round_trips_and_clears() {
        let fs = MockFileSystem::new();
        let mut store = FileCacheStore::new(Arc::new(fs.clone()), PathBuf::from("site/.cache"));

        assert_eq!(store.load("k1").unwrap(), None);
        store.save("k1", b"optimised").unwrap();
        store.save("k2", b"other").unwrap();

        assert_eq!(store.load("k1").unwrap(), Some(b"optimised".to_vec()));
        assert!(fs.exists(std::path::Path::new("site/.cache/k1.bin")));

        assert_eq!(store.clear().unwrap(), 2);
        assert_eq!(store.load("k1").unwrap(), None);
    }

    #[test]
    fn file_store_retain_removes_only_unlisted_entries() {
        let fs = MockFileSystem::new();
        let mut store = FileCacheStore::new(Arc::new(fs.clone()), PathBuf::from("site/.cache"));
        store.save("live", b"a").unwrap();
        store.save("stale", b"b").unwrap();
        fs.add_file("site/.cache/notes.txt", b"not an entry".to_vec());

        let keep = HashSet::from(["live".to_string()]);
        assert_eq!(store.retain(&keep).unwrap(), 1);

        assert_eq!(store.load("live").unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.load("stale").unwrap(), None);
        assert!(fs.exists(std::path::Path::new("site/.cache/notes.txt")));
        assert_eq!(
            fs.read_dir(std::path::Path::new("site/.cache")).unwrap().len(),
            2
        );
    }

    #[test]
    fn clearing_a_missing_directory_is_a_no_op() {
        let mut store = FileCacheStore::new(Arc::new(MockFileSystem::new()), PathBuf::from("nope"));
        assert_eq!(store.clear().unwrap(), 0);
    }
}
