//! Bounded LRU cache of parsed YAML files.
//!
//! Entries are keyed by path and stamped with the file's modification time
//! and length; a stamp mismatch is treated as a miss and the file is read
//! again.

use crate::error::{InitError, InitResult};
use crate::paths;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::trace;

/// Default number of cached documents.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

#[derive(Debug)]
struct Entry {
    stamp: Stamp,
    value: Value,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<PathBuf, Entry>,
    /// Least recently used at the front.
    order: VecDeque<PathBuf>,
    hits: u64,
    misses: u64,
}

impl Inner {
    fn touch(&mut self, path: &Path) {
        if let Some(pos) = self.order.iter().position(|p| p == path) {
            if let Some(p) = self.order.remove(pos) {
                self.order.push_back(p);
            }
        }
    }
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

/// Path-keyed LRU of parsed YAML documents, shared across concurrent reads.
#[derive(Debug)]
pub struct FileCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl FileCache {
    /// A capacity of zero disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            len: inner.entries.len(),
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Read and parse `path`, serving an unchanged file from the cache.
    pub async fn read_yaml(&self, path: &Path) -> InitResult<Value> {
        if self.capacity == 0 {
            return paths::read_yaml(path).await;
        }

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| InitError::file_not_found(path, e))?;
        let stamp = Stamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        };

        if let Some(value) = self.get(path, stamp) {
            trace!(path = %paths::to_forward_slashes(path), "yaml cache hit");
            return Ok(value);
        }

        let value = paths::read_yaml(path).await?;
        self.insert(path.to_path_buf(), stamp, value.clone());
        Ok(value)
    }

    fn get(&self, path: &Path, stamp: Stamp) -> Option<Value> {
        let mut inner = self.inner.lock();
        let fresh = inner
            .entries
            .get(path)
            .filter(|entry| entry.stamp == stamp)
            .map(|entry| entry.value.clone());
        match fresh {
            Some(value) => {
                inner.hits += 1;
                inner.touch(path);
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    fn insert(&self, path: PathBuf, stamp: Stamp, value: Value) {
        let mut inner = self.inner.lock();
        if inner.entries.insert(path.clone(), Entry { stamp, value }).is_some() {
            inner.touch(&path);
            return;
        }
        inner.order.push_back(path);
        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(evicted) => {
                    inner.entries.remove(&evicted);
                }
                None => break,
            }
        }
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_second_read_hits() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.yml");
        std::fs::write(&file, "color: red").unwrap();

        let cache = FileCache::new(4);
        let first = cache.read_yaml(&file).await.unwrap();
        let second = cache.read_yaml(&file).await.unwrap();
        assert_eq!(first, second);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.len, 1);
    }

    #[tokio::test]
    async fn test_changed_file_is_reread() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.yml");
        std::fs::write(&file, "color: red").unwrap();

        let cache = FileCache::new(4);
        cache.read_yaml(&file).await.unwrap();
        // Different length, so the stamp changes even within one mtime tick.
        std::fs::write(&file, "color: green\nshade: dark\n").unwrap();

        let value = cache.read_yaml(&file).await.unwrap();
        assert_eq!(value["color"], "green");
        assert_eq!(cache.stats().len, 1);
    }

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let temp = TempDir::new().unwrap();
        let paths: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let p = temp.path().join(format!("{}.yml", name));
                std::fs::write(&p, format!("name: {}", name)).unwrap();
                p
            })
            .collect();

        let cache = FileCache::new(2);
        cache.read_yaml(&paths[0]).await.unwrap();
        cache.read_yaml(&paths[1]).await.unwrap();
        // Touch `a` so `b` becomes the eviction candidate.
        cache.read_yaml(&paths[0]).await.unwrap();
        cache.read_yaml(&paths[2]).await.unwrap();
        assert_eq!(cache.stats().len, 2);

        let before = cache.stats().hits;
        cache.read_yaml(&paths[0]).await.unwrap();
        assert_eq!(cache.stats().hits, before + 1);
        cache.read_yaml(&paths[1]).await.unwrap();
        assert_eq!(cache.stats().hits, before + 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_bypasses() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.yml");
        std::fs::write(&file, "x: 1").unwrap();

        let cache = FileCache::new(0);
        cache.read_yaml(&file).await.unwrap();
        cache.read_yaml(&file).await.unwrap();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_clear_drops_entries_but_keeps_counters() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.yml");
        std::fs::write(&file, "x: 1").unwrap();

        let cache = FileCache::new(4);
        cache.read_yaml(&file).await.unwrap();
        cache.read_yaml(&file).await.unwrap();
        cache.clear();
        assert_eq!(cache.stats().len, 0);

        cache.read_yaml(&file).await.unwrap();
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.len), (1, 2, 1));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_cached() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::new(4);
        let err = cache
            .read_yaml(&temp.path().join("missing.yml"))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::FileNotFound);
        assert_eq!(cache.stats().len, 0);
    }
}
