//! Bounded, disk-backed, content-addressed cache with byte-accounted LRU
//! eviction, grounded in the sharded-memory-accounting pattern used for the
//! in-memory store elsewhere in this codebase's lineage (a `Mutex`-guarded
//! `LruCache` paired with an atomic size counter).
//!
//! Bodies are stored one file per fingerprint under the cache directory.
//! Writes go to a `.tmp` file and are renamed into place, so a reader can
//! never observe a half-written body; the in-memory index, not the
//! directory listing, is the sole source of truth for "is this cached."

mod entry;

pub use entry::CacheEntry;
use entry::CacheMeta;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::CacheError;

pub struct Cache {
    dir: PathBuf,
    index: Mutex<LruCache<String, CacheMeta>>,
    total_size_bytes: AtomicU64,
    max_size_bytes: u64,
}

impl Cache {
    pub async fn new(dir: impl Into<PathBuf>, max_size_bytes: u64) -> Result<Self, CacheError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Self::sweep_orphaned_tmp_files(&dir).await;
        Ok(Self {
            dir,
            index: Mutex::new(LruCache::unbounded()),
            total_size_bytes: AtomicU64::new(0),
            max_size_bytes,
        })
    }

    /// Removes `.tmp` files left behind by a write that never reached its
    /// rename, e.g. a crash mid-`put`. The in-memory index never learned
    /// about them, so they are otherwise invisible and permanent.
    async fn sweep_orphaned_tmp_files(dir: &PathBuf) {
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "tmp") {
                let _ = tokio::fs::remove_file(&path).await;
            }
        }
    }

    fn body_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(fingerprint)
    }

    fn tmp_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.tmp"))
    }

    /// Probes presence without reading the body. Per this cache's design,
    /// promotes recency exactly like `get` — the index cannot cheaply tell
    /// the two apart without a second lock acquisition.
    pub async fn contains(&self, fingerprint: &str) -> bool {
        let mut index = self.index.lock().await;
        index.get(fingerprint).is_some()
    }

    /// Returns the full entry, reading its body from disk, or `None` if
    /// absent. A hit updates recency.
    pub async fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        let meta = {
            let mut index = self.index.lock().await;
            index.get(fingerprint)?.clone()
        };

        let body = tokio::fs::read(self.body_path(fingerprint)).await.ok()?;

        Some(CacheEntry {
            body: Bytes::from(body),
            content_type: meta.content_type,
            content_length: meta.content_length,
            last_modified: meta.last_modified,
        })
    }

    /// Durably associates `fingerprint` with `entry`, evicting LRU entries
    /// until the total resident size fits. An entry larger than the whole
    /// capacity is silently not admitted.
    pub async fn put(&self, fingerprint: &str, entry: CacheEntry) {
        let size = entry.body.len() as u64;
        if size > self.max_size_bytes {
            warn!(fingerprint, size, max = self.max_size_bytes, "entry exceeds cache capacity, not cached");
            return;
        }

        let tmp = self.tmp_path(fingerprint);
        if let Err(err) = tokio::fs::write(&tmp, &entry.body).await {
            warn!(fingerprint, %err, "failed to write cache body");
            return;
        }
        if let Err(err) = tokio::fs::rename(&tmp, self.body_path(fingerprint)).await {
            warn!(fingerprint, %err, "failed to publish cache body");
            let _ = tokio::fs::remove_file(&tmp).await;
            return;
        }

        let meta = CacheMeta {
            content_type: entry.content_type,
            content_length: entry.content_length,
            last_modified: entry.last_modified,
            size_bytes: size,
        };

        let evicted = {
            let mut index = self.index.lock().await;
            let old_size = index
                .put(fingerprint.to_string(), meta)
                .map(|old| old.size_bytes)
                .unwrap_or(0);
            self.total_size_bytes.fetch_add(size, Ordering::Relaxed);
            if old_size > 0 {
                self.total_size_bytes.fetch_sub(old_size, Ordering::Relaxed);
            }

            let mut evicted = Vec::new();
            while self.total_size_bytes.load(Ordering::Relaxed) > self.max_size_bytes {
                let Some((evicted_key, evicted_meta)) = index.pop_lru() else {
                    break;
                };
                self.total_size_bytes
                    .fetch_sub(evicted_meta.size_bytes, Ordering::Relaxed);
                evicted.push(evicted_key);
            }
            evicted
        };

        for key in evicted {
            let _ = tokio::fs::remove_file(self.body_path(&key)).await;
        }
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(body: &[u8]) -> CacheEntry {
        CacheEntry {
            body: Bytes::copy_from_slice(body),
            content_type: "image/jpeg".to_string(),
            content_length: Some(body.len().to_string()),
            last_modified: None,
        }
    }

    #[tokio::test]
    async fn miss_then_hit_round_trips_body() {
        let dir = tempdir();
        let cache = Cache::new(dir.clone(), 1024).await.unwrap();

        assert!(!cache.contains("abc").await);
        cache.put("abc", entry(b"hello")).await;
        assert!(cache.contains("abc").await);

        let got = cache.get("abc").await.unwrap();
        assert_eq!(got.body.as_ref(), b"hello");
        assert_eq!(got.content_type, "image/jpeg");

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn eviction_bounds_total_size() {
        let dir = tempdir();
        let cache = Cache::new(dir.clone(), 10).await.unwrap();

        cache.put("a", entry(b"0123456789")).await;
        assert!(cache.contains("a").await);

        cache.put("b", entry(b"9876543210")).await;
        assert!(cache.contains("b").await);
        assert!(!cache.contains("a").await, "oldest entry should be evicted");
        assert!(cache.total_size_bytes() <= 10);

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn oversized_entry_is_not_admitted() {
        let dir = tempdir();
        let cache = Cache::new(dir.clone(), 4).await.unwrap();

        cache.put("huge", entry(b"way too big")).await;
        assert!(!cache.contains("huge").await);

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    fn tempdir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "athome-cache-test-{:?}",
            std::thread::current().id()
        ));
        path
    }
}
