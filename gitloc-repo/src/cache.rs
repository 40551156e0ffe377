//! Result cache backends
//!
//! Both backends keep one entry per `owner/repo` key and never evict; the
//! service decides freshness with a [`CachePolicy`](gitloc_core::CachePolicy).

use async_trait::async_trait;
use gitloc_core::{
    storage_error, AnalysisResult, CacheEntry, ErrorContext, GitlocError, GitlocResult,
    ResultCache,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Process-local cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> GitlocResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put_entry(&self, key: &str, entry: CacheEntry) -> GitlocResult<()> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }
}

/// On-disk document: the entry plus the key it belongs to
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    result: AnalysisResult,
    timestamp: i64,
}

/// Durable cache storing one JSON document per key
pub struct FileCache {
    cache_dir: PathBuf,
}

impl FileCache {
    /// Create a FileCache with custom cache directory
    pub fn with_cache_dir<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", Self::generate_cache_key(key)))
    }

    /// File stem for a key. ASCII alphanumerics, `-` and `.` are kept; every
    /// other byte becomes `_` plus two hex digits, so distinct keys never share
    /// a file and names stay the same across builds.
    fn generate_cache_key(key: &str) -> String {
        let mut stem = String::with_capacity(key.len() + 8);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
                stem.push(byte as char);
            } else {
                stem.push_str(&format!("_{:02x}", byte));
            }
        }
        stem
    }
}

#[async_trait]
impl ResultCache for FileCache {
    async fn get(&self, key: &str) -> GitlocResult<Option<CacheEntry>> {
        let path = self.entry_path(key);
        if !fs::try_exists(&path).await? {
            debug!("No cached result for {}", key);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let stored: StoredEntry = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring unreadable cache file {:?}: {}", path, e);
                return Ok(None);
            }
        };

        if stored.key != key {
            warn!(
                "Cache file {:?} belongs to {}, not {}; ignoring",
                path, stored.key, key
            );
            return Ok(None);
        }

        Ok(Some(CacheEntry::new(stored.result, stored.timestamp)))
    }

    async fn put_entry(&self, key: &str, entry: CacheEntry) -> GitlocResult<()> {
        fs::create_dir_all(&self.cache_dir).await.map_err(|e| GitlocError::Storage {
            message: format!("Failed to create cache directory {:?}: {}", self.cache_dir, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("file_cache")
                .with_operation("put")
                .with_suggestion("Check that the cache directory is writable"),
        })?;

        let stored = StoredEntry {
            key: key.to_string(),
            result: entry.result,
            timestamp: entry.timestamp,
        };
        let json_content = serde_json::to_string_pretty(&stored)
            .map_err(|e| storage_error!("Failed to serialize cache entry", "file_cache", e))?;

        let path = self.entry_path(key);
        fs::write(&path, json_content).await?;

        info!("Cached result for {} -> {:?}", key, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitloc_core::CachePolicy;
    use tempfile::TempDir;

    fn sample_result(total_lines: u64) -> AnalysisResult {
        let mut result = AnalysisResult {
            total_lines,
            file_count: 1,
            skipped_files: 0,
            ..Default::default()
        };
        result.language_stats.insert("Rust".to_string(), total_lines);
        result
    }

    #[tokio::test]
    async fn test_memory_cache_overwrites() {
        let cache = MemoryCache::new();
        assert!(cache.get("o/r").await.unwrap().is_none());

        cache.put("o/r", &sample_result(10)).await.unwrap();
        cache.put("o/r", &sample_result(20)).await.unwrap();

        let entry = cache.get("o/r").await.unwrap().unwrap();
        assert_eq!(entry.result.total_lines, 20);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_entries_are_kept() {
        let cache = MemoryCache::new();
        cache
            .put_entry("o/r", CacheEntry::new(sample_result(1), 0))
            .await
            .unwrap();

        let entry = cache.get("o/r").await.unwrap().unwrap();
        assert!(!CachePolicy::default().is_fresh_now(&entry));
        assert!(!cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_file_cache_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_cache_dir(temp_dir.path().join("cache"));

        assert!(cache.get("o/r").await.unwrap().is_none());

        cache
            .put_entry("o/r", CacheEntry::new(sample_result(7), 1_700_000_000_000))
            .await
            .unwrap();

        let entry = cache.get("o/r").await.unwrap().unwrap();
        assert_eq!(entry.timestamp, 1_700_000_000_000);
        assert_eq!(entry.result, sample_result(7));

        assert!(cache.get("o/other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_cache_ignores_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_cache_dir(temp_dir.path());

        std::fs::write(cache.entry_path("o/r"), "{ not json").unwrap();
        assert!(cache.get("o/r").await.unwrap().is_none());

        cache.put("o/r", &sample_result(3)).await.unwrap();
        assert_eq!(
            cache.get("o/r").await.unwrap().unwrap().result.total_lines,
            3
        );
    }

    #[test]
    fn test_cache_key_generation() {
        assert_eq!(FileCache::generate_cache_key("o/r"), "o_2fr");
        assert_eq!(
            FileCache::generate_cache_key("rust-lang/rust.vim"),
            "rust-lang_2frust.vim"
        );

        // an underscore in a name must not collide with the separator
        assert_ne!(
            FileCache::generate_cache_key("o_r/x"),
            FileCache::generate_cache_key("o/r_x")
        );
        assert_ne!(
            FileCache::generate_cache_key("o_2fr"),
            FileCache::generate_cache_key("o/r")
        );
    }

    #[tokio::test]
    async fn test_file_names_are_stable() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::with_cache_dir(temp_dir.path());
        cache.put("o/r", &sample_result(5)).await.unwrap();

        assert!(temp_dir.path().join("o_2fr.json").exists());
    }
}
