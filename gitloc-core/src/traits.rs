//! Core trait definitions

use crate::error::GitlocResult;
use crate::types::*;
use async_trait::async_trait;
use std::time::Duration;

/// Key name of the relay base URL in the settings store
pub const PROXY_SETTING_KEY: &str = "proxy";

/// Keyed store of previous analysis results
///
/// Entries are overwritten on `put` and never evicted; freshness is judged by
/// the caller through [`CachePolicy`].
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Look up the entry stored under `key`
    async fn get(&self, key: &str) -> GitlocResult<Option<CacheEntry>>;

    /// Store an entry, replacing any previous one for `key`
    async fn put_entry(&self, key: &str, entry: CacheEntry) -> GitlocResult<()>;

    /// Store a result stamped with the current time
    async fn put(&self, key: &str, result: &AnalysisResult) -> GitlocResult<()> {
        self.put_entry(key, CacheEntry::now(result.clone())).await
    }
}

/// Durable string settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> GitlocResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> GitlocResult<()>;

    async fn remove(&self, key: &str) -> GitlocResult<()>;
}

/// Read-side freshness rule for cached results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl CachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// An entry is fresh while `now - timestamp < ttl`
    pub fn is_fresh(&self, entry: &CacheEntry, now_ms: i64) -> bool {
        let age_ms = now_ms.saturating_sub(entry.timestamp);
        i128::from(age_ms) < self.ttl.as_millis() as i128
    }

    pub fn is_fresh_now(&self, entry: &CacheEntry) -> bool {
        self.is_fresh(entry, chrono::Utc::now().timestamp_millis())
    }
}
