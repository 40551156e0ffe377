//! Durable key-value settings (the relay base URL lives under `proxy`)

use async_trait::async_trait;
use gitloc_core::{
    storage_error, ErrorContext, GitlocError, GitlocResult, SettingsStore, PROXY_SETTING_KEY,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Settings persisted as a single JSON object
pub struct FileSettingsStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> GitlocResult<BTreeMap<String, String>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| GitlocError::Storage {
            message: format!("Settings file {:?} is not valid JSON: {}", self.path, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("settings_store")
                .with_operation("load")
                .with_suggestion("Fix or delete the settings file"),
        })
    }

    async fn store(&self, values: &BTreeMap<String, String>) -> GitlocResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(values)
            .map_err(|e| storage_error!("Failed to serialize settings", "settings_store", e))?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> GitlocResult<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> GitlocResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.store(&values).await?;
        debug!("Saved setting {} to {:?}", key, self.path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> GitlocResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_some() {
            self.store(&values).await?;
        }
        Ok(())
    }
}

/// In-memory settings for tests and one-off runs
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proxy(proxy: &str) -> Self {
        let mut values = BTreeMap::new();
        values.insert(PROXY_SETTING_KEY.to_string(), proxy.to_string());
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> GitlocResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> GitlocResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> GitlocResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// What [`save_proxy`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyUpdate {
    Saved(String),
    Removed,
}

/// Persist the relay setting. Input is trimmed; blank input removes it.
pub async fn save_proxy(store: &dyn SettingsStore, raw: &str) -> GitlocResult<ProxyUpdate> {
    let proxy = raw.trim();
    if proxy.is_empty() {
        store.remove(PROXY_SETTING_KEY).await?;
        info!("Removed proxy setting");
        Ok(ProxyUpdate::Removed)
    } else {
        store.set(PROXY_SETTING_KEY, proxy).await?;
        info!("Saved proxy setting: {}", proxy);
        Ok(ProxyUpdate::Saved(proxy.to_string()))
    }
}

/// Current relay setting, if any
pub async fn load_proxy(store: &dyn SettingsStore) -> GitlocResult<Option<String>> {
    Ok(store
        .get(PROXY_SETTING_KEY)
        .await?
        .filter(|proxy| !proxy.trim().is_empty()))
}
