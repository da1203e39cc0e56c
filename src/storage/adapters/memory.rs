use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::config::AppConfig;
use crate::declare_storage_plugin;
use crate::errors::Result;
use crate::storage::StorageAdapter;

declare_storage_plugin!("memory", MemoryStorage);

/// 进程内存介质，重启即丢失
#[derive(Default)]
pub struct MemoryStorage {
    inner: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_config(_config: &AppConfig) -> Result<Self> {
        debug!("MemoryStorage initialized");
        Ok(Self::new())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        let value = self.inner.get(key).map(|entry| entry.value().clone());
        if value.is_none() {
            debug!("Key not found in memory storage: {}", key);
        }
        value
    }

    async fn set_raw(&self, key: &str, value: String) {
        self.inner.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.inner.remove(key);
    }

    async fn clear(&self) {
        self.inner.clear();
    }

    async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_and_clear() {
        let storage = MemoryStorage::new();
        storage.set_raw("b", "2".to_string()).await;
        storage.set_raw("a", "1".to_string()).await;
        assert_eq!(storage.keys().await, vec!["a", "b"]);

        storage.remove("a").await;
        assert_eq!(storage.get_raw("a").await, None);
        assert_eq!(storage.keys().await, vec!["b"]);

        storage.clear().await;
        assert!(storage.keys().await.is_empty());
    }
}
