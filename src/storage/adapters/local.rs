//! 本地模式存储
//!
//! 整个键空间保存为一个 JSON 对象文件（键 → 原始文本）。
//! 写入先落到临时文件再 rename，读者不会看到写了一半的文件。

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::declare_storage_plugin;
use crate::errors::{DashboardError, Result};
use crate::storage::StorageAdapter;

declare_storage_plugin!("local", LocalFileStorage);

type Entries = BTreeMap<String, String>;

pub struct LocalFileStorage {
    path: PathBuf,
    // 串行化同一进程内对文件的读改写
    lock: Mutex<()>,
}

impl LocalFileStorage {
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DashboardError::storage_config(format!(
                    "Cannot create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        debug!("LocalFileStorage initialized at {}", path.display());
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.storage.local.path).await
    }

    /// 读取全部条目；文件不存在视为空，读取失败或文件损坏返回错误
    async fn try_load(&self) -> Result<Entries> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<Entries>(&bytes).map_err(|e| {
                DashboardError::storage_unavailable(format!(
                    "Local storage file {} is corrupted: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(DashboardError::storage_unavailable(format!(
                "Failed to read local storage file {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn load(&self) -> Option<Entries> {
        match self.try_load().await {
            Ok(entries) => Some(entries),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    async fn persist(&self, entries: &Entries) {
        let bytes = match serde_json::to_vec_pretty(entries) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to serialize local storage: {}", e);
                return;
            }
        };

        let tmp_path = self.path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp_path, &bytes).await {
            error!("Failed to write {}: {}", tmp_path.display(), e);
            return;
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            error!("Failed to replace {}: {}", self.path.display(), e);
            let _ = tokio::fs::remove_file(&tmp_path).await;
        }
    }

    /// 读改写；文件不可用时放弃本次修改
    async fn modify<F>(&self, op: &str, f: F)
    where
        F: FnOnce(&mut Entries) + Send,
    {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Some(mut entries) => {
                f(&mut entries);
                self.persist(&entries).await;
            }
            None => debug!("Local storage unavailable, {} ignored", op),
        }
    }
}

#[async_trait]
impl StorageAdapter for LocalFileStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().await;
        self.load().await?.remove(key)
    }

    async fn try_get_raw(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.try_load().await?.remove(key))
    }

    async fn set_raw(&self, key: &str, value: String) {
        self.modify("set", |entries| {
            entries.insert(key.to_string(), value);
        })
        .await;
    }

    async fn remove(&self, key: &str) {
        self.modify("remove", |entries| {
            entries.remove(key);
        })
        .await;
    }

    async fn clear(&self) {
        self.modify("clear", |entries| entries.clear()).await;
    }

    async fn keys(&self) -> Vec<String> {
        let _guard = self.lock.lock().await;
        self.load()
            .await
            .map(|entries| entries.into_keys().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("hwdashboard-{}", uuid::Uuid::new_v4()))
            .join("local_storage.json")
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let path = temp_path();
        let storage = LocalFileStorage::new(&path).await.unwrap();
        storage.set("students", &json!([{"id": "1"}])).await;
        storage.set("theme", &json!("dark")).await;

        let reopened = LocalFileStorage::new(&path).await.unwrap();
        assert_eq!(reopened.get("students").await, Some(json!([{"id": "1"}])));
        assert_eq!(reopened.try_get_raw("missing").await.unwrap(), None);
        assert_eq!(reopened.keys().await, vec!["students", "theme"]);

        reopened.remove("theme").await;
        assert_eq!(storage.keys().await, vec!["students"]);
        reopened.clear().await;
        assert!(storage.keys().await.is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_corrupted_file_degrades_to_noop() {
        let path = temp_path();
        let storage = LocalFileStorage::new(&path).await.unwrap();
        std::fs::write(&path, b"{ broken").unwrap();

        assert_eq!(storage.get("students").await, None);
        storage.set("students", &json!([])).await;
        assert!(storage.keys().await.is_empty());
        // 损坏的文件保持原样
        assert_eq!(std::fs::read(&path).unwrap(), b"{ broken");

        let err = storage.try_get_raw("students").await.unwrap_err();
        assert_eq!(err.code(), "E003");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
