//! 存储适配层
//!
//! 对键值持久化介质提供统一的 get/set/remove/clear/keys 接口。
//! 值以 JSON 文本形式落入介质；介质不可用时所有操作退化为空操作，不会返回错误。

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::{DashboardError, Result};

pub mod adapters;
pub mod register;

/// 注册存储插件
///
/// 被注册的类型需要提供 `async fn from_config(&AppConfig) -> Result<Self>`。
#[macro_export]
macro_rules! declare_storage_plugin {
    ($name:expr, $ty:ty) => {
        #[::ctor::ctor]
        unsafe fn __register_storage_plugin() {
            $crate::storage::register::register_storage_plugin(
                $name,
                ::std::sync::Arc::new(|| -> $crate::storage::register::BoxedStorageFuture {
                    Box::pin(async {
                        let config = $crate::config::AppConfig::get();
                        let adapter = <$ty>::from_config(config).await?;
                        Ok::<_, $crate::errors::DashboardError>(
                            Box::new(adapter) as Box<dyn $crate::storage::StorageAdapter>
                        )
                    })
                }),
            );
        }
    };
}

#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// 介质名称（日志用）
    fn name(&self) -> &'static str;

    // 读取原始文本
    async fn get_raw(&self, key: &str) -> Option<String>;
    // 写入原始文本
    async fn set_raw(&self, key: &str, value: String);
    // 删除单个键
    async fn remove(&self, key: &str);
    // 清空全部键
    async fn clear(&self);
    // 列出全部键
    async fn keys(&self) -> Vec<String>;

    /// 读取原始文本，介质故障时返回错误而不是 None
    ///
    /// 读改写流程需要区分“键不存在”和“读取失败”。
    async fn try_get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_raw(key).await)
    }

    /// 读取并反序列化；文本不是合法 JSON 时原样作为字符串返回
    async fn get(&self, key: &str) -> Option<Value> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Value under '{}' is not JSON ({}), returning raw text", key, e);
                Some(Value::String(raw))
            }
        }
    }

    /// 序列化后写入
    async fn set(&self, key: &str, value: &Value) {
        match serde_json::to_string(value) {
            Ok(text) => self.set_raw(key, text).await,
            Err(e) => warn!("Failed to serialize value for '{}': {}", key, e),
        }
    }
}

/// 类型化读写辅助
#[async_trait]
pub trait StorageAdapterExt: StorageAdapter {
    /// 读取并转换为指定类型；键不存在时返回 `Ok(None)`
    async fn get_as<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                DashboardError::serialization(format!("Value under '{key}' has unexpected shape: {e}"))
            }),
            None => Ok(None),
        }
    }

    async fn set_as<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, &value).await;
        Ok(())
    }
}

impl<S: StorageAdapter + ?Sized> StorageAdapterExt for S {}

/// 按配置创建存储介质
///
/// 配置的介质无法创建时退化为 `noop`，保证服务仍可启动。
pub async fn create_storage() -> Result<Arc<dyn StorageAdapter>> {
    let config = AppConfig::get();
    let storage_type = &config.storage.storage_type;

    warn!("Attempting to create {} storage backend", storage_type);

    match register::get_storage_plugin(storage_type) {
        Some(constructor) => match constructor().await {
            Ok(storage) => {
                warn!("Successfully created {} storage backend", storage_type);
                return Ok(Arc::from(storage));
            }
            Err(e) => {
                warn!("Failed to create {} storage: {}", storage_type, e);
            }
        },
        None => {
            warn!("Storage backend '{}' not found in registry", storage_type);
        }
    }

    if storage_type != adapters::noop::PLUGIN_NAME {
        warn!("Storage unavailable, degrading to no-op storage");
        if let Some(constructor) = register::get_storage_plugin(adapters::noop::PLUGIN_NAME) {
            return constructor().await.map(Arc::from);
        }
    }

    Err(DashboardError::storage_plugin_not_found(format!(
        "No storage backend available (tried: {storage_type})"
    )))
}

#[cfg(test)]
mod tests {
    use super::adapters::memory::MemoryStorage;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_structured_value() {
        let storage = MemoryStorage::new();
        let value = json!({
            "students": [{"id": "1", "name": "Kim", "class": "A반", "completionRate": 0}],
            "version": 3,
            "nested": {"flag": true, "none": null}
        });

        storage.set("key", &value).await;
        assert_eq!(storage.get("key").await, Some(value));
    }

    #[tokio::test]
    async fn test_get_falls_back_to_raw_text() {
        let storage = MemoryStorage::new();
        storage.set_raw("legacy", "not-json {".to_string()).await;

        assert_eq!(
            storage.get("legacy").await,
            Some(Value::String("not-json {".to_string()))
        );
    }

    #[tokio::test]
    async fn test_get_as_reports_shape_mismatch() {
        let storage = MemoryStorage::new();
        storage.set("numbers", &json!({"a": 1})).await;

        assert!(storage.get_as::<Vec<u32>>("numbers").await.is_err());
        assert_eq!(storage.get_as::<Vec<u32>>("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_as_then_get_as() {
        let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
        storage.set_as("list", &vec![1u32, 2, 3]).await.unwrap();

        assert_eq!(
            storage.get_as::<Vec<u32>>("list").await.unwrap(),
            Some(vec![1, 2, 3])
        );
    }
}
