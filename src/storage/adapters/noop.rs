use async_trait::async_trait;
use tracing::debug;

use crate::config::AppConfig;
use crate::declare_storage_plugin;
use crate::errors::Result;
use crate::storage::StorageAdapter;

pub const PLUGIN_NAME: &str = "noop";

declare_storage_plugin!(PLUGIN_NAME, NoopStorage);

/// 不可用的介质：所有操作直接成功，读取总是为空
#[derive(Default)]
pub struct NoopStorage;

impl NoopStorage {
    pub async fn from_config(_config: &AppConfig) -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait]
impl StorageAdapter for NoopStorage {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        debug!("No storage available, get '{}' ignored", key);
        None
    }

    async fn set_raw(&self, key: &str, _value: String) {
        debug!("No storage available, set '{}' ignored", key);
    }

    async fn remove(&self, _key: &str) {}

    async fn clear(&self) {}

    async fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}
