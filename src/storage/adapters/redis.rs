use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::declare_storage_plugin;
use crate::errors::{DashboardError, Result};
use crate::storage::StorageAdapter;

declare_storage_plugin!("redis", RedisStorage);

const SCAN_BATCH: usize = 200;

/// 远程介质，所有键带统一前缀
pub struct RedisStorage {
    client: redis::Client,
    key_prefix: String,
}

impl RedisStorage {
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let redis_config = &config.storage.redis;

        let client = redis::Client::open(redis_config.url.clone()).map_err(|e| {
            DashboardError::storage_config(format!("Invalid Redis URL {}: {e}", redis_config.url))
        })?;

        let storage = Self {
            client,
            key_prefix: redis_config.key_prefix.clone(),
        };

        // 测试 Redis 连接
        let mut conn = storage.get_connection().await.map_err(|e| {
            error!(
                "Failed to connect to Redis: {}. Check Redis server status and URL: {}",
                e, redis_config.url
            );
            DashboardError::storage_unavailable(format!("Redis connection failed: {e}"))
        })?;
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| DashboardError::storage_unavailable(format!("Redis ping failed: {e}")))?;
        debug!(
            "RedisStorage created with prefix '{}', ping: {}",
            storage.key_prefix, response
        );

        Ok(storage)
    }

    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// 扫描前缀下的全部键（带前缀）
    async fn scan_prefixed(&self, conn: &mut MultiplexedConnection) -> redis::RedisResult<Vec<String>> {
        let pattern = format!("{}*", self.key_prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }
}

#[async_trait]
impl StorageAdapter for RedisStorage {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        self.try_get_raw(key).await.unwrap_or_else(|e| {
            error!("{}", e);
            None
        })
    }

    async fn try_get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await.map_err(|e| {
            DashboardError::storage_unavailable(format!("Failed to get Redis connection: {e}"))
        })?;

        let value = conn
            .get::<_, Option<String>>(self.make_key(key))
            .await
            .map_err(|e| {
                DashboardError::storage_unavailable(format!("Failed to get key '{key}': {e}"))
            })?;
        debug!("Retrieved key '{}' (found: {})", key, value.is_some());
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: String) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        if let Err(e) = conn.set::<_, _, ()>(self.make_key(key), value).await {
            error!("Failed to set key '{}': {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        match conn.del::<_, i64>(self.make_key(key)).await {
            Ok(deleted) => debug!("Removed key '{}' ({} deleted)", key, deleted),
            Err(e) => error!("Failed to remove key '{}': {}", key, e),
        }
    }

    async fn clear(&self) {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return;
            }
        };

        let keys = match self.scan_prefixed(&mut conn).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Failed to scan keys for clear: {}", e);
                return;
            }
        };
        if keys.is_empty() {
            return;
        }
        if let Err(e) = conn.del::<_, i64>(keys).await {
            error!("Failed to clear keys: {}", e);
        }
    }

    async fn keys(&self) -> Vec<String> {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return Vec::new();
            }
        };

        match self.scan_prefixed(&mut conn).await {
            Ok(keys) => {
                let mut keys: Vec<String> = keys
                    .into_iter()
                    .filter_map(|k| k.strip_prefix(&self.key_prefix).map(str::to_string))
                    .collect();
                keys.sort();
                keys
            }
            Err(e) => {
                error!("Failed to scan keys: {}", e);
                Vec::new()
            }
        }
    }
}
