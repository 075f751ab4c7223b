//! Redis-backed remote store.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use tradecache_core::{CacheError, Result};

use super::RemoteStore;
use crate::settings::RedisSettings;

/// Remote store backed by a Redis connection pool.
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build a pool from settings and verify connectivity with a ping.
    pub async fn connect(settings: &RedisSettings) -> Result<Self> {
        let mut config = deadpool_redis::Config::from_url(&settings.url);
        if let Some(ref mut pool_config) = config.pool {
            pool_config.max_size = settings.pool_size;
            pool_config.timeouts.wait = Some(Duration::from_millis(settings.timeout_ms));
            pool_config.timeouts.create = Some(Duration::from_millis(settings.timeout_ms));
            pool_config.timeouts.recycle = Some(Duration::from_millis(settings.timeout_ms));
        }

        let pool = config
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| CacheError::remote_store(format!("failed to create pool: {e}")))?;

        let store = Self { pool };
        store.ping().await?;
        Ok(store)
    }

    /// Wrap an existing pool (for callers that manage their own).
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::remote_store(format!("failed to get connection: {e}")))
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| CacheError::remote_store(format!("GET {key}: {e}")))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        // SETEX rejects a zero TTL; clamp to the 1-second floor.
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| CacheError::remote_store(format!("SETEX {key}: {e}")))
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        conn.del::<_, u64>(keys)
            .await
            .map_err(|e| CacheError::remote_store(format!("DEL: {e}")))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.keys::<_, Vec<String>>(pattern)
            .await
            .map_err(|e| CacheError::remote_store(format!("KEYS {pattern}: {e}")))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.exists::<_, bool>(key)
            .await
            .map_err(|e| CacheError::remote_store(format!("EXISTS {key}: {e}")))
    }

    async fn set_many(&self, items: &[(String, String, Duration)]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        for (key, value, ttl) in items {
            pipe.cmd("SETEX")
                .arg(key)
                .arg(ttl.as_secs().max(1))
                .arg(value)
                .ignore();
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::remote_store(format!("pipelined SETEX: {e}")))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| CacheError::remote_store(format!("PING: {e}")))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
