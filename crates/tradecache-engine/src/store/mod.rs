//! Remote key-value store abstraction.
//!
//! The engine talks to its shared L2 tier through the [`RemoteStore`] trait:
//! plain GET/SETEX/DEL/KEYS/EXISTS semantics plus a pipelined multi-key set.
//! Two implementations ship here — [`RedisStore`] for production and
//! [`MemoryStore`] for single-instance/degraded mode and tests.

pub mod memory;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tradecache_core::Result;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use crate::settings::RedisSettings;

/// Remote key-value store contract (Redis-compatible semantics).
///
/// Any store supporting TTL-based expiry and server-side glob key listing is
/// sufficient. All methods surface failures as
/// [`CacheError::RemoteStore`](tradecache_core::CacheError::RemoteStore);
/// callers decide whether a failure degrades to a miss or fails the call.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value with a TTL (`SETEX`).
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Delete keys in one round trip; returns the number actually removed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// List live keys matching a `*`-wildcard glob.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Whether a key currently exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Store several values in one pipelined round trip.
    async fn set_many(&self, items: &[(String, String, Duration)]) -> Result<()>;

    /// Liveness probe.
    async fn ping(&self) -> Result<()>;

    /// Implementation name for logs and health details.
    fn name(&self) -> &'static str;
}

/// Connect to the configured remote store.
///
/// ## Store Modes
///
/// - **Redis disabled**: returns the in-memory store
/// - **Redis enabled**: attempts to connect, falls back to in-memory on failure
///
/// The fallback keeps the hot path serving even when the shared tier is
/// unreachable at startup; cross-process sharing resumes on the next restart
/// with a healthy store.
pub async fn connect_store(settings: &RedisSettings) -> Arc<dyn RemoteStore> {
    if !settings.enabled {
        tracing::info!("remote store disabled, using in-memory store");
        return Arc::new(MemoryStore::new());
    }

    tracing::info!(url = %settings.url, "connecting to remote store");

    match RedisStore::connect(settings).await {
        Ok(store) => {
            tracing::info!("connected to remote store");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "failed to connect to remote store, falling back to in-memory store"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
