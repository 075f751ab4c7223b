//! Engine configuration surface.
//!
//! Settings are plain serde structs with per-field defaults, loadable from an
//! optional TOML file plus `TRADECACHE`-prefixed environment overrides, e.g.
//! `TRADECACHE__REDIS__URL=redis://cache:6379`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineSettings {
    /// Remote store connection
    #[serde(default)]
    pub redis: RedisSettings,
    /// Fast in-process tier
    #[serde(default)]
    pub l1: L1Settings,
    /// Write-behind flush loop
    #[serde(default)]
    pub write_behind: WriteBehindSettings,
    /// Lazy-invalidation queue drain
    #[serde(default)]
    pub invalidation: InvalidationSettings,
    /// Metrics collection and alerting
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    /// Real-time refresh cadences
    #[serde(default)]
    pub refresh: RefreshSettings,
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.l1.max_entries == 0 {
            return Err("l1.max_entries must be > 0".into());
        }
        if self.write_behind.batch_size == 0 {
            return Err("write_behind.batch_size must be > 0".into());
        }
        if self.write_behind.flush_interval_ms == 0 {
            return Err("write_behind.flush_interval_ms must be > 0".into());
        }
        if self.invalidation.drain_batch_size == 0 {
            return Err("invalidation.drain_batch_size must be > 0".into());
        }
        if self.monitoring.collection_interval_secs == 0 {
            return Err("monitoring.collection_interval_secs must be > 0".into());
        }
        if self.monitoring.history_limit == 0 || self.monitoring.alert_history_limit == 0 {
            return Err("monitoring history limits must be > 0".into());
        }
        if self.redis.enabled && self.redis.url.is_empty() {
            return Err("redis.enabled=true requires redis.url".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    /// Enable the remote store (gracefully degrades without it)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L1Settings {
    /// Maximum number of L1 entries before least-recently-accessed eviction
    #[serde(default = "default_l1_max_entries")]
    pub max_entries: usize,

    /// Expiry sweep interval in seconds
    #[serde(default = "default_l1_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_l1_max_entries() -> usize {
    10_000
}

fn default_l1_sweep_interval_secs() -> u64 {
    300
}

impl Default for L1Settings {
    fn default() -> Self {
        Self {
            max_entries: default_l1_max_entries(),
            sweep_interval_secs: default_l1_sweep_interval_secs(),
        }
    }
}

impl L1Settings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteBehindSettings {
    /// Flush interval in milliseconds
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Maximum items flushed per tick
    #[serde(default = "default_flush_batch_size")]
    pub batch_size: usize,

    /// Attempts per item before it is dropped from the queue
    #[serde(default = "default_flush_max_retries")]
    pub max_retries: u32,
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_flush_batch_size() -> usize {
    100
}

fn default_flush_max_retries() -> u32 {
    5
}

impl Default for WriteBehindSettings {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            batch_size: default_flush_batch_size(),
            max_retries: default_flush_max_retries(),
        }
    }
}

impl WriteBehindSettings {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationSettings {
    /// Lazy queue drain interval in milliseconds
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,

    /// Maximum lazy items processed per tick
    #[serde(default = "default_drain_batch_size")]
    pub drain_batch_size: usize,
}

fn default_drain_interval_ms() -> u64 {
    1000
}

fn default_drain_batch_size() -> usize {
    10
}

impl Default for InvalidationSettings {
    fn default() -> Self {
        Self {
            drain_interval_ms: default_drain_interval_ms(),
            drain_batch_size: default_drain_batch_size(),
        }
    }
}

impl InvalidationSettings {
    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Metrics collection interval in seconds
    #[serde(default = "default_collection_interval_secs")]
    pub collection_interval_secs: u64,

    /// Bounded metrics history length
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Bounded alert history length
    #[serde(default = "default_alert_history_limit")]
    pub alert_history_limit: usize,
}

fn default_collection_interval_secs() -> u64 {
    10
}

fn default_history_limit() -> usize {
    1000
}

fn default_alert_history_limit() -> usize {
    1000
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            collection_interval_secs: default_collection_interval_secs(),
            history_limit: default_history_limit(),
            alert_history_limit: default_alert_history_limit(),
        }
    }
}

impl MonitoringSettings {
    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(self.collection_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Market data refresh cadence in milliseconds
    #[serde(default = "default_market_data_refresh_ms")]
    pub market_data_ms: u64,

    /// Order book refresh cadence in milliseconds
    #[serde(default = "default_order_books_refresh_ms")]
    pub order_books_ms: u64,

    /// Portfolio refresh cadence in milliseconds
    #[serde(default = "default_portfolios_refresh_ms")]
    pub portfolios_ms: u64,
}

fn default_market_data_refresh_ms() -> u64 {
    1000
}

fn default_order_books_refresh_ms() -> u64 {
    500
}

fn default_portfolios_refresh_ms() -> u64 {
    5000
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            market_data_ms: default_market_data_refresh_ms(),
            order_books_ms: default_order_books_refresh_ms(),
            portfolios_ms: default_portfolios_refresh_ms(),
        }
    }
}

pub mod loader {
    use super::EngineSettings;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Load settings from an optional TOML file plus environment overrides,
    /// e.g. `TRADECACHE__L1__MAX_ENTRIES=50000`.
    pub fn load_settings(path: Option<&str>) -> Result<EngineSettings, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("tradecache.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("TRADECACHE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("settings build error: {e}"))?;
        let merged: EngineSettings = cfg
            .try_deserialize()
            .map_err(|e| format!("settings deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
