//! Tiered caching engine for a latency-sensitive trading platform.
//!
//! ## Architecture
//!
//! - **Tiered Cache Manager** (`cache`): L1 (DashMap) + L2 (remote
//!   key-value store) + optional L3 cold tier, with a catalogue of named
//!   cache configurations and per-configuration write strategies.
//! - **Domain Cache Layer** (`domain`): typed façade for trading records
//!   (market snapshots, order books, sessions, portfolios, derived metrics)
//!   with its own local index and freshness windows.
//! - **Invalidation Rule Engine** (`invalidation`): a runtime-mutable rule
//!   table mapping key patterns to invalidation strategies, with a deferred
//!   lazy queue.
//! - **Monitoring & Alerting** (`monitoring`): periodic metrics collection,
//!   threshold alerting with cooldowns, and period reports.
//!
//! ## Cache Hierarchy
//!
//! ```text
//! GET request → L1 (DashMap) → L2 (remote store) → L3 (cold tier)
//!                   ↓                ↓                  ↓
//!               <1µs latency    ~5ms latency       stubbed by default
//! ```
//!
//! ## Graceful Degradation
//!
//! If the remote store is unavailable or disabled, the engine falls back to
//! an in-memory store so the hot path keeps serving.

pub mod cache;
pub mod domain;
pub mod glob;
pub mod invalidation;
pub mod monitoring;
pub mod settings;
pub mod store;

pub use cache::{
    CacheConfig, CacheManagerStats, ConfigCatalog, InvalidationSpec, Tier, TieredCacheManager,
    WriteStrategy,
};
pub use domain::{
    DerivedMetrics, MarketSnapshot, OrderBook, OrderBookLevel, Portfolio, PortfolioPosition,
    TradingCache, TradingCacheStats, TradingSession,
};
pub use invalidation::{
    InvalidationEngine, InvalidationEvent, InvalidationRule, InvalidationStats,
    InvalidationStrategy,
};
pub use monitoring::{
    Alert, AlertRule, AlertOperator, MetricsSnapshot, MonitoringService, PerformanceReport,
    TierMetrics,
};
pub use settings::EngineSettings;
pub use store::{connect_store, MemoryStore, RedisStore, RemoteStore};
