//! Tiered caching for the trading platform.
//!
//! ## Architecture
//!
//! - **L1 (DashMap)**: in-process, microsecond latency, bounded with
//!   least-recently-accessed eviction and a periodic expiry sweep
//! - **L2 (remote store)**: shared across instances, TTL-expired server-side
//! - **L3 (cold tier)**: optional slower store, stubbed unless wired
//!
//! Every operation names a [`CacheConfig`]; the configuration decides the
//! highest tier a value lives in and the write strategy (`CacheAside`,
//! `WriteThrough`, `WriteBehind`).

pub mod config;
pub mod entry;
pub mod key;
pub mod manager;
pub mod stats;

pub use config::{CacheConfig, ConfigCatalog, InvalidationSpec, Tier, WriteStrategy};
pub use entry::L1Entry;
pub use key::build_key;
pub use manager::TieredCacheManager;
pub use stats::{CacheManagerStats, TierStats};
