//! Domain cache layer: typed wrappers over the tiered cache manager for the
//! trading platform's record kinds, with local fast-path indexes, freshness
//! windows, batch operations, and session/user invalidation cascades.

pub mod cache;
pub mod records;

pub use cache::{
    BatchKey, BatchRecord, FreshnessWindows, TradingCache, TradingCacheStats,
};
pub use records::{
    DerivedMetrics, MarketSnapshot, OrderBook, OrderBookLevel, Portfolio, PortfolioPosition,
    SessionStatus, TimedRecord, TradingSession,
};
