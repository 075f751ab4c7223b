//! Typed domain cache for trading records.
//!
//! Each record kind is backed by (a) a local map for sub-millisecond repeat
//! reads within the process, and (b) a named configuration on the tiered
//! cache manager for cross-process sharing. Local reads are only served
//! while the record is *fresh* — its own timestamp is within the kind's
//! freshness window — regardless of raw cache TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tradecache_core::time::is_older_than;
use tradecache_core::{CacheEventBus, RefreshKind, Result};

use super::records::{
    DerivedMetrics, MarketSnapshot, OrderBook, Portfolio, TimedRecord, TradingSession,
};
use crate::cache::TieredCacheManager;
use crate::settings::RefreshSettings;

const CONFIG_MARKET_DATA: &str = "market_data";
const CONFIG_ORDER_BOOK: &str = "order_book";
const CONFIG_TRADING_SESSION: &str = "trading_session";
const CONFIG_PORTFOLIO: &str = "portfolio";
const CONFIG_DERIVED_METRICS: &str = "derived_metrics";

/// Freshness windows per record kind.
#[derive(Debug, Clone)]
pub struct FreshnessWindows {
    pub market: Duration,
    pub order_book: Duration,
    pub session: Duration,
    pub portfolio: Duration,
    pub metrics: Duration,
}

impl Default for FreshnessWindows {
    fn default() -> Self {
        Self {
            market: Duration::from_secs(5),
            order_book: Duration::from_secs(2),
            session: Duration::from_secs(1800),
            portfolio: Duration::from_secs(60),
            metrics: Duration::from_secs(30),
        }
    }
}

/// Local index for one record kind.
struct LocalIndex<T: TimedRecord> {
    entries: DashMap<String, T>,
}

impl<T: TimedRecord> LocalIndex<T> {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fresh read; stale entries are dropped on the way out.
    fn get_fresh(&self, key: &str, window: Duration) -> Option<T> {
        if let Some(record) = self.entries.get(key) {
            if !is_older_than(record.recorded_at(), window) {
                return Some(record.value().clone());
            }
        }
        self.entries.remove(key);
        None
    }

    fn insert(&self, key: String, record: T) {
        self.entries.insert(key, record);
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn estimate_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| {
                let value_len = serde_json::to_string(entry.value())
                    .map(|s| s.len())
                    .unwrap_or(0);
                (entry.key().len() + value_len) as u64
            })
            .sum()
    }
}

/// One record in a batch write.
#[derive(Debug, Clone)]
pub enum BatchRecord {
    MarketSnapshot(MarketSnapshot),
    OrderBook(OrderBook),
    TradingSession(TradingSession),
    Portfolio(Portfolio),
    DerivedMetrics(DerivedMetrics),
}

impl BatchRecord {
    fn kind(&self) -> &'static str {
        match self {
            Self::MarketSnapshot(_) => "market_snapshot",
            Self::OrderBook(_) => "order_book",
            Self::TradingSession(_) => "trading_session",
            Self::Portfolio(_) => "portfolio",
            Self::DerivedMetrics(_) => "derived_metrics",
        }
    }

    fn key(&self) -> &str {
        match self {
            Self::MarketSnapshot(r) => &r.symbol,
            Self::OrderBook(r) => &r.symbol,
            Self::TradingSession(r) => &r.session_id,
            Self::Portfolio(r) => &r.user_id,
            Self::DerivedMetrics(r) => &r.session_id,
        }
    }
}

/// One key in a batch read.
#[derive(Debug, Clone)]
pub enum BatchKey {
    MarketSnapshot(String),
    OrderBook(String),
    TradingSession(String),
    Portfolio(String),
    DerivedMetrics(String),
}

/// Local-map sizes per record kind plus a byte estimate for capacity
/// planning (sum of key length + serialized value length).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingCacheStats {
    pub market_snapshots: usize,
    pub order_books: usize,
    pub trading_sessions: usize,
    pub portfolios: usize,
    pub derived_metrics: usize,
    pub estimated_bytes: u64,
}

/// Typed cache façade for the trading platform's record kinds.
pub struct TradingCache {
    manager: Arc<TieredCacheManager>,
    events: CacheEventBus,
    freshness: FreshnessWindows,
    refresh: RefreshSettings,
    market: LocalIndex<MarketSnapshot>,
    order_books: LocalIndex<OrderBook>,
    sessions: LocalIndex<TradingSession>,
    portfolios: LocalIndex<Portfolio>,
    metrics: LocalIndex<DerivedMetrics>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TradingCache {
    /// Build the domain cache over a tiered manager.
    ///
    /// Fails fast if the manager's catalogue is missing any of the named
    /// configurations this layer relies on.
    pub fn new(
        manager: Arc<TieredCacheManager>,
        events: CacheEventBus,
        refresh: RefreshSettings,
    ) -> Result<Self> {
        for name in [
            CONFIG_MARKET_DATA,
            CONFIG_ORDER_BOOK,
            CONFIG_TRADING_SESSION,
            CONFIG_PORTFOLIO,
            CONFIG_DERIVED_METRICS,
        ] {
            manager.catalog().get(name)?;
        }
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            manager,
            events,
            freshness: FreshnessWindows::default(),
            refresh,
            market: LocalIndex::new(),
            order_books: LocalIndex::new(),
            sessions: LocalIndex::new(),
            portfolios: LocalIndex::new(),
            metrics: LocalIndex::new(),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Override the default freshness windows (mostly for tests).
    pub fn with_freshness(mut self, freshness: FreshnessWindows) -> Self {
        self.freshness = freshness;
        self
    }

    /// Start the real-time refresh timers.
    ///
    /// Each timer only emits a `RefreshRequired` signal on its cadence; the
    /// external market-data feed listens and pushes fresh records through the
    /// normal `cache_*` calls.
    pub fn start(self: &Arc<Self>) {
        let cadences = [
            (RefreshKind::MarketData, self.refresh.market_data_ms),
            (RefreshKind::OrderBooks, self.refresh.order_books_ms),
            (RefreshKind::Portfolios, self.refresh.portfolios_ms),
        ];
        let mut handles = Vec::with_capacity(cadences.len());
        for (kind, interval_ms) in cadences {
            let events = self.events.clone();
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(Duration::from_millis(interval_ms));
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                // Skip the immediate first tick; refresh begins one cadence in.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            events.send_refresh_required(kind);
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }
            }));
        }
        self.tasks.lock().extend(handles);
        tracing::info!("trading cache refresh timers started");
    }

    /// Stop the refresh timers.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        tracing::info!("trading cache stopped");
    }

    pub async fn cache_market_snapshot(&self, snapshot: MarketSnapshot) -> Result<bool> {
        let key = snapshot.symbol.clone();
        self.market.insert(key.clone(), snapshot.clone());
        let value = serde_json::to_value(&snapshot)?;
        self.manager.set(&key, value, CONFIG_MARKET_DATA, None).await
    }

    pub async fn get_market_snapshot(&self, symbol: &str) -> Option<MarketSnapshot> {
        if let Some(snapshot) = self.market.get_fresh(symbol, self.freshness.market) {
            return Some(snapshot);
        }
        let record: Option<MarketSnapshot> = self.fetch_remote(symbol, CONFIG_MARKET_DATA).await;
        if let Some(ref snapshot) = record {
            self.market.insert(symbol.to_string(), snapshot.clone());
        }
        record
    }

    pub async fn cache_order_book(&self, book: OrderBook) -> Result<bool> {
        let key = book.symbol.clone();
        self.order_books.insert(key.clone(), book.clone());
        let value = serde_json::to_value(&book)?;
        self.manager.set(&key, value, CONFIG_ORDER_BOOK, None).await
    }

    pub async fn get_order_book(&self, symbol: &str) -> Option<OrderBook> {
        if let Some(book) = self.order_books.get_fresh(symbol, self.freshness.order_book) {
            return Some(book);
        }
        let record: Option<OrderBook> = self.fetch_remote(symbol, CONFIG_ORDER_BOOK).await;
        if let Some(ref book) = record {
            self.order_books.insert(symbol.to_string(), book.clone());
        }
        record
    }

    pub async fn cache_trading_session(&self, session: TradingSession) -> Result<bool> {
        let key = session.session_id.clone();
        self.sessions.insert(key.clone(), session.clone());
        let value = serde_json::to_value(&session)?;
        self.manager
            .set(&key, value, CONFIG_TRADING_SESSION, None)
            .await
    }

    pub async fn get_trading_session(&self, session_id: &str) -> Option<TradingSession> {
        if let Some(session) = self.sessions.get_fresh(session_id, self.freshness.session) {
            return Some(session);
        }
        let record: Option<TradingSession> =
            self.fetch_remote(session_id, CONFIG_TRADING_SESSION).await;
        if let Some(ref session) = record {
            self.sessions.insert(session_id.to_string(), session.clone());
        }
        record
    }

    pub async fn cache_portfolio(&self, portfolio: Portfolio) -> Result<bool> {
        let key = portfolio.user_id.clone();
        self.portfolios.insert(key.clone(), portfolio.clone());
        let value = serde_json::to_value(&portfolio)?;
        self.manager.set(&key, value, CONFIG_PORTFOLIO, None).await
    }

    pub async fn get_portfolio(&self, user_id: &str) -> Option<Portfolio> {
        if let Some(portfolio) = self.portfolios.get_fresh(user_id, self.freshness.portfolio) {
            return Some(portfolio);
        }
        let record: Option<Portfolio> = self.fetch_remote(user_id, CONFIG_PORTFOLIO).await;
        if let Some(ref portfolio) = record {
            self.portfolios.insert(user_id.to_string(), portfolio.clone());
        }
        record
    }

    pub async fn cache_derived_metrics(&self, metrics: DerivedMetrics) -> Result<bool> {
        let key = metrics.session_id.clone();
        self.metrics.insert(key.clone(), metrics.clone());
        let value = serde_json::to_value(&metrics)?;
        self.manager
            .set(&key, value, CONFIG_DERIVED_METRICS, None)
            .await
    }

    pub async fn get_derived_metrics(&self, session_id: &str) -> Option<DerivedMetrics> {
        if let Some(metrics) = self.metrics.get_fresh(session_id, self.freshness.metrics) {
            return Some(metrics);
        }
        let record: Option<DerivedMetrics> =
            self.fetch_remote(session_id, CONFIG_DERIVED_METRICS).await;
        if let Some(ref metrics) = record {
            self.metrics.insert(session_id.to_string(), metrics.clone());
        }
        record
    }

    /// Write a batch of records: every item lands in the local maps, then one
    /// write per item goes to the tiered manager (no multi-key remote write
    /// is assumed). Emits a single batch-updated event. Returns the number of
    /// items whose remote write succeeded.
    pub async fn cache_batch(&self, items: Vec<BatchRecord>) -> Result<usize> {
        let total = items.len();
        let kind = match items.first() {
            Some(first) if items.iter().all(|i| i.kind() == first.kind()) => first.kind(),
            Some(_) => "mixed",
            None => return Ok(0),
        };

        let mut succeeded = 0;
        for item in items {
            let ok = match item {
                BatchRecord::MarketSnapshot(r) => self.cache_market_snapshot(r).await?,
                BatchRecord::OrderBook(r) => self.cache_order_book(r).await?,
                BatchRecord::TradingSession(r) => self.cache_trading_session(r).await?,
                BatchRecord::Portfolio(r) => self.cache_portfolio(r).await?,
                BatchRecord::DerivedMetrics(r) => self.cache_derived_metrics(r).await?,
            };
            if ok {
                succeeded += 1;
            }
        }

        self.events.send_batch_updated(kind, total);
        Ok(succeeded)
    }

    /// Resolve each key independently; the result maps raw keys to the
    /// records that were found, silently omitting misses. Callers must check
    /// for completeness.
    pub async fn get_batch(&self, keys: &[BatchKey]) -> HashMap<String, BatchRecord> {
        let mut found = HashMap::new();
        for key in keys {
            match key {
                BatchKey::MarketSnapshot(k) => {
                    if let Some(r) = self.get_market_snapshot(k).await {
                        found.insert(k.clone(), BatchRecord::MarketSnapshot(r));
                    }
                }
                BatchKey::OrderBook(k) => {
                    if let Some(r) = self.get_order_book(k).await {
                        found.insert(k.clone(), BatchRecord::OrderBook(r));
                    }
                }
                BatchKey::TradingSession(k) => {
                    if let Some(r) = self.get_trading_session(k).await {
                        found.insert(k.clone(), BatchRecord::TradingSession(r));
                    }
                }
                BatchKey::Portfolio(k) => {
                    if let Some(r) = self.get_portfolio(k).await {
                        found.insert(k.clone(), BatchRecord::Portfolio(r));
                    }
                }
                BatchKey::DerivedMetrics(k) => {
                    if let Some(r) = self.get_derived_metrics(k).await {
                        found.insert(k.clone(), BatchRecord::DerivedMetrics(r));
                    }
                }
            }
        }
        found
    }

    /// Remove the session and its derived metrics, locally and remotely.
    pub async fn invalidate_session_data(&self, session_id: &str) -> Result<()> {
        self.sessions.remove(session_id);
        self.metrics.remove(session_id);
        self.manager
            .invalidate(session_id, CONFIG_TRADING_SESSION)
            .await?;
        self.manager
            .invalidate(session_id, CONFIG_DERIVED_METRICS)
            .await?;
        tracing::debug!(session_id = %session_id, "session data invalidated");
        Ok(())
    }

    /// Remove the user's portfolio locally and remotely, and sweep any
    /// denormalized per-user remote keys (`user:{id}:*`).
    pub async fn invalidate_user_data(&self, user_id: &str) -> Result<()> {
        self.portfolios.remove(user_id);
        self.manager.invalidate(user_id, CONFIG_PORTFOLIO).await?;
        self.manager
            .invalidate_pattern(&format!("user:{user_id}:*"))
            .await?;
        tracing::debug!(user_id = %user_id, "user data invalidated");
        Ok(())
    }

    /// Best-effort pre-population when a session begins: pulls the session
    /// and portfolio through the tiered manager into the local maps.
    /// Failures are logged, never raised — trading proceeds regardless.
    pub async fn warm_trading_cache(&self, session_id: &str, user_id: &str) {
        if self.get_trading_session(session_id).await.is_none() {
            tracing::debug!(session_id = %session_id, "no cached session to warm");
        }
        if self.get_portfolio(user_id).await.is_none() {
            tracing::debug!(user_id = %user_id, "no cached portfolio to warm");
        }
        if self.get_derived_metrics(session_id).await.is_none() {
            tracing::debug!(session_id = %session_id, "no cached metrics to warm");
        }
        tracing::info!(session_id = %session_id, user_id = %user_id, "trading cache warmed");
    }

    /// Local-map sizes and byte estimate.
    pub fn stats(&self) -> TradingCacheStats {
        TradingCacheStats {
            market_snapshots: self.market.len(),
            order_books: self.order_books.len(),
            trading_sessions: self.sessions.len(),
            portfolios: self.portfolios.len(),
            derived_metrics: self.metrics.len(),
            estimated_bytes: self.market.estimate_bytes()
                + self.order_books.estimate_bytes()
                + self.sessions.estimate_bytes()
                + self.portfolios.estimate_bytes()
                + self.metrics.estimate_bytes(),
        }
    }

    async fn fetch_remote<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
        config_name: &str,
    ) -> Option<T> {
        match self.manager.get(key, config_name).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(key = %key, config = %config_name, error = %e, "failed to decode cached record");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, config = %config_name, error = %e, "domain cache read failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ConfigCatalog;
    use crate::settings::EngineSettings;
    use crate::store::{MemoryStore, RemoteStore};
    use tradecache_core::time::now_utc;

    fn snapshot(symbol: &str, price: f64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: symbol.into(),
            price,
            bid: price - 0.5,
            ask: price + 0.5,
            volume_24h: 100.0,
            change_24h_pct: 0.0,
            timestamp: now_utc(),
        }
    }

    fn session(session_id: &str, user_id: &str) -> TradingSession {
        TradingSession {
            session_id: session_id.into(),
            user_id: user_id.into(),
            status: super::super::records::SessionStatus::Active,
            started_at: now_utc(),
            timestamp: now_utc(),
        }
    }

    fn portfolio(user_id: &str) -> Portfolio {
        Portfolio {
            user_id: user_id.into(),
            positions: vec![],
            cash_balance: 1000.0,
            total_value: 1000.0,
            timestamp: now_utc(),
        }
    }

    fn metrics(session_id: &str) -> DerivedMetrics {
        DerivedMetrics {
            session_id: session_id.into(),
            realized_pnl: 12.5,
            exposure: 0.4,
            win_rate_pct: 60.0,
            trade_count: 10,
            timestamp: now_utc(),
        }
    }

    fn build_cache(store: Arc<MemoryStore>) -> Arc<TradingCache> {
        let settings = EngineSettings::default();
        let manager = Arc::new(TieredCacheManager::new(
            ConfigCatalog::with_defaults(),
            store,
            &settings,
        ));
        Arc::new(
            TradingCache::new(manager, CacheEventBus::new(), settings.refresh.clone()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_market_snapshot_round_trip() {
        let cache = build_cache(Arc::new(MemoryStore::new()));
        cache
            .cache_market_snapshot(snapshot("BTC-USD", 42_000.0))
            .await
            .unwrap();

        let back = cache.get_market_snapshot("BTC-USD").await.unwrap();
        assert_eq!(back.symbol, "BTC-USD");
        assert_eq!(back.price, 42_000.0);
    }

    #[tokio::test]
    async fn test_stale_local_record_is_not_served() {
        let cache = build_cache(Arc::new(MemoryStore::new()));
        let mut stale = snapshot("ETH-USD", 3000.0);
        stale.timestamp = now_utc() - time::Duration::seconds(30);
        cache.cache_market_snapshot(stale).await.unwrap();

        // Local freshness window (5s) has passed; the remote copy carries the
        // same stale timestamp, so the read repopulates from L2 but the local
        // fast path no longer applies.
        let local = cache
            .market
            .get_fresh("ETH-USD", cache.freshness.market);
        assert!(local.is_none());
    }

    #[tokio::test]
    async fn test_remote_hit_repopulates_local_map() {
        let store = Arc::new(MemoryStore::new());
        let cache = build_cache(Arc::clone(&store));
        cache
            .cache_trading_session(session("s1", "u1"))
            .await
            .unwrap();

        // Drop the local entry; the read falls through and repopulates.
        cache.sessions.remove("s1");
        assert!(cache.get_trading_session("s1").await.is_some());
        assert_eq!(cache.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_batch_emits_single_event() {
        let cache = build_cache(Arc::new(MemoryStore::new()));
        let mut rx = cache.events.subscribe();

        let count = cache
            .cache_batch(vec![
                BatchRecord::MarketSnapshot(snapshot("BTC-USD", 1.0)),
                BatchRecord::MarketSnapshot(snapshot("ETH-USD", 2.0)),
            ])
            .await
            .unwrap();
        assert_eq!(count, 2);

        match rx.recv().await.unwrap() {
            tradecache_core::CacheEvent::BatchUpdated { kind, count } => {
                assert_eq!(kind, "market_snapshot");
                assert_eq!(count, 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // Exactly one event for the whole batch.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_get_batch_omits_misses() {
        let cache = build_cache(Arc::new(MemoryStore::new()));
        cache
            .cache_market_snapshot(snapshot("BTC-USD", 1.0))
            .await
            .unwrap();

        let found = cache
            .get_batch(&[
                BatchKey::MarketSnapshot("BTC-USD".into()),
                BatchKey::MarketSnapshot("DOGE-USD".into()),
            ])
            .await;
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("BTC-USD"));
    }

    #[tokio::test]
    async fn test_invalidate_session_data_cascades_to_metrics() {
        let cache = build_cache(Arc::new(MemoryStore::new()));
        cache
            .cache_trading_session(session("s1", "u1"))
            .await
            .unwrap();
        cache.cache_derived_metrics(metrics("s1")).await.unwrap();

        cache.invalidate_session_data("s1").await.unwrap();

        assert!(cache.get_trading_session("s1").await.is_none());
        assert!(cache.get_derived_metrics("s1").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_user_data_sweeps_denormalized_keys() {
        let store = Arc::new(MemoryStore::new());
        let cache = build_cache(Arc::clone(&store));
        cache.cache_portfolio(portfolio("u1")).await.unwrap();
        store
            .set_ex("user:u1:watchlist", "[]", Duration::from_secs(60))
            .await
            .unwrap();

        cache.invalidate_user_data("u1").await.unwrap();

        assert!(cache.get_portfolio("u1").await.is_none());
        assert!(store.get("user:u1:watchlist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_warm_trading_cache_never_fails() {
        let cache = build_cache(Arc::new(MemoryStore::new()));
        // Nothing cached at all; warming logs and returns.
        cache.warm_trading_cache("s-missing", "u-missing").await;
    }

    #[tokio::test]
    async fn test_stats_counts_and_bytes() {
        let cache = build_cache(Arc::new(MemoryStore::new()));
        cache
            .cache_market_snapshot(snapshot("BTC-USD", 1.0))
            .await
            .unwrap();
        cache.cache_portfolio(portfolio("u1")).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.market_snapshots, 1);
        assert_eq!(stats.portfolios, 1);
        assert!(stats.estimated_bytes > 0);
    }

    #[tokio::test]
    async fn test_refresh_timers_emit_signals() {
        let store = Arc::new(MemoryStore::new());
        let settings = EngineSettings::default();
        let manager = Arc::new(TieredCacheManager::new(
            ConfigCatalog::with_defaults(),
            store,
            &settings,
        ));
        let mut refresh = settings.refresh.clone();
        refresh.market_data_ms = 20;
        refresh.order_books_ms = 10_000;
        refresh.portfolios_ms = 10_000;
        let cache = Arc::new(
            TradingCache::new(manager, CacheEventBus::new(), refresh).unwrap(),
        );
        let mut rx = cache.events.subscribe();

        cache.start();
        let event = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("refresh signal within cadence")
            .unwrap();
        assert!(matches!(
            event,
            tradecache_core::CacheEvent::RefreshRequired {
                kind: RefreshKind::MarketData
            }
        ));
        cache.shutdown().await;
    }
}
