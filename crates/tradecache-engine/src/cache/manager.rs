//! Tiered cache manager: L1 (DashMap) + L2 (remote store) + optional L3.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tradecache_core::{HealthCheck, Result};

use super::config::{CacheConfig, ConfigCatalog, Tier, WriteStrategy};
use super::entry::L1Entry;
use super::key::build_key;
use super::stats::{avg_latency_ms, hit_rate, CacheManagerStats, TierStats};
use crate::glob::glob_match;
use crate::settings::{EngineSettings, WriteBehindSettings};
use crate::store::RemoteStore;

#[derive(Default)]
struct TierCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    latency_micros: AtomicU64,
    latency_samples: AtomicU64,
}

impl TierCounters {
    fn record_latency(&self, started: Instant) {
        self.latency_micros
            .fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, memory_bytes: u64, size: usize) -> TierStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        TierStats {
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            avg_latency_ms: avg_latency_ms(
                self.latency_micros.load(Ordering::Relaxed),
                self.latency_samples.load(Ordering::Relaxed),
            ),
            memory_bytes,
            size,
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    evictions: AtomicU64,
    latency_micros: AtomicU64,
    latency_samples: AtomicU64,
    l1_bytes: AtomicU64,
    l1: TierCounters,
    l2: TierCounters,
    l3: TierCounters,
}

struct WriteBehindItem {
    key: String,
    wire: String,
    ttl: Duration,
    attempts: u32,
}

/// Tiered cache manager.
///
/// Owns the in-process L1 map and a catalogue of named configurations, and
/// talks to the shared L2 (and optional cold L3) through [`RemoteStore`].
/// Transport failures on the read path are counted and degraded to misses;
/// only `WriteThrough` writes surface them to the caller.
pub struct TieredCacheManager {
    catalog: ConfigCatalog,
    store: Arc<dyn RemoteStore>,
    cold: Option<Arc<dyn RemoteStore>>,
    l1: DashMap<String, L1Entry>,
    l1_max_entries: usize,
    sweep_interval: Duration,
    write_behind: WriteBehindSettings,
    ping_timeout: Duration,
    queue: Mutex<VecDeque<WriteBehindItem>>,
    counters: Counters,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TieredCacheManager {
    pub fn new(
        catalog: ConfigCatalog,
        store: Arc<dyn RemoteStore>,
        settings: &EngineSettings,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            catalog,
            store,
            cold: None,
            l1: DashMap::new(),
            l1_max_entries: settings.l1.max_entries,
            sweep_interval: settings.l1.sweep_interval(),
            write_behind: settings.write_behind.clone(),
            ping_timeout: Duration::from_millis(settings.redis.timeout_ms),
            queue: Mutex::new(VecDeque::new()),
            counters: Counters::default(),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Wire a cold L3 store. Without one, L3 lookups are a no-op.
    pub fn with_cold_store(mut self, cold: Arc<dyn RemoteStore>) -> Self {
        self.cold = Some(cold);
        self
    }

    /// The configuration catalogue.
    pub fn catalog(&self) -> &ConfigCatalog {
        &self.catalog
    }

    /// Start the write-behind flush loop and the L1 expiry sweep.
    pub fn start(self: &Arc<Self>) {
        let mut handles = Vec::with_capacity(2);

        let manager = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.write_behind.flush_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.flush_write_behind().await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        }));

        let manager = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = manager.sweep_expired();
                        if removed > 0 {
                            tracing::debug!(removed, "swept expired L1 entries");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        }));

        self.tasks.lock().extend(handles);
        tracing::info!("tiered cache manager started");
    }

    /// Stop the background loops and issue one final write-behind flush so
    /// queued remote writes are not lost on an orderly shutdown.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        while self.write_behind_depth() > 0 {
            let flushed = self.flush_write_behind().await;
            if flushed == 0 {
                // Nothing flushable any more (persistent store failure).
                break;
            }
        }
        tracing::info!("tiered cache manager stopped");
    }

    /// Get a value by raw key under a named configuration.
    ///
    /// L1 is consulted first; on an L2 hit the value is promoted into L1
    /// (read-through promotion) when the configuration's declared tier is
    /// exactly L2. L3-tier configurations back-fill L2 and L1 on a cold hit.
    /// Remote store failures are counted and treated as misses.
    pub async fn get(&self, key: &str, config_name: &str) -> Result<Option<serde_json::Value>> {
        let config = self.catalog.get(config_name)?;
        let full_key = build_key(&config.key_prefix, key);
        let started = Instant::now();

        if let Some(value) = self.l1_get(&full_key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            self.counters.l1.hits.fetch_add(1, Ordering::Relaxed);
            self.counters.l1.record_latency(started);
            self.record_global_latency(started);
            tracing::debug!(key = %full_key, "cache hit (L1)");
            return Ok(Some(value));
        }
        self.counters.l1.misses.fetch_add(1, Ordering::Relaxed);

        if config.tier >= Tier::L2 {
            let l2_started = Instant::now();
            match self.store.get(&full_key).await {
                Ok(Some(raw)) => {
                    self.counters.l2.record_latency(l2_started);
                    match decode_value(&config, &raw) {
                        Ok(value) => {
                            self.counters.hits.fetch_add(1, Ordering::Relaxed);
                            self.counters.l2.hits.fetch_add(1, Ordering::Relaxed);
                            if config.tier == Tier::L2 {
                                let size = full_key.len() + raw.len();
                                self.l1_insert(full_key.clone(), value.clone(), config.ttl, size);
                            }
                            self.record_global_latency(started);
                            tracing::debug!(key = %full_key, "cache hit (L2)");
                            return Ok(Some(value));
                        }
                        Err(e) => {
                            tracing::warn!(key = %full_key, error = %e, "failed to decode cached value");
                            self.counters.errors.fetch_add(1, Ordering::Relaxed);
                            self.counters.l2.misses.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                Ok(None) => {
                    self.counters.l2.record_latency(l2_started);
                    self.counters.l2.misses.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::warn!(key = %full_key, error = %e, "remote store GET failed");
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    self.counters.l2.misses.fetch_add(1, Ordering::Relaxed);
                }
            }

            if config.tier == Tier::L3 {
                if let Some(value) = self.cold_lookup(&config, &full_key).await {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    self.record_global_latency(started);
                    return Ok(Some(value));
                }
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.record_global_latency(started);
        tracing::debug!(key = %full_key, "cache miss");
        Ok(None)
    }

    async fn cold_lookup(
        &self,
        config: &CacheConfig,
        full_key: &str,
    ) -> Option<serde_json::Value> {
        let cold = self.cold.as_ref()?;
        let started = Instant::now();
        match cold.get(full_key).await {
            Ok(Some(raw)) => {
                self.counters.l3.record_latency(started);
                match decode_value(config, &raw) {
                    Ok(value) => {
                        self.counters.l3.hits.fetch_add(1, Ordering::Relaxed);
                        // Back-fill the faster tiers on the way up.
                        if let Err(e) = self.store.set_ex(full_key, &raw, config.ttl).await {
                            tracing::warn!(key = %full_key, error = %e, "L2 back-fill failed");
                            self.counters.errors.fetch_add(1, Ordering::Relaxed);
                        }
                        let size = full_key.len() + raw.len();
                        self.l1_insert(full_key.to_string(), value.clone(), config.ttl, size);
                        tracing::debug!(key = %full_key, "cache hit (L3)");
                        Some(value)
                    }
                    Err(e) => {
                        tracing::warn!(key = %full_key, error = %e, "failed to decode cold value");
                        self.counters.errors.fetch_add(1, Ordering::Relaxed);
                        self.counters.l3.misses.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                }
            }
            Ok(None) => {
                self.counters.l3.record_latency(started);
                self.counters.l3.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "cold store GET failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                self.counters.l3.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value under a named configuration, honoring its strategy.
    ///
    /// Returns `Ok(false)` when a degraded remote write kept the call from
    /// completing (CacheAside); `WriteThrough` surfaces the failure instead.
    pub async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        config_name: &str,
        ttl_override: Option<Duration>,
    ) -> Result<bool> {
        let config = self.catalog.get(config_name)?;
        let full_key = build_key(&config.key_prefix, key);
        let ttl = ttl_override.unwrap_or(config.ttl);
        let wire = encode_value(&config, &value)?;
        let size = full_key.len() + wire.len();

        match config.strategy {
            WriteStrategy::CacheAside => {
                self.l1_insert(full_key.clone(), value, ttl, size);
                if config.tier >= Tier::L2 {
                    if let Err(e) = self.store.set_ex(&full_key, &wire, ttl).await {
                        tracing::warn!(key = %full_key, error = %e, "remote store SET failed");
                        self.counters.errors.fetch_add(1, Ordering::Relaxed);
                        return Ok(false);
                    }
                }
                if config.tier == Tier::L3 {
                    if let Some(cold) = &self.cold {
                        if let Err(e) = cold.set_ex(&full_key, &wire, ttl).await {
                            tracing::warn!(key = %full_key, error = %e, "cold store SET failed");
                            self.counters.errors.fetch_add(1, Ordering::Relaxed);
                            return Ok(false);
                        }
                    }
                }
                Ok(true)
            }
            WriteStrategy::WriteThrough => {
                self.l1_insert(full_key.clone(), value, ttl, size);
                let mut writes: Vec<
                    std::pin::Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>,
                > = Vec::new();
                if config.tier >= Tier::L2 {
                    writes.push(self.store.set_ex(&full_key, &wire, ttl));
                }
                if config.tier == Tier::L3 {
                    if let Some(cold) = &self.cold {
                        writes.push(cold.set_ex(&full_key, &wire, ttl));
                    }
                }
                match futures_util::future::try_join_all(writes).await {
                    Ok(_) => Ok(true),
                    Err(e) => {
                        self.counters.errors.fetch_add(1, Ordering::Relaxed);
                        Err(e)
                    }
                }
            }
            WriteStrategy::WriteBehind => {
                self.l1_insert(full_key.clone(), value, ttl, size);
                if config.tier >= Tier::L2 {
                    self.queue.lock().push_back(WriteBehindItem {
                        key: full_key,
                        wire,
                        ttl,
                        attempts: 0,
                    });
                }
                Ok(true)
            }
        }
    }

    /// Remove a key from every tier the configuration uses.
    ///
    /// Idempotent: invalidating an absent key is a successful no-op.
    pub async fn invalidate(&self, key: &str, config_name: &str) -> Result<bool> {
        let config = self.catalog.get(config_name)?;
        let full_key = build_key(&config.key_prefix, key);

        self.l1_remove(&full_key);

        if config.tier >= Tier::L2 {
            if let Err(e) = self.store.del(std::slice::from_ref(&full_key)).await {
                tracing::warn!(key = %full_key, error = %e, "remote store DEL failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                return Ok(false);
            }
        }
        if config.tier == Tier::L3 {
            if let Some(cold) = &self.cold {
                if let Err(e) = cold.del(std::slice::from_ref(&full_key)).await {
                    tracing::warn!(key = %full_key, error = %e, "cold store DEL failed");
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    return Ok(false);
                }
            }
        }
        tracing::debug!(key = %full_key, "cache invalidated");
        Ok(true)
    }

    /// Delete all keys matching a glob from the remote store (one batched
    /// round trip) and from L1. Returns the number of entries removed.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<u64> {
        Ok(self.invalidate_pattern_detailed(pattern).await?.len() as u64)
    }

    /// Like [`invalidate_pattern`](Self::invalidate_pattern), but returns the
    /// removed keys themselves (for invalidation-event reporting).
    pub async fn invalidate_pattern_detailed(&self, pattern: &str) -> Result<Vec<String>> {
        let mut removed = match self.store.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "remote store KEYS failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            }
        };

        if !removed.is_empty() {
            if let Err(e) = self.store.del(&removed).await {
                tracing::warn!(pattern = %pattern, error = %e, "remote store DEL failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                removed.clear();
            }
        }

        let local_matches: Vec<String> = self
            .l1
            .iter()
            .filter(|entry| glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        for key in local_matches {
            self.l1_remove(&key);
            if !removed.contains(&key) {
                removed.push(key);
            }
        }

        tracing::debug!(pattern = %pattern, removed = removed.len(), "pattern invalidation");
        Ok(removed)
    }

    /// List live remote keys matching a glob. Transport failures surface to
    /// the caller (used by the pattern-based invalidation sweep).
    pub async fn remote_keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.store.keys(pattern).await
    }

    /// Return the cached value, or invoke `loader`, cache its result, and
    /// return it. Loader failures are logged and yield an absent result.
    pub async fn warm_cache<F, Fut>(
        &self,
        key: &str,
        config_name: &str,
        loader: F,
    ) -> Result<Option<serde_json::Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value>>,
    {
        if let Some(value) = self.get(key, config_name).await? {
            return Ok(Some(value));
        }

        match loader().await {
            Ok(value) => {
                self.set(key, value.clone(), config_name, None).await?;
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!(key = %key, config = %config_name, error = %e, "cache loader failed");
                Ok(None)
            }
        }
    }

    /// Whether any live key (L1 or remote) matches `pattern`.
    ///
    /// Used by dependency-based invalidation. A remote transport failure is
    /// reported as "exists" so a flaky store cannot trigger spurious
    /// invalidation.
    pub async fn any_key_matches(&self, pattern: &str) -> bool {
        let local = self
            .l1
            .iter()
            .any(|entry| !entry.is_expired() && glob_match(pattern, entry.key()));
        if local {
            return true;
        }

        if pattern.contains('*') {
            match self.store.keys(pattern).await {
                Ok(keys) => !keys.is_empty(),
                Err(_) => true,
            }
        } else {
            self.store.exists(pattern).await.unwrap_or(true)
        }
    }

    /// Ping the remote store with a bounded timeout.
    pub async fn health_check(&self) -> HealthCheck {
        let started = Instant::now();
        let ping = tokio::time::timeout(self.ping_timeout, self.store.ping()).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let check = match ping {
            Ok(Ok(())) => HealthCheck::healthy("remote store reachable"),
            Ok(Err(e)) => HealthCheck::unhealthy(format!("remote store ping failed: {e}")),
            Err(_) => HealthCheck::unhealthy("remote store ping timed out"),
        };
        let l2_status = if check.status == tradecache_core::HealthStatus::Healthy {
            "healthy"
        } else {
            "unhealthy"
        };
        check
            .with_response_time(latency_ms)
            .with_detail("store", serde_json::json!(self.store.name()))
            .with_detail("l1", serde_json::json!("healthy"))
            .with_detail("l1Entries", serde_json::json!(self.l1.len()))
            .with_detail("l2", serde_json::json!(l2_status))
            .with_detail(
                "l3",
                serde_json::json!(if self.cold.is_some() { "wired" } else { "stubbed" }),
            )
    }

    /// Current statistics snapshot.
    pub fn stats(&self) -> CacheManagerStats {
        let c = &self.counters;
        let hits = c.hits.load(Ordering::Relaxed);
        let misses = c.misses.load(Ordering::Relaxed);
        let l1_bytes = c.l1_bytes.load(Ordering::Relaxed);
        CacheManagerStats {
            hits,
            misses,
            errors: c.errors.load(Ordering::Relaxed),
            evictions: c.evictions.load(Ordering::Relaxed),
            hit_rate: hit_rate(hits, misses),
            avg_latency_ms: avg_latency_ms(
                c.latency_micros.load(Ordering::Relaxed),
                c.latency_samples.load(Ordering::Relaxed),
            ),
            memory_bytes: l1_bytes,
            l1: c.l1.snapshot(l1_bytes, self.l1.len()),
            l2: c.l2.snapshot(0, 0),
            l3: c.l3.snapshot(0, 0),
            write_behind_depth: self.write_behind_depth(),
        }
    }

    /// Pending write-behind items.
    pub fn write_behind_depth(&self) -> usize {
        self.queue.lock().len()
    }

    /// L1 occupancy as a percentage of capacity.
    pub fn l1_occupancy_pct(&self) -> f64 {
        (self.l1.len() as f64 / self.l1_max_entries as f64) * 100.0
    }

    /// Flush up to one batch of write-behind items to the remote store.
    ///
    /// FIFO within the queue; a failed batch is re-queued at the front with
    /// incremented attempt counts, and items past the retry cap are dropped.
    /// Returns the number of items flushed.
    pub async fn flush_write_behind(&self) -> usize {
        let batch: Vec<WriteBehindItem> = {
            let mut queue = self.queue.lock();
            let take = queue.len().min(self.write_behind.batch_size);
            queue.drain(..take).collect()
        };
        if batch.is_empty() {
            return 0;
        }

        let items: Vec<(String, String, Duration)> = batch
            .iter()
            .map(|item| (item.key.clone(), item.wire.clone(), item.ttl))
            .collect();

        match self.store.set_many(&items).await {
            Ok(()) => {
                tracing::debug!(count = batch.len(), "write-behind flush");
                batch.len()
            }
            Err(e) => {
                tracing::warn!(error = %e, count = batch.len(), "write-behind flush failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                let mut queue = self.queue.lock();
                for mut item in batch.into_iter().rev() {
                    item.attempts += 1;
                    if item.attempts >= self.write_behind.max_retries {
                        tracing::error!(
                            key = %item.key,
                            attempts = item.attempts,
                            "dropping write-behind item after repeated flush failures"
                        );
                    } else {
                        queue.push_front(item);
                    }
                }
                0
            }
        }
    }

    /// Remove logically-expired L1 entries. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let mut removed = 0usize;
        let mut freed = 0u64;
        self.l1.retain(|_, entry| {
            if entry.is_expired() {
                removed += 1;
                freed += entry.size_bytes as u64;
                false
            } else {
                true
            }
        });
        if freed > 0 {
            self.counters.l1_bytes.fetch_sub(freed, Ordering::Relaxed);
        }
        removed
    }

    fn record_global_latency(&self, started: Instant) {
        self.counters
            .latency_micros
            .fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.counters.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    fn l1_get(&self, full_key: &str) -> Option<serde_json::Value> {
        if let Some(mut entry) = self.l1.get_mut(full_key) {
            if !entry.is_expired() {
                entry.touch();
                return Some(entry.value.clone());
            }
        }
        // Lazily drop the expired entry outside the read guard.
        self.l1_remove(full_key);
        None
    }

    fn l1_insert(&self, full_key: String, value: serde_json::Value, ttl: Duration, size: usize) {
        if !self.l1.contains_key(&full_key) && self.l1.len() >= self.l1_max_entries {
            self.evict_least_recently_accessed();
        }
        let entry = L1Entry::new(value, ttl, size);
        self.counters
            .l1_bytes
            .fetch_add(size as u64, Ordering::Relaxed);
        if let Some(old) = self.l1.insert(full_key, entry) {
            self.counters
                .l1_bytes
                .fetch_sub(old.size_bytes as u64, Ordering::Relaxed);
        }
    }

    fn l1_remove(&self, full_key: &str) {
        if let Some((_, old)) = self.l1.remove(full_key) {
            self.counters
                .l1_bytes
                .fetch_sub(old.size_bytes as u64, Ordering::Relaxed);
        }
    }

    fn evict_least_recently_accessed(&self) {
        let victim = self
            .l1
            .iter()
            .min_by_key(|entry| entry.last_accessed_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            self.l1_remove(&key);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "evicted least-recently-accessed L1 entry");
        }
    }
}

fn encode_value(config: &CacheConfig, value: &serde_json::Value) -> Result<String> {
    if config.serialize {
        Ok(serde_json::to_string(value)?)
    } else {
        Ok(match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

fn decode_value(config: &CacheConfig, raw: &str) -> Result<serde_json::Value> {
    if config.serialize {
        Ok(serde_json::from_str(raw)?)
    } else {
        Ok(serde_json::Value::String(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use tradecache_core::CacheError;

    fn test_settings() -> EngineSettings {
        let mut settings = EngineSettings::default();
        settings.l1.max_entries = 3;
        settings.write_behind.flush_interval_ms = 50;
        settings.write_behind.batch_size = 10;
        settings
    }

    fn test_catalog() -> ConfigCatalog {
        let mut catalog = ConfigCatalog::new();
        catalog.register(CacheConfig::new(
            "aside",
            Duration::from_secs(60),
            "a:",
            Tier::L2,
            WriteStrategy::CacheAside,
        ));
        catalog.register(CacheConfig::new(
            "local_only",
            Duration::from_secs(60),
            "lo:",
            Tier::L1,
            WriteStrategy::CacheAside,
        ));
        catalog.register(CacheConfig::new(
            "behind",
            Duration::from_secs(60),
            "b:",
            Tier::L2,
            WriteStrategy::WriteBehind,
        ));
        catalog
    }

    fn manager_with(store: Arc<MemoryStore>) -> TieredCacheManager {
        TieredCacheManager::new(test_catalog(), store, &test_settings())
    }

    #[tokio::test]
    async fn test_unknown_config_errors() {
        let manager = manager_with(Arc::new(MemoryStore::new()));
        let err = manager.get("k", "nope").await.unwrap_err();
        assert!(matches!(err, CacheError::UnknownConfig(_)));
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let manager = manager_with(Arc::new(MemoryStore::new()));
        assert!(manager.set("k", json!({"v": 1}), "aside", None).await.unwrap());
        let value = manager.get("k", "aside").await.unwrap();
        assert_eq!(value, Some(json!({"v": 1})));
    }

    #[tokio::test]
    async fn test_l2_promotion_after_l1_loss() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(Arc::clone(&store));
        manager.set("k", json!(7), "aside", None).await.unwrap();

        // Drop L1 so the next read must come from the remote store.
        manager.l1_remove("a:k");
        assert_eq!(manager.get("k", "aside").await.unwrap(), Some(json!(7)));

        // The read-through promotion repopulated L1.
        assert!(manager.l1.contains_key("a:k"));
        assert_eq!(manager.stats().l2.hits, 1);
    }

    #[tokio::test]
    async fn test_l1_only_config_never_touches_store() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(Arc::clone(&store));
        manager.set("k", json!(1), "local_only", None).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(manager.get("k", "local_only").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_lru_eviction_at_capacity() {
        let manager = manager_with(Arc::new(MemoryStore::new()));
        manager.set("k1", json!(1), "local_only", None).await.unwrap();
        manager.set("k2", json!(2), "local_only", None).await.unwrap();
        manager.set("k3", json!(3), "local_only", None).await.unwrap();

        // Touch k1 and k3 so k2 is the least recently accessed.
        tokio::time::sleep(Duration::from_millis(5)).await;
        manager.get("k1", "local_only").await.unwrap();
        manager.get("k3", "local_only").await.unwrap();

        manager.set("k4", json!(4), "local_only", None).await.unwrap();
        assert_eq!(manager.l1.len(), 3);
        assert!(manager.get("k2", "local_only").await.unwrap().is_none());
        assert_eq!(manager.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_lazy_expiry() {
        let mut catalog = ConfigCatalog::new();
        catalog.register(CacheConfig::new(
            "short",
            Duration::from_millis(30),
            "s:",
            Tier::L1,
            WriteStrategy::CacheAside,
        ));
        let manager =
            TieredCacheManager::new(catalog, Arc::new(MemoryStore::new()), &test_settings());

        manager.set("k", json!(1), "short", None).await.unwrap();
        assert!(manager.get("k", "short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        // No sweep has run; expiry is detected lazily on read.
        assert!(manager.get("k", "short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let manager = manager_with(Arc::new(MemoryStore::new()));
        manager.set("k", json!(1), "aside", None).await.unwrap();

        assert!(manager.invalidate("k", "aside").await.unwrap());
        assert!(manager.get("k", "aside").await.unwrap().is_none());
        // Absent key: still a successful no-op.
        assert!(manager.invalidate("k", "aside").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_behind_flush_persists_to_l2() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(Arc::clone(&store));

        manager.set("k", json!(42), "behind", None).await.unwrap();
        // Immediately visible from L1, not yet remote.
        assert_eq!(manager.get("k", "behind").await.unwrap(), Some(json!(42)));
        assert!(store.is_empty());
        assert_eq!(manager.write_behind_depth(), 1);

        assert_eq!(manager.flush_write_behind().await, 1);
        assert_eq!(manager.write_behind_depth(), 0);

        // After an L1 loss the value survives in L2.
        manager.l1_remove("b:k");
        assert_eq!(manager.get("k", "behind").await.unwrap(), Some(json!(42)));
    }

    #[tokio::test]
    async fn test_invalidate_pattern() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(Arc::clone(&store));
        manager.set("x1", json!(1), "aside", None).await.unwrap();
        manager.set("x2", json!(2), "aside", None).await.unwrap();
        manager.set("other", json!(3), "behind", None).await.unwrap();

        let removed = manager.invalidate_pattern("a:*").await.unwrap();
        assert_eq!(removed, 2);
        assert!(manager.get("x1", "aside").await.unwrap().is_none());
        assert!(manager.get("x2", "aside").await.unwrap().is_none());
        assert_eq!(manager.get("other", "behind").await.unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_warm_cache_invokes_loader_once() {
        let manager = manager_with(Arc::new(MemoryStore::new()));

        let value = manager
            .warm_cache("k", "aside", || async { Ok(json!("loaded")) })
            .await
            .unwrap();
        assert_eq!(value, Some(json!("loaded")));

        // Second call is served from cache; a panicking loader proves it.
        let value = manager
            .warm_cache("k", "aside", || async { unreachable!() })
            .await
            .unwrap();
        assert_eq!(value, Some(json!("loaded")));
    }

    #[tokio::test]
    async fn test_warm_cache_loader_failure_is_absent() {
        let manager = manager_with(Arc::new(MemoryStore::new()));
        let value = manager
            .warm_cache("k", "aside", || async {
                Err(CacheError::loader("feed down"))
            })
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let mut catalog = ConfigCatalog::new();
        catalog.register(CacheConfig::new(
            "short",
            Duration::from_millis(20),
            "s:",
            Tier::L1,
            WriteStrategy::CacheAside,
        ));
        let manager =
            TieredCacheManager::new(catalog, Arc::new(MemoryStore::new()), &test_settings());

        manager.set("k1", json!(1), "short", None).await.unwrap();
        manager.set("k2", json!(2), "short", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(manager.sweep_expired(), 2);
        assert_eq!(manager.l1.len(), 0);
        assert_eq!(manager.stats().memory_bytes, 0);
    }

    #[tokio::test]
    async fn test_health_check_healthy() {
        let manager = manager_with(Arc::new(MemoryStore::new()));
        let check = manager.health_check().await;
        assert_eq!(check.status, tradecache_core::HealthStatus::Healthy);
        assert!(check.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_stats_hit_rate() {
        let manager = manager_with(Arc::new(MemoryStore::new()));
        manager.set("k", json!(1), "aside", None).await.unwrap();
        manager.get("k", "aside").await.unwrap();
        manager.get("missing", "aside").await.unwrap();

        let stats = manager.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }
}
