//! Rule-driven invalidation engine.
//!
//! `invalidate(pattern, context)` matches the request pattern against the
//! rule table glob-vs-glob, executes every matching enabled rule in
//! descending priority order, and returns one `InvalidationEvent` per rule.
//! Rules execute independently; one rule's failure never stops the others.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tradecache_core::{CacheError, CacheEvent, CacheEventBus, HealthCheck};

use super::rules::{default_rules, InvalidationEvent, InvalidationRule, InvalidationStrategy};
use crate::cache::TieredCacheManager;
use crate::domain::TradingCache;
use crate::glob::{glob_to_regex, globs_overlap};
use crate::settings::InvalidationSettings;

const EVENT_HISTORY_LIMIT: usize = 1000;

/// Exponential running mean weight for per-rule processing time.
const PROCESSING_TIME_ALPHA: f64 = 0.1;

/// Optional identifiers accompanying an invalidation request, used to target
/// the domain-layer cascades.
#[derive(Debug, Clone, Default)]
pub struct InvalidationContext {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

/// Running totals exposed by `get_stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationStats {
    pub total_invalidations: u64,
    pub successful_invalidations: u64,
    pub failed_invalidations: u64,
    pub rules_processed: u64,
    pub avg_processing_time_ms: f64,
    pub queue_depth: usize,
    pub enabled_rules: usize,
    /// `100 * successful / total`, 0 when nothing has run.
    pub success_rate: f64,
}

#[derive(Default)]
struct StatsInner {
    attempted: u64,
    succeeded: u64,
    failed: u64,
    rules_processed: u64,
    avg_processing_ms: f64,
    samples: u64,
}

struct LazyItem {
    rule: InvalidationRule,
    context: InvalidationContext,
}

/// The invalidation rule engine.
pub struct InvalidationEngine {
    manager: Arc<TieredCacheManager>,
    domain: Arc<TradingCache>,
    events: CacheEventBus,
    rules: RwLock<BTreeMap<String, InvalidationRule>>,
    queue: Mutex<VecDeque<LazyItem>>,
    history: Mutex<VecDeque<InvalidationEvent>>,
    stats: Mutex<StatsInner>,
    settings: InvalidationSettings,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl InvalidationEngine {
    /// Engine seeded with the default rule table.
    pub fn new(
        manager: Arc<TieredCacheManager>,
        domain: Arc<TradingCache>,
        events: CacheEventBus,
        settings: InvalidationSettings,
    ) -> Self {
        Self::with_rules(manager, domain, events, settings, default_rules())
    }

    /// Engine with a caller-provided rule table.
    pub fn with_rules(
        manager: Arc<TieredCacheManager>,
        domain: Arc<TradingCache>,
        events: CacheEventBus,
        settings: InvalidationSettings,
        rules: Vec<InvalidationRule>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            manager,
            domain,
            events,
            rules: RwLock::new(rules.into_iter().map(|r| (r.id.clone(), r)).collect()),
            queue: Mutex::new(VecDeque::new()),
            history: Mutex::new(VecDeque::new()),
            stats: Mutex::new(StatsInner::default()),
            settings,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the lazy-queue drain loop.
    pub fn start(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.settings.drain_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.process_lazy_batch().await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        self.tasks.lock().push(handle);
        tracing::info!("invalidation engine started");
    }

    /// Stop the background tasks, then drain the lazy queue synchronously so
    /// no queued invalidation is silently dropped. Shutdown time is bounded
    /// by queue depth times per-item cost.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        loop {
            if self.process_lazy_batch().await == 0 {
                break;
            }
        }
        tracing::info!("invalidation engine stopped");
    }

    /// Evaluate an invalidation request against the rule table.
    ///
    /// All enabled rules whose pattern overlaps the request pattern fire, in
    /// descending priority order; each produces an event regardless of the
    /// others' outcome.
    pub async fn invalidate(
        self: &Arc<Self>,
        pattern: &str,
        context: Option<InvalidationContext>,
    ) -> Vec<InvalidationEvent> {
        let context = context.unwrap_or_default();
        let mut matching: Vec<InvalidationRule> = self
            .rules
            .read()
            .values()
            .filter(|rule| rule.enabled && globs_overlap(&rule.pattern, pattern))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

        let mut events = Vec::with_capacity(matching.len());
        for rule in matching {
            let event = self.execute_rule(&rule, &context).await;
            if let Some(stored) = self.rules.write().get_mut(&rule.id) {
                stored.last_triggered_at = Some(tradecache_core::time::now_utc());
            }
            self.push_history(event.clone());
            events.push(event);
        }
        events
    }

    async fn execute_rule(
        self: &Arc<Self>,
        rule: &InvalidationRule,
        context: &InvalidationContext,
    ) -> InvalidationEvent {
        let started = Instant::now();
        let event = match &rule.strategy {
            InvalidationStrategy::Immediate => self.execute_immediate(rule, context).await,
            InvalidationStrategy::Lazy => {
                self.queue.lock().push_back(LazyItem {
                    rule: rule.clone(),
                    context: context.clone(),
                });
                InvalidationEvent::success(rule, vec!["queued".into()])
            }
            InvalidationStrategy::TimeBased { ttl } => {
                if ttl.is_zero() {
                    InvalidationEvent::failure(rule, CacheError::missing_ttl(&rule.id))
                } else {
                    self.schedule_time_based(rule.clone(), context.clone(), *ttl);
                    InvalidationEvent::success(rule, vec!["scheduled".into()])
                }
            }
            InvalidationStrategy::DependencyBased { dependencies } => {
                if dependencies.is_empty() {
                    InvalidationEvent::failure(rule, CacheError::missing_dependencies(&rule.id))
                } else {
                    let mut any_missing = false;
                    for dependency in dependencies {
                        if !self.manager.any_key_matches(dependency).await {
                            any_missing = true;
                            break;
                        }
                    }
                    if any_missing {
                        self.execute_immediate(rule, context).await
                    } else {
                        // Every dependency still cached: the data is taken as
                        // valid and nothing is invalidated.
                        InvalidationEvent::success(rule, Vec::new())
                    }
                }
            }
            InvalidationStrategy::PatternBased => self.execute_pattern_based(rule).await,
        };
        self.record_stats(&event, started.elapsed());
        event
    }

    async fn execute_immediate(
        &self,
        rule: &InvalidationRule,
        context: &InvalidationContext,
    ) -> InvalidationEvent {
        match self
            .manager
            .invalidate_pattern_detailed(&rule.pattern)
            .await
        {
            Ok(affected) => {
                self.cascade(&rule.pattern, context).await;
                InvalidationEvent::success(rule, affected)
            }
            Err(e) => InvalidationEvent::failure(rule, e),
        }
    }

    /// Cascade namespace sweeps into the domain layer. Session and
    /// trading-session namespaces clear session data; portfolio and user
    /// namespaces clear user data. The target id comes from the request
    /// context, or from the rule pattern itself when it names a single key.
    async fn cascade(&self, rule_pattern: &str, context: &InvalidationContext) {
        if rule_pattern.starts_with("session:") || rule_pattern.starts_with("ts:") {
            let session_id = context
                .session_id
                .clone()
                .or_else(|| concrete_suffix(rule_pattern));
            if let Some(id) = session_id {
                if let Err(e) = self.domain.invalidate_session_data(&id).await {
                    tracing::warn!(session_id = %id, error = %e, "session cascade failed");
                }
            }
        }
        if rule_pattern.starts_with("portfolio:") || rule_pattern.starts_with("user:") {
            let user_id = context
                .user_id
                .clone()
                .or_else(|| concrete_suffix(rule_pattern));
            if let Some(id) = user_id {
                if let Err(e) = self.domain.invalidate_user_data(&id).await {
                    tracing::warn!(user_id = %id, error = %e, "user cascade failed");
                }
            }
        }
    }

    async fn execute_pattern_based(&self, rule: &InvalidationRule) -> InvalidationEvent {
        let regex = match glob_to_regex(&rule.pattern) {
            Ok(regex) => regex,
            Err(e) => return InvalidationEvent::failure(rule, e),
        };
        let all_keys = match self.manager.remote_keys("*").await {
            Ok(keys) => keys,
            Err(e) => return InvalidationEvent::failure(rule, e),
        };

        let mut affected = Vec::new();
        for key in all_keys.into_iter().filter(|k| regex.is_match(k)) {
            match self.manager.invalidate_pattern_detailed(&key).await {
                Ok(removed) => affected.extend(removed),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "pattern-based invalidation failed for key");
                }
            }
        }
        InvalidationEvent::success(rule, affected)
    }

    fn schedule_time_based(
        self: &Arc<Self>,
        rule: InvalidationRule,
        context: InvalidationContext,
        ttl: Duration,
    ) {
        let engine = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(ttl) => {
                    let started = Instant::now();
                    let event = engine.execute_immediate(&rule, &context).await;
                    engine.record_stats(&event, started.elapsed());
                    engine.push_history(event);
                }
                _ = shutdown_rx.changed() => {
                    tracing::debug!(rule_id = %rule.id, "time-based invalidation cancelled by shutdown");
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    /// Process up to one batch from the lazy queue, executing each item as
    /// Immediate. Returns the number processed.
    pub async fn process_lazy_batch(&self) -> usize {
        let batch: Vec<LazyItem> = {
            let mut queue = self.queue.lock();
            let take = queue.len().min(self.settings.drain_batch_size);
            queue.drain(..take).collect()
        };
        let count = batch.len();
        for item in batch {
            let started = Instant::now();
            let event = self.execute_immediate(&item.rule, &item.context).await;
            self.record_stats(&event, started.elapsed());
            self.push_history(event);
        }
        if count > 0 {
            tracing::debug!(count, "drained lazy invalidation queue");
        }
        count
    }

    /// Add or replace a rule.
    pub fn add_rule(&self, rule: InvalidationRule) {
        let rule_id = rule.id.clone();
        self.rules.write().insert(rule_id.clone(), rule);
        self.events.send(CacheEvent::RuleAdded { rule_id });
    }

    /// Remove a rule; returns whether one existed.
    pub fn remove_rule(&self, id: &str) -> bool {
        let removed = self.rules.write().remove(id).is_some();
        if removed {
            self.events.send(CacheEvent::RuleRemoved {
                rule_id: id.to_string(),
            });
        }
        removed
    }

    /// Replace an existing rule; returns false if the id is unknown.
    pub fn update_rule(&self, rule: InvalidationRule) -> bool {
        let mut rules = self.rules.write();
        if let std::collections::btree_map::Entry::Occupied(mut entry) =
            rules.entry(rule.id.clone())
        {
            entry.insert(rule);
            true
        } else {
            false
        }
    }

    pub fn get_rule(&self, id: &str) -> Option<InvalidationRule> {
        self.rules.read().get(id).cloned()
    }

    /// All rules, ordered by id.
    pub fn rules(&self) -> Vec<InvalidationRule> {
        self.rules.read().values().cloned().collect()
    }

    /// Most recent invalidation events, newest last.
    pub fn recent_events(&self, limit: usize) -> Vec<InvalidationEvent> {
        let history = self.history.lock();
        history
            .iter()
            .rev()
            .take(limit)
            .rev()
            .cloned()
            .collect()
    }

    pub fn get_stats(&self) -> InvalidationStats {
        let inner = self.stats.lock();
        let success_rate = if inner.attempted == 0 {
            0.0
        } else {
            (inner.succeeded as f64 / inner.attempted as f64) * 100.0
        };
        InvalidationStats {
            total_invalidations: inner.attempted,
            successful_invalidations: inner.succeeded,
            failed_invalidations: inner.failed,
            rules_processed: inner.rules_processed,
            avg_processing_time_ms: inner.avg_processing_ms,
            queue_depth: self.queue.lock().len(),
            enabled_rules: self.rules.read().values().filter(|r| r.enabled).count(),
            success_rate,
        }
    }

    /// Healthy above a 90% success rate (a fresh engine with no executions
    /// reports healthy), degraded otherwise.
    pub fn health_check(&self) -> HealthCheck {
        let stats = self.get_stats();
        let check = if stats.total_invalidations == 0 || stats.success_rate > 90.0 {
            HealthCheck::healthy("invalidation engine operating normally")
        } else {
            HealthCheck::degraded(format!(
                "invalidation success rate at {:.1}%",
                stats.success_rate
            ))
        };
        check
            .with_detail("successRate", serde_json::json!(stats.success_rate))
            .with_detail("queueDepth", serde_json::json!(stats.queue_depth))
    }

    fn record_stats(&self, event: &InvalidationEvent, elapsed: Duration) {
        let mut inner = self.stats.lock();
        inner.attempted += 1;
        if event.success {
            inner.succeeded += 1;
        } else {
            inner.failed += 1;
        }
        inner.rules_processed += 1;
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if inner.samples == 0 {
            inner.avg_processing_ms = elapsed_ms;
        } else {
            inner.avg_processing_ms = inner.avg_processing_ms * (1.0 - PROCESSING_TIME_ALPHA)
                + elapsed_ms * PROCESSING_TIME_ALPHA;
        }
        inner.samples += 1;
    }

    fn push_history(&self, event: InvalidationEvent) {
        let mut history = self.history.lock();
        if history.len() >= EVENT_HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(event);
    }
}

/// The part after the namespace separator, when it names a single key
/// (no wildcard).
fn concrete_suffix(pattern: &str) -> Option<String> {
    let (_, suffix) = pattern.split_once(':')?;
    if suffix.is_empty() || suffix.contains('*') {
        None
    } else {
        Some(suffix.to_string())
    }
}
