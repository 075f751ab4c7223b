//! Monitoring & alerting service.
//!
//! Sits off the request path: on a fixed interval it reads the other
//! components' stats into a [`MetricsSnapshot`], appends to a bounded
//! history, and evaluates every enabled alert rule against the new snapshot.
//! One tick's failure is logged and never stops the polling loop.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tradecache_core::events::AlertNotification;
use tradecache_core::time::elapsed_since;
use tradecache_core::{CacheEventBus, HealthCheck, Result};

use super::alerts::{default_alert_rules, Alert, AlertRule};
use super::metrics::MetricsSnapshot;
use crate::cache::TieredCacheManager;
use crate::domain::TradingCache;
use crate::invalidation::InvalidationEngine;
use crate::settings::MonitoringSettings;

/// Aggregated report over a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub period: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    /// Number of snapshots that fell inside the window.
    pub snapshot_count: usize,
    pub averages: MetricsSnapshot,
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<String>,
}

/// The monitoring & alerting service.
pub struct MonitoringService {
    manager: Arc<TieredCacheManager>,
    domain: Arc<TradingCache>,
    invalidation: Arc<InvalidationEngine>,
    events: CacheEventBus,
    settings: MonitoringSettings,
    history: Mutex<VecDeque<MetricsSnapshot>>,
    alert_rules: RwLock<BTreeMap<String, AlertRule>>,
    alerts: Mutex<VecDeque<Alert>>,
    eviction_baseline: Mutex<Option<(u64, Instant)>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MonitoringService {
    /// Service seeded with the default alert rules.
    pub fn new(
        manager: Arc<TieredCacheManager>,
        domain: Arc<TradingCache>,
        invalidation: Arc<InvalidationEngine>,
        events: CacheEventBus,
        settings: MonitoringSettings,
    ) -> Self {
        Self::with_alert_rules(
            manager,
            domain,
            invalidation,
            events,
            settings,
            default_alert_rules(),
        )
    }

    /// Service with a caller-provided alert rule set.
    pub fn with_alert_rules(
        manager: Arc<TieredCacheManager>,
        domain: Arc<TradingCache>,
        invalidation: Arc<InvalidationEngine>,
        events: CacheEventBus,
        settings: MonitoringSettings,
        rules: Vec<AlertRule>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            manager,
            domain,
            invalidation,
            events,
            settings,
            history: Mutex::new(VecDeque::new()),
            alert_rules: RwLock::new(rules.into_iter().map(|r| (r.id.clone(), r)).collect()),
            alerts: Mutex::new(VecDeque::new()),
            eviction_baseline: Mutex::new(None),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the collection loop.
    pub fn start(self: &Arc<Self>) {
        let service = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(service.settings.collection_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = service.collect_and_evaluate() {
                            tracing::error!(error = %e, "metrics collection tick failed");
                        }
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
        tracing::info!("monitoring service started");
    }

    /// Stop the collection loop.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        tracing::info!("monitoring service stopped");
    }

    /// One collection tick: snapshot, append to history, evaluate alerts.
    pub fn collect_and_evaluate(&self) -> Result<MetricsSnapshot> {
        let snapshot = self.collect_snapshot();
        {
            let mut history = self.history.lock();
            if history.len() >= self.settings.history_limit {
                history.pop_front();
            }
            history.push_back(snapshot.clone());
        }
        self.evaluate_alerts(&snapshot)?;
        Ok(snapshot)
    }

    fn collect_snapshot(&self) -> MetricsSnapshot {
        let manager_stats = self.manager.stats();
        let eviction_rate = {
            let mut baseline = self.eviction_baseline.lock();
            let now = Instant::now();
            let rate = match *baseline {
                Some((prev_evictions, prev_at)) => {
                    let elapsed = now.duration_since(prev_at).as_secs_f64();
                    if elapsed > 0.0 {
                        let delta = manager_stats.evictions.saturating_sub(prev_evictions);
                        delta as f64 * 60.0 / elapsed
                    } else {
                        0.0
                    }
                }
                None => 0.0,
            };
            *baseline = Some((manager_stats.evictions, now));
            rate
        };

        MetricsSnapshot::from_stats(
            &manager_stats,
            &self.domain.stats(),
            &self.invalidation.get_stats(),
            self.manager.l1_occupancy_pct(),
            eviction_rate,
        )
    }

    /// Evaluate every enabled alert rule against a snapshot. Returns the
    /// alerts raised this round.
    pub fn evaluate_alerts(&self, snapshot: &MetricsSnapshot) -> Result<Vec<Alert>> {
        let doc = serde_json::to_value(snapshot)?;
        let rules: Vec<AlertRule> = self.alert_rules.read().values().cloned().collect();
        let mut raised = Vec::new();

        for rule in rules {
            if !rule.enabled {
                continue;
            }
            if let Some(last) = rule.last_triggered_at {
                if elapsed_since(last) < rule.cooldown {
                    continue;
                }
            }
            // Absent metric path: skip the rule.
            let Some(value) = resolve_metric(&doc, &rule.metric) else {
                continue;
            };
            if !rule.operator.apply(value, rule.threshold) {
                continue;
            }

            let alert = Alert::from_rule(&rule, value);
            tracing::warn!(
                rule_id = %rule.id,
                metric = %rule.metric,
                value,
                threshold = rule.threshold,
                severity = %rule.severity,
                "alert raised"
            );
            {
                let mut alerts = self.alerts.lock();
                if alerts.len() >= self.settings.alert_history_limit {
                    alerts.pop_front();
                }
                alerts.push_back(alert.clone());
            }
            if let Some(stored) = self.alert_rules.write().get_mut(&rule.id) {
                stored.last_triggered_at = Some(tradecache_core::time::now_utc());
            }
            self.events.send_alert(AlertNotification {
                alert_id: alert.id.clone(),
                rule_id: alert.rule_id.clone(),
                metric: alert.metric.clone(),
                severity: alert.severity,
                message: alert.message.clone(),
            });
            raised.push(alert);
        }
        Ok(raised)
    }

    /// Aggregate the history over `[start, end]` into a report.
    ///
    /// With no snapshots in the window, the latest snapshot stands in; with
    /// no history at all, an all-zero snapshot does.
    pub fn generate_report(
        &self,
        period: impl Into<String>,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> PerformanceReport {
        let history = self.history.lock();
        let window: Vec<MetricsSnapshot> = history
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .cloned()
            .collect();
        let snapshot_count = window.len();
        let averages = if window.is_empty() {
            history
                .back()
                .cloned()
                .unwrap_or_else(MetricsSnapshot::zero)
        } else {
            MetricsSnapshot::average(&window)
        };
        drop(history);

        let alerts: Vec<Alert> = self
            .alerts
            .lock()
            .iter()
            .filter(|a| a.timestamp >= start && a.timestamp <= end)
            .cloned()
            .collect();

        PerformanceReport {
            period: period.into(),
            start_time: start,
            end_time: end,
            snapshot_count,
            recommendations: recommendations_for(&averages),
            averages,
            alerts,
        }
    }

    /// Mark an alert resolved; returns whether one was found.
    pub fn resolve_alert(&self, id: &str) -> bool {
        let mut alerts = self.alerts.lock();
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Unresolved alerts, oldest first.
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// Most recent alerts, newest last.
    pub fn alert_history(&self, limit: usize) -> Vec<Alert> {
        let alerts = self.alerts.lock();
        alerts.iter().rev().take(limit).rev().cloned().collect()
    }

    /// Most recent snapshots, newest last.
    pub fn metrics_history(&self, limit: usize) -> Vec<MetricsSnapshot> {
        let history = self.history.lock();
        history.iter().rev().take(limit).rev().cloned().collect()
    }

    /// Add or replace an alert rule.
    pub fn add_alert_rule(&self, rule: AlertRule) {
        self.alert_rules.write().insert(rule.id.clone(), rule);
    }

    /// Remove an alert rule; returns whether one existed.
    pub fn remove_alert_rule(&self, id: &str) -> bool {
        self.alert_rules.write().remove(id).is_some()
    }

    /// All alert rules, ordered by id.
    pub fn alert_rules(&self) -> Vec<AlertRule> {
        self.alert_rules.read().values().cloned().collect()
    }

    /// `critical` with any unresolved critical alert, `warning` with more
    /// than 5 unresolved alerts, `healthy` otherwise.
    pub fn health_check(&self) -> HealthCheck {
        let active = self.active_alerts();
        let critical = active
            .iter()
            .filter(|a| a.severity == tradecache_core::events::AlertSeverity::Critical)
            .count();

        let check = if critical > 0 {
            HealthCheck::critical(format!("{critical} unresolved critical alert(s)"))
        } else if active.len() > 5 {
            HealthCheck::warning(format!("{} unresolved alerts", active.len()))
        } else {
            HealthCheck::healthy("monitoring nominal")
        };
        check.with_detail("unresolvedAlerts", serde_json::json!(active.len()))
    }
}

/// Resolve a dotted path against a serialized snapshot.
fn resolve_metric(doc: &serde_json::Value, path: &str) -> Option<f64> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    current.as_f64()
}

fn recommendations_for(averages: &MetricsSnapshot) -> Vec<String> {
    let mut recommendations = Vec::new();
    if averages.hit_rate < 80.0 {
        recommendations.push(
            "Cache hit rate below 80%: review TTL settings and cache warming coverage".to_string(),
        );
    }
    if averages.avg_latency_ms > 100.0 {
        recommendations.push(
            "Average latency above 100ms: review remote store sizing and network path".to_string(),
        );
    }
    if averages.error_rate > 5.0 {
        recommendations
            .push("Error rate above 5%: check remote store connectivity".to_string());
    }
    if averages.eviction_rate_per_min > 10.0 {
        recommendations
            .push("Eviction rate above 10/min: consider increasing L1 capacity".to_string());
    }
    if averages.memory_usage_pct > 80.0 {
        recommendations.push(
            "L1 occupancy above 80%: consider increasing capacity or lowering TTLs".to_string(),
        );
    }
    if recommendations.is_empty() {
        recommendations.push("Cache operating within expected parameters".to_string());
    }
    recommendations
}
