//! Point-in-time metrics snapshots.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::cache::{CacheManagerStats, TierStats};
use crate::domain::TradingCacheStats;
use crate::invalidation::InvalidationStats;

/// Per-tier breakdown inside a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierMetrics {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub latency_ms: f64,
    pub memory_usage: u64,
    pub size: usize,
}

impl From<&TierStats> for TierMetrics {
    fn from(stats: &TierStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate,
            latency_ms: stats.avg_latency_ms,
            memory_usage: stats.memory_bytes,
            size: stats.size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLevels {
    pub l1: TierMetrics,
    pub l2: TierMetrics,
    pub l3: TierMetrics,
}

/// Domain-layer figures carried in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMetrics {
    pub local_entries: usize,
    pub estimated_bytes: u64,
}

/// Invalidation-engine figures carried in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationMetrics {
    pub success_rate: f64,
    pub queue_depth: usize,
    pub enabled_rules: usize,
}

/// One collected snapshot. Alert rules address fields by their serialized
/// (camelCase) names, dotted for nesting — e.g. `levels.l1.hitRate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub evictions: u64,
    /// Hits as a percentage of total requests.
    pub hit_rate: f64,
    /// Misses as a percentage of total requests.
    pub miss_rate: f64,
    /// Errors as a percentage of total requests.
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    /// L1 occupancy as a percentage of capacity.
    pub memory_usage_pct: f64,
    pub memory_bytes: u64,
    /// Evictions since the previous snapshot, normalized to per-minute.
    pub eviction_rate_per_min: f64,
    pub write_behind_depth: usize,
    pub levels: TierLevels,
    pub domain: DomainMetrics,
    pub invalidation: InvalidationMetrics,
}

impl MetricsSnapshot {
    /// All-zero snapshot (report fallback when no history exists).
    pub fn zero() -> Self {
        Self {
            timestamp: tradecache_core::time::now_utc(),
            hits: 0,
            misses: 0,
            errors: 0,
            evictions: 0,
            hit_rate: 0.0,
            miss_rate: 0.0,
            error_rate: 0.0,
            avg_latency_ms: 0.0,
            memory_usage_pct: 0.0,
            memory_bytes: 0,
            eviction_rate_per_min: 0.0,
            write_behind_depth: 0,
            levels: TierLevels::default(),
            domain: DomainMetrics::default(),
            invalidation: InvalidationMetrics::default(),
        }
    }

    /// Assemble a snapshot from the components' stats.
    pub fn from_stats(
        manager: &CacheManagerStats,
        domain: &TradingCacheStats,
        invalidation: &InvalidationStats,
        l1_occupancy_pct: f64,
        eviction_rate_per_min: f64,
    ) -> Self {
        let total_requests = manager.hits + manager.misses;
        let error_rate = if total_requests == 0 {
            0.0
        } else {
            (manager.errors as f64 / total_requests as f64) * 100.0
        };
        let miss_rate = if total_requests == 0 {
            0.0
        } else {
            (manager.misses as f64 / total_requests as f64) * 100.0
        };

        Self {
            timestamp: tradecache_core::time::now_utc(),
            hits: manager.hits,
            misses: manager.misses,
            errors: manager.errors,
            evictions: manager.evictions,
            hit_rate: manager.hit_rate,
            miss_rate,
            error_rate,
            avg_latency_ms: manager.avg_latency_ms,
            memory_usage_pct: l1_occupancy_pct,
            memory_bytes: manager.memory_bytes,
            eviction_rate_per_min,
            write_behind_depth: manager.write_behind_depth,
            levels: TierLevels {
                l1: TierMetrics::from(&manager.l1),
                l2: TierMetrics::from(&manager.l2),
                l3: TierMetrics::from(&manager.l3),
            },
            domain: DomainMetrics {
                local_entries: domain.market_snapshots
                    + domain.order_books
                    + domain.trading_sessions
                    + domain.portfolios
                    + domain.derived_metrics,
                estimated_bytes: domain.estimated_bytes,
            },
            invalidation: InvalidationMetrics {
                success_rate: invalidation.success_rate,
                queue_depth: invalidation.queue_depth,
                enabled_rules: invalidation.enabled_rules,
            },
        }
    }

    /// Arithmetic mean of the numeric fields across `snapshots`.
    ///
    /// The timestamp of the last snapshot is carried over. An empty slice
    /// yields the zero snapshot.
    pub fn average(snapshots: &[MetricsSnapshot]) -> Self {
        let Some(last) = snapshots.last() else {
            return Self::zero();
        };
        let n = snapshots.len() as f64;
        let mean_u64 = |f: fn(&MetricsSnapshot) -> u64| -> u64 {
            (snapshots.iter().map(|s| f(s) as f64).sum::<f64>() / n).round() as u64
        };
        let mean_f64 = |f: fn(&MetricsSnapshot) -> f64| -> f64 {
            snapshots.iter().map(f).sum::<f64>() / n
        };
        let mean_usize = |f: fn(&MetricsSnapshot) -> usize| -> usize {
            (snapshots.iter().map(|s| f(s) as f64).sum::<f64>() / n).round() as usize
        };
        let mean_tier = |f: fn(&MetricsSnapshot) -> &TierMetrics| -> TierMetrics {
            TierMetrics {
                hits: (snapshots.iter().map(|s| f(s).hits as f64).sum::<f64>() / n).round() as u64,
                misses: (snapshots.iter().map(|s| f(s).misses as f64).sum::<f64>() / n).round()
                    as u64,
                hit_rate: snapshots.iter().map(|s| f(s).hit_rate).sum::<f64>() / n,
                latency_ms: snapshots.iter().map(|s| f(s).latency_ms).sum::<f64>() / n,
                memory_usage: (snapshots
                    .iter()
                    .map(|s| f(s).memory_usage as f64)
                    .sum::<f64>()
                    / n)
                    .round() as u64,
                size: (snapshots.iter().map(|s| f(s).size as f64).sum::<f64>() / n).round()
                    as usize,
            }
        };

        Self {
            timestamp: last.timestamp,
            hits: mean_u64(|s| s.hits),
            misses: mean_u64(|s| s.misses),
            errors: mean_u64(|s| s.errors),
            evictions: mean_u64(|s| s.evictions),
            hit_rate: mean_f64(|s| s.hit_rate),
            miss_rate: mean_f64(|s| s.miss_rate),
            error_rate: mean_f64(|s| s.error_rate),
            avg_latency_ms: mean_f64(|s| s.avg_latency_ms),
            memory_usage_pct: mean_f64(|s| s.memory_usage_pct),
            memory_bytes: mean_u64(|s| s.memory_bytes),
            eviction_rate_per_min: mean_f64(|s| s.eviction_rate_per_min),
            write_behind_depth: mean_usize(|s| s.write_behind_depth),
            levels: TierLevels {
                l1: mean_tier(|s| &s.levels.l1),
                l2: mean_tier(|s| &s.levels.l2),
                l3: mean_tier(|s| &s.levels.l3),
            },
            domain: DomainMetrics {
                local_entries: mean_usize(|s| s.domain.local_entries),
                estimated_bytes: mean_u64(|s| s.domain.estimated_bytes),
            },
            invalidation: InvalidationMetrics {
                success_rate: mean_f64(|s| s.invalidation.success_rate),
                queue_depth: mean_usize(|s| s.invalidation.queue_depth),
                enabled_rules: mean_usize(|s| s.invalidation.enabled_rules),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_snapshot() {
        let snapshot = MetricsSnapshot::zero();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.hit_rate, 0.0);
    }

    #[test]
    fn test_serialized_paths_are_camel_case() {
        let json = serde_json::to_value(MetricsSnapshot::zero()).unwrap();
        assert!(json.get("hitRate").is_some());
        assert!(json.get("avgLatencyMs").is_some());
        assert!(json.get("memoryUsagePct").is_some());
        assert!(json.get("evictionRatePerMin").is_some());
        assert!(json["levels"]["l1"].get("hitRate").is_some());
        assert!(json["invalidation"].get("successRate").is_some());
    }

    #[test]
    fn test_average() {
        let mut a = MetricsSnapshot::zero();
        a.hit_rate = 80.0;
        a.hits = 10;
        a.avg_latency_ms = 2.0;
        let mut b = MetricsSnapshot::zero();
        b.hit_rate = 60.0;
        b.hits = 20;
        b.avg_latency_ms = 4.0;

        let avg = MetricsSnapshot::average(&[a, b]);
        assert!((avg.hit_rate - 70.0).abs() < f64::EPSILON);
        assert_eq!(avg.hits, 15);
        assert!((avg.avg_latency_ms - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_of_empty_is_zero() {
        let avg = MetricsSnapshot::average(&[]);
        assert_eq!(avg.hits, 0);
        assert_eq!(avg.hit_rate, 0.0);
    }

    #[test]
    fn test_error_rate_derivation() {
        let mut manager = CacheManagerStats::default();
        manager.hits = 90;
        manager.misses = 10;
        manager.errors = 5;
        manager.hit_rate = 90.0;

        let snapshot = MetricsSnapshot::from_stats(
            &manager,
            &TradingCacheStats::default(),
            &InvalidationStats::default(),
            0.0,
            0.0,
        );
        assert!((snapshot.error_rate - 5.0).abs() < f64::EPSILON);
        assert!((snapshot.miss_rate - 10.0).abs() < f64::EPSILON);
    }
}
