//! Statistics snapshots exposed by the tiered cache manager.

use serde::{Deserialize, Serialize};

/// Per-tier counters at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
    pub hits: u64,
    pub misses: u64,
    /// Hit rate as a percentage of requests that consulted this tier.
    pub hit_rate: f64,
    pub avg_latency_ms: f64,
    pub memory_bytes: u64,
    pub size: usize,
}

/// Aggregate manager statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheManagerStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub evictions: u64,
    /// Hit rate as a percentage of all requests.
    pub hit_rate: f64,
    pub avg_latency_ms: f64,
    pub memory_bytes: u64,
    pub l1: TierStats,
    pub l2: TierStats,
    pub l3: TierStats,
    /// Pending write-behind items.
    pub write_behind_depth: usize,
}

pub(crate) fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        (hits as f64 / total as f64) * 100.0
    }
}

pub(crate) fn avg_latency_ms(total_micros: u64, samples: u64) -> f64 {
    if samples == 0 {
        0.0
    } else {
        (total_micros as f64 / samples as f64) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(hit_rate(0, 0), 0.0);
        assert!((hit_rate(75, 25) - 75.0).abs() < f64::EPSILON);
        assert!((hit_rate(1, 0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_avg_latency() {
        assert_eq!(avg_latency_ms(0, 0), 0.0);
        assert!((avg_latency_ms(3000, 2) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = CacheManagerStats::default();
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("hitRate").is_some());
        assert!(json.get("avgLatencyMs").is_some());
        assert!(json.get("writeBehindDepth").is_some());
        assert!(json["l1"].get("memoryBytes").is_some());
    }
}
