//! Alert rules and raised alerts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tradecache_core::events::AlertSeverity;
use uuid::Uuid;

/// Comparison applied between the observed metric and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertOperator {
    Gt,
    Lt,
    Eq,
    Gte,
    Lte,
}

impl AlertOperator {
    pub fn apply(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Lt => value < threshold,
            Self::Eq => (value - threshold).abs() < f64::EPSILON,
            Self::Gte => value >= threshold,
            Self::Lte => value <= threshold,
        }
    }
}

impl std::fmt::Display for AlertOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gt => write!(f, ">"),
            Self::Lt => write!(f, "<"),
            Self::Eq => write!(f, "=="),
            Self::Gte => write!(f, ">="),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// One alert rule: a dotted metric path into the snapshot, an operator, a
/// threshold, and a cooldown gating re-fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    /// Dotted path of serialized snapshot fields, e.g. `levels.l1.hitRate`.
    pub metric: String,
    pub operator: AlertOperator,
    pub threshold: f64,
    pub severity: AlertSeverity,
    pub enabled: bool,
    #[serde(with = "duration_secs")]
    pub cooldown: Duration,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_triggered_at: Option<OffsetDateTime>,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

impl AlertRule {
    pub fn new(
        id: impl Into<String>,
        metric: impl Into<String>,
        operator: AlertOperator,
        threshold: f64,
        severity: AlertSeverity,
        cooldown: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            metric: metric.into(),
            operator,
            threshold,
            severity,
            enabled: true,
            cooldown,
            last_triggered_at: None,
        }
    }
}

/// Default alert rules seeded at startup.
pub fn default_alert_rules() -> Vec<AlertRule> {
    vec![
        AlertRule::new(
            "hit-rate-low",
            "hitRate",
            AlertOperator::Lt,
            80.0,
            AlertSeverity::Medium,
            Duration::from_secs(300),
        ),
        AlertRule::new(
            "hit-rate-critical",
            "hitRate",
            AlertOperator::Lt,
            60.0,
            AlertSeverity::Critical,
            Duration::from_secs(120),
        ),
        AlertRule::new(
            "latency-high",
            "avgLatencyMs",
            AlertOperator::Gt,
            100.0,
            AlertSeverity::Medium,
            Duration::from_secs(300),
        ),
        AlertRule::new(
            "latency-critical",
            "avgLatencyMs",
            AlertOperator::Gt,
            500.0,
            AlertSeverity::Critical,
            Duration::from_secs(120),
        ),
        AlertRule::new(
            "error-rate-high",
            "errorRate",
            AlertOperator::Gt,
            5.0,
            AlertSeverity::High,
            Duration::from_secs(300),
        ),
        AlertRule::new(
            "memory-usage-high",
            "memoryUsagePct",
            AlertOperator::Gt,
            80.0,
            AlertSeverity::High,
            Duration::from_secs(300),
        ),
        AlertRule::new(
            "eviction-rate-high",
            "evictionRatePerMin",
            AlertOperator::Gt,
            10.0,
            AlertSeverity::Medium,
            Duration::from_secs(300),
        ),
    ]
}

/// A raised alert. Immutable after creation except for `resolved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    pub severity: AlertSeverity,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub message: String,
    pub resolved: bool,
}

impl Alert {
    pub fn from_rule(rule: &AlertRule, value: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rule_id: rule.id.clone(),
            metric: rule.metric.clone(),
            value,
            threshold: rule.threshold,
            severity: rule.severity,
            timestamp: tradecache_core::time::now_utc(),
            message: format!(
                "{} is {:.2}, breaching {} {} ({} severity)",
                rule.metric, value, rule.operator, rule.threshold, rule.severity
            ),
            resolved: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_apply() {
        assert!(AlertOperator::Gt.apply(101.0, 100.0));
        assert!(!AlertOperator::Gt.apply(100.0, 100.0));
        assert!(AlertOperator::Lt.apply(59.0, 60.0));
        assert!(AlertOperator::Gte.apply(100.0, 100.0));
        assert!(AlertOperator::Lte.apply(100.0, 100.0));
        assert!(AlertOperator::Eq.apply(5.0, 5.0));
        assert!(!AlertOperator::Eq.apply(5.1, 5.0));
    }

    #[test]
    fn test_default_rules_unique_and_enabled() {
        let rules = default_alert_rules();
        assert!(rules.iter().all(|r| r.enabled));
        let mut ids: Vec<_> = rules.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_alert_message_interpolation() {
        let rule = AlertRule::new(
            "hit-rate-low",
            "hitRate",
            AlertOperator::Lt,
            80.0,
            AlertSeverity::Medium,
            Duration::from_secs(300),
        );
        let alert = Alert::from_rule(&rule, 45.5);

        assert!(!alert.resolved);
        assert_eq!(alert.rule_id, "hit-rate-low");
        assert!(alert.message.contains("hitRate"));
        assert!(alert.message.contains("45.50"));
        assert!(alert.message.contains("< 80"));
        assert!(alert.message.contains("medium"));
    }

    #[test]
    fn test_alert_ids_are_unique() {
        let rule = AlertRule::new(
            "r",
            "hitRate",
            AlertOperator::Lt,
            80.0,
            AlertSeverity::Low,
            Duration::from_secs(60),
        );
        let a = Alert::from_rule(&rule, 1.0);
        let b = Alert::from_rule(&rule, 1.0);
        assert_ne!(a.id, b.id);
    }
}
