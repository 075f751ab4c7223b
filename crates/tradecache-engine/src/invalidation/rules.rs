//! Invalidation rules and execution records.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// How a matching rule invalidates.
///
/// Each variant carries exactly the fields it needs; misconfiguration is
/// reduced to degenerate values (a zero TTL, an empty dependency list) and
/// reported per-rule at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvalidationStrategy {
    /// Sweep the rule's pattern right away, cascading into the domain layer
    /// for session/user namespaces.
    Immediate,
    /// Queue the request; a background drain executes it as Immediate.
    Lazy,
    /// Schedule a one-shot Immediate execution after `ttl`.
    TimeBased {
        #[serde(with = "duration_secs")]
        ttl: Duration,
    },
    /// Execute as Immediate only when at least one dependency key is missing
    /// from the cache. A missing dependency is a best-effort staleness
    /// heuristic, not a causal guarantee: the dependency may simply have
    /// expired on its own schedule.
    DependencyBased { dependencies: Vec<String> },
    /// Compile the pattern to a regex, list all live remote keys, and
    /// invalidate each match individually. The most expensive strategy;
    /// intended for rare, broad sweeps.
    PatternBased,
}

impl InvalidationStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Lazy => "lazy",
            Self::TimeBased { .. } => "time_based",
            Self::DependencyBased { .. } => "dependency_based",
            Self::PatternBased => "pattern_based",
        }
    }
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

/// One entry in the rule table. Rules are mutable at runtime and keyed by
/// `id`; all matching enabled rules fire, ordered by descending priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationRule {
    pub id: String,
    /// Glob with `*` wildcard, compared glob-vs-glob against the
    /// invalidation request pattern.
    pub pattern: String,
    pub strategy: InvalidationStrategy,
    pub priority: i32,
    pub enabled: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_triggered_at: Option<OffsetDateTime>,
}

impl InvalidationRule {
    pub fn new(
        id: impl Into<String>,
        pattern: impl Into<String>,
        strategy: InvalidationStrategy,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            strategy,
            priority,
            enabled: true,
            last_triggered_at: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Default rule set seeded at startup.
pub fn default_rules() -> Vec<InvalidationRule> {
    vec![
        InvalidationRule::new(
            "user-sessions",
            "session:*",
            InvalidationStrategy::Immediate,
            100,
        ),
        InvalidationRule::new(
            "trading-sessions",
            "ts:*",
            InvalidationStrategy::Immediate,
            90,
        ),
        InvalidationRule::new(
            "portfolios",
            "portfolio:*",
            InvalidationStrategy::DependencyBased {
                dependencies: vec!["session:*".into()],
            },
            70,
        ),
        InvalidationRule::new(
            "user-profiles",
            "user:*",
            InvalidationStrategy::DependencyBased {
                dependencies: vec!["session:*".into()],
            },
            60,
        ),
        InvalidationRule::new(
            "market-data",
            "md:*",
            InvalidationStrategy::TimeBased {
                ttl: Duration::from_secs(5),
            },
            50,
        ),
        InvalidationRule::new("api-responses", "api:*", InvalidationStrategy::Lazy, 10),
    ]
}

/// Immutable record of one rule execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationEvent {
    pub rule_id: String,
    pub pattern: String,
    pub strategy: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub affected_keys: Vec<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvalidationEvent {
    pub fn success(rule: &InvalidationRule, affected_keys: Vec<String>) -> Self {
        Self {
            rule_id: rule.id.clone(),
            pattern: rule.pattern.clone(),
            strategy: rule.strategy.name().to_string(),
            timestamp: tradecache_core::time::now_utc(),
            affected_keys,
            success: true,
            error: None,
        }
    }

    pub fn failure(rule: &InvalidationRule, error: impl std::fmt::Display) -> Self {
        Self {
            rule_id: rule.id.clone(),
            pattern: rule.pattern.clone(),
            strategy: rule.strategy.name().to_string(),
            timestamp: tradecache_core::time::now_utc(),
            affected_keys: Vec::new(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!(InvalidationStrategy::Immediate.name(), "immediate");
        assert_eq!(
            InvalidationStrategy::TimeBased {
                ttl: Duration::from_secs(5)
            }
            .name(),
            "time_based"
        );
        assert_eq!(
            InvalidationStrategy::DependencyBased {
                dependencies: vec![]
            }
            .name(),
            "dependency_based"
        );
    }

    #[test]
    fn test_strategy_serde_is_tagged() {
        let json = serde_json::to_value(InvalidationStrategy::TimeBased {
            ttl: Duration::from_secs(30),
        })
        .unwrap();
        assert_eq!(json["type"], "time_based");
        assert_eq!(json["ttl"], 30.0);

        let back: InvalidationStrategy = serde_json::from_value(json).unwrap();
        assert_eq!(
            back,
            InvalidationStrategy::TimeBased {
                ttl: Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn test_default_rules_are_enabled_and_unique() {
        let rules = default_rules();
        assert!(rules.iter().all(|r| r.enabled));
        let mut ids: Vec<_> = rules.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_event_constructors() {
        let rule = InvalidationRule::new("r1", "session:*", InvalidationStrategy::Immediate, 10);

        let ok = InvalidationEvent::success(&rule, vec!["session:abc".into()]);
        assert!(ok.success);
        assert_eq!(ok.rule_id, "r1");
        assert_eq!(ok.strategy, "immediate");

        let failed = InvalidationEvent::failure(&rule, "boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.affected_keys.is_empty());
    }
}
