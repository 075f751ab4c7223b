//! Named cache configurations.
//!
//! Every cache operation names a configuration; the catalogue is loaded at
//! construction and immutable for the process lifetime. An unknown name is a
//! caller error, not a cache miss.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tradecache_core::{CacheError, Result};

/// Highest tier a value is allowed to live in. Lower tiers are always also
/// populated when a higher tier is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    L1,
    L2,
    L3,
}

/// Consistency strategy applied on `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// Write every tier synchronously before returning.
    CacheAside,
    /// Write every tier concurrently; any tier failure fails the call.
    WriteThrough,
    /// Write L1 synchronously, enqueue the remote write for the batch flush.
    /// L1 and L2 can disagree for up to one flush interval.
    WriteBehind,
}

/// Invalidation hints attached to a configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationSpec {
    pub pattern: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// One named cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
    pub key_prefix: String,
    pub serialize: bool,
    pub tier: Tier,
    pub strategy: WriteStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidation: Option<InvalidationSpec>,
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

impl CacheConfig {
    pub fn new(
        name: impl Into<String>,
        ttl: Duration,
        key_prefix: impl Into<String>,
        tier: Tier,
        strategy: WriteStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            ttl,
            key_prefix: key_prefix.into(),
            serialize: true,
            tier,
            strategy,
            invalidation: None,
        }
    }

    pub fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }

    pub fn with_invalidation(mut self, spec: InvalidationSpec) -> Self {
        self.invalidation = Some(spec);
        self
    }
}

/// Immutable catalogue of named configurations.
pub struct ConfigCatalog {
    configs: HashMap<String, Arc<CacheConfig>>,
}

impl ConfigCatalog {
    /// Empty catalogue (tests register their own configs).
    pub fn new() -> Self {
        Self {
            configs: HashMap::new(),
        }
    }

    /// Catalogue seeded with the trading platform's standard configurations.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register(CacheConfig::new(
            "market_data",
            Duration::from_secs(5),
            "md:",
            Tier::L2,
            WriteStrategy::CacheAside,
        ));
        catalog.register(CacheConfig::new(
            "order_book",
            Duration::from_secs(2),
            "ob:",
            Tier::L1,
            WriteStrategy::CacheAside,
        ));
        catalog.register(
            CacheConfig::new(
                "user_session",
                Duration::from_secs(1800),
                "session:",
                Tier::L2,
                WriteStrategy::WriteThrough,
            )
            .with_invalidation(InvalidationSpec {
                pattern: "session:*".into(),
                dependencies: Vec::new(),
            }),
        );
        catalog.register(
            CacheConfig::new(
                "trading_session",
                Duration::from_secs(14_400),
                "ts:",
                Tier::L2,
                WriteStrategy::WriteThrough,
            )
            .with_invalidation(InvalidationSpec {
                pattern: "ts:*".into(),
                dependencies: Vec::new(),
            }),
        );
        catalog.register(
            CacheConfig::new(
                "portfolio",
                Duration::from_secs(60),
                "portfolio:",
                Tier::L2,
                WriteStrategy::WriteBehind,
            )
            .with_invalidation(InvalidationSpec {
                pattern: "portfolio:*".into(),
                dependencies: vec!["session:*".into()],
            }),
        );
        catalog.register(CacheConfig::new(
            "derived_metrics",
            Duration::from_secs(30),
            "metrics:",
            Tier::L2,
            WriteStrategy::CacheAside,
        ));
        catalog.register(CacheConfig::new(
            "api_response",
            Duration::from_secs(30),
            "api:",
            Tier::L2,
            WriteStrategy::CacheAside,
        ));
        catalog
    }

    /// Register a configuration. Last registration wins for duplicate names;
    /// the catalogue is frozen once handed to the manager.
    pub fn register(&mut self, config: CacheConfig) {
        self.configs
            .insert(config.name.clone(), Arc::new(config));
    }

    /// Look up a configuration by name.
    pub fn get(&self, name: &str) -> Result<Arc<CacheConfig>> {
        self.configs
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::unknown_config(name))
    }

    /// Names of all registered configurations.
    pub fn names(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl Default for ConfigCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_config_is_caller_error() {
        let catalog = ConfigCatalog::with_defaults();
        let err = catalog.get("nonexistent").unwrap_err();
        assert!(matches!(err, CacheError::UnknownConfig(_)));
    }

    #[test]
    fn test_defaults_cover_trading_records() {
        let catalog = ConfigCatalog::with_defaults();
        for name in [
            "market_data",
            "order_book",
            "user_session",
            "trading_session",
            "portfolio",
            "derived_metrics",
            "api_response",
        ] {
            assert!(catalog.get(name).is_ok(), "missing default config {name}");
        }
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::L1 < Tier::L2);
        assert!(Tier::L2 < Tier::L3);
    }

    #[test]
    fn test_register_overrides() {
        let mut catalog = ConfigCatalog::new();
        catalog.register(CacheConfig::new(
            "md",
            Duration::from_secs(1),
            "md:",
            Tier::L1,
            WriteStrategy::CacheAside,
        ));
        catalog.register(CacheConfig::new(
            "md",
            Duration::from_secs(9),
            "md:",
            Tier::L2,
            WriteStrategy::WriteThrough,
        ));
        let config = catalog.get("md").unwrap();
        assert_eq!(config.ttl, Duration::from_secs(9));
        assert_eq!(config.tier, Tier::L2);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = CacheConfig::new(
            "portfolio",
            Duration::from_secs(60),
            "portfolio:",
            Tier::L2,
            WriteStrategy::WriteBehind,
        );
        let json = serde_json::to_string(&config).unwrap();
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ttl, Duration::from_secs(60));
        assert_eq!(back.strategy, WriteStrategy::WriteBehind);
    }
}
