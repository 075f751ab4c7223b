use thiserror::Error;

/// Core error types for tradecache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Unknown cache configuration: {0}")]
    UnknownConfig(String),

    #[error("Remote store error: {0}")]
    RemoteStore(String),

    #[error("Rule {0} uses a time-based strategy but declares no TTL")]
    MissingTtl(String),

    #[error("Rule {0} uses a dependency-based strategy but declares no dependencies")]
    MissingDependencies(String),

    #[error("Loader error: {0}")]
    Loader(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CacheError {
    /// Create a new UnknownConfig error
    pub fn unknown_config(name: impl Into<String>) -> Self {
        Self::UnknownConfig(name.into())
    }

    /// Create a new RemoteStore error
    pub fn remote_store(message: impl Into<String>) -> Self {
        Self::RemoteStore(message.into())
    }

    /// Create a new MissingTtl error
    pub fn missing_ttl(rule_id: impl Into<String>) -> Self {
        Self::MissingTtl(rule_id.into())
    }

    /// Create a new MissingDependencies error
    pub fn missing_dependencies(rule_id: impl Into<String>) -> Self {
        Self::MissingDependencies(rule_id.into())
    }

    /// Create a new Loader error
    pub fn loader(message: impl Into<String>) -> Self {
        Self::Loader(message.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this error is a caller error (bad request category).
    ///
    /// Caller errors are never retried: the request itself is wrong.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownConfig(_)
                | Self::MissingTtl(_)
                | Self::MissingDependencies(_)
                | Self::InvalidPattern(_)
        )
    }

    /// Check if this error is transient (the operation may succeed later).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteStore(_) | Self::Loader(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownConfig(_) => ErrorCategory::Config,
            Self::RemoteStore(_) => ErrorCategory::Transport,
            Self::MissingTtl(_) | Self::MissingDependencies(_) => ErrorCategory::RuleMisconfig,
            Self::Loader(_) => ErrorCategory::Loader,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::InvalidPattern(_) => ErrorCategory::Pattern,
            Self::Configuration(_) => ErrorCategory::Config,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Transport,
    RuleMisconfig,
    Loader,
    Serialization,
    Pattern,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Transport => write!(f, "transport"),
            Self::RuleMisconfig => write!(f, "rule_misconfig"),
            Self::Loader => write!(f, "loader"),
            Self::Serialization => write!(f, "serialization"),
            Self::Pattern => write!(f, "pattern"),
        }
    }
}

/// Convenience result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CacheError::unknown_config("market_data_v2");
        assert_eq!(
            err.to_string(),
            "Unknown cache configuration: market_data_v2"
        );
        assert!(err.is_caller_error());
        assert!(!err.is_transient());
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_remote_store_error_is_transient() {
        let err = CacheError::remote_store("connection refused");
        assert!(err.is_transient());
        assert!(!err.is_caller_error());
        assert_eq!(err.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_rule_misconfig_errors() {
        let err = CacheError::missing_ttl("market-data-ttl");
        assert_eq!(
            err.to_string(),
            "Rule market-data-ttl uses a time-based strategy but declares no TTL"
        );
        assert!(err.is_caller_error());
        assert_eq!(err.category(), ErrorCategory::RuleMisconfig);

        let err = CacheError::missing_dependencies("portfolio-dep");
        assert!(err.is_caller_error());
        assert_eq!(err.category(), ErrorCategory::RuleMisconfig);
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ not json }").unwrap_err();
        let err: CacheError = json_err.into();

        assert!(matches!(err, CacheError::Serialization(_)));
        assert_eq!(err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_regex_error_conversion() {
        let regex_err = regex::Regex::new("[").unwrap_err();
        let err: CacheError = regex_err.into();

        assert!(matches!(err, CacheError::InvalidPattern(_)));
        assert!(err.is_caller_error());
        assert_eq!(err.category(), ErrorCategory::Pattern);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Config.to_string(), "config");
        assert_eq!(ErrorCategory::Transport.to_string(), "transport");
        assert_eq!(ErrorCategory::RuleMisconfig.to_string(), "rule_misconfig");
        assert_eq!(ErrorCategory::Loader.to_string(), "loader");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
        assert_eq!(ErrorCategory::Pattern.to_string(), "pattern");
    }

    #[test]
    fn test_result_type_usage() {
        fn ok_fn() -> Result<u32> {
            Ok(42)
        }

        fn err_fn() -> Result<u32> {
            Err(CacheError::loader("feed unavailable"))
        }

        assert!(ok_fn().is_ok());
        assert!(err_fn().is_err());
    }
}
