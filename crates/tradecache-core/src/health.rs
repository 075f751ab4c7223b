//! Health-check primitives shared by every component.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Warning,
    Critical,
    Unhealthy,
    Unknown,
}

impl Default for HealthStatus {
    fn default() -> Self {
        HealthStatus::Unknown
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Point-in-time health report for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: String,
    #[serde(rename = "checkedAt", with = "time::serde::rfc3339")]
    pub checked_at: OffsetDateTime,
    #[serde(rename = "responseTimeMs", skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    pub details: HashMap<String, serde_json::Value>,
}

impl HealthCheck {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Healthy, message)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Degraded, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Warning, message)
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Critical, message)
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Unhealthy, message)
    }

    fn with_status(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            checked_at: crate::time::now_utc(),
            response_time_ms: None,
            details: HashMap::new(),
        }
    }

    /// Attach the observed response time.
    pub fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }

    /// Attach an arbitrary detail field.
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let check = HealthCheck::healthy("remote store reachable");
        assert_eq!(check.status, HealthStatus::Healthy);
        assert_eq!(check.message, "remote store reachable");
        assert!(check.response_time_ms.is_none());

        let check = HealthCheck::unhealthy("ping timed out").with_response_time(512);
        assert_eq!(check.status, HealthStatus::Unhealthy);
        assert_eq!(check.response_time_ms, Some(512));
    }

    #[test]
    fn test_details() {
        let check = HealthCheck::degraded("success rate below threshold")
            .with_detail("successRate", serde_json::json!(87.5));
        assert_eq!(check.details["successRate"], serde_json::json!(87.5));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(HealthStatus::Degraded.to_string(), "degraded");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "unhealthy");
    }

    #[test]
    fn test_serialization_shape() {
        let check = HealthCheck::healthy("ok").with_response_time(3);
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["responseTimeMs"], 3);
        assert!(json.get("checkedAt").is_some());
    }
}
