//! Monitoring & alerting: periodic metrics snapshots, threshold alerting
//! with cooldowns, bounded histories, and aggregated period reports.

pub mod alerts;
pub mod metrics;
pub mod service;

pub use alerts::{default_alert_rules, Alert, AlertOperator, AlertRule};
pub use metrics::{
    DomainMetrics, InvalidationMetrics, MetricsSnapshot, TierLevels, TierMetrics,
};
pub use service::{MonitoringService, PerformanceReport};
