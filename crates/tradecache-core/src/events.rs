//! Typed event bus for cross-component signaling.
//!
//! The `CacheEventBus` is the central event channel the cache components use
//! to publish lifecycle signals: refresh-required ticks, batch updates, rule
//! table changes, and raised alerts. It uses tokio's broadcast channel for
//! multi-producer, multi-consumer messaging.
//!
//! Consumers are external collaborators (the market-data feed listens for
//! `RefreshRequired`, the paging sink listens for `AlertRaised`); the cache
//! itself never blocks on subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffer size for the broadcast channel.
/// Events beyond this limit will cause older events to be dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Record families with an independent real-time refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshKind {
    MarketData,
    OrderBooks,
    Portfolios,
}

impl std::fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarketData => write!(f, "market_data"),
            Self::OrderBooks => write!(f, "order_books"),
            Self::Portfolios => write!(f, "portfolios"),
        }
    }
}

/// Alert severity ladder, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Notification payload for a raised alert.
///
/// Carries only what a paging collaborator needs; the full `Alert` record
/// stays in the monitoring service's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotification {
    pub alert_id: String,
    pub rule_id: String,
    pub metric: String,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Events broadcast by the cache components.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A refresh cadence elapsed; the external feed should push fresh records.
    RefreshRequired { kind: RefreshKind },
    /// A batch write completed against the domain cache.
    BatchUpdated { kind: String, count: usize },
    /// An invalidation rule was added to the rule table.
    RuleAdded { rule_id: String },
    /// An invalidation rule was removed from the rule table.
    RuleRemoved { rule_id: String },
    /// The monitoring service raised an alert.
    AlertRaised(AlertNotification),
}

/// Broadcaster for cache events.
///
/// Thread-safe, cloneable, and shareable across the components. Multiple
/// subscribers can receive events from a single sender.
#[derive(Clone)]
pub struct CacheEventBus {
    sender: broadcast::Sender<CacheEvent>,
}

impl CacheEventBus {
    /// Create a new bus with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bus with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event,
    /// 0 if there are no active subscribers.
    pub fn send(&self, event: CacheEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Send a refresh-required signal.
    pub fn send_refresh_required(&self, kind: RefreshKind) -> usize {
        self.send(CacheEvent::RefreshRequired { kind })
    }

    /// Send a batch-updated notification.
    pub fn send_batch_updated(&self, kind: impl Into<String>, count: usize) -> usize {
        self.send(CacheEvent::BatchUpdated {
            kind: kind.into(),
            count,
        })
    }

    /// Send an alert notification.
    pub fn send_alert(&self, notification: AlertNotification) -> usize {
        self.send(CacheEvent::AlertRaised(notification))
    }

    /// Subscribe to events.
    ///
    /// Returns a receiver that will receive all events broadcast after
    /// subscription. Events sent before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for CacheEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let bus = CacheEventBus::new();
        let mut rx = bus.subscribe();

        bus.send_refresh_required(RefreshKind::MarketData);

        match rx.recv().await.unwrap() {
            CacheEvent::RefreshRequired { kind } => assert_eq!(kind, RefreshKind::MarketData),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_without_subscribers() {
        let bus = CacheEventBus::new();
        // No subscribers: send reports zero receivers instead of failing.
        assert_eq!(bus.send_batch_updated("market_snapshot", 3), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = CacheEventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(bus.send_refresh_required(RefreshKind::Portfolios), 2);

        assert!(matches!(
            rx1.recv().await.unwrap(),
            CacheEvent::RefreshRequired { .. }
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            CacheEvent::RefreshRequired { .. }
        ));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
        assert_eq!(AlertSeverity::Critical.to_string(), "critical");
    }
}
