//! Typed trading records served by the domain cache.
//!
//! Every record carries its own domain timestamp; freshness decisions are
//! made against that field, independent of raw cache TTLs, because these
//! records are semantically time-sensitive.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A record with a domain timestamp, usable behind a freshness window.
pub trait TimedRecord: Clone + Send + Sync + serde::Serialize + 'static {
    fn recorded_at(&self) -> OffsetDateTime;
}

/// Point-in-time market data for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub volume_24h: f64,
    pub change_24h_pct: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl TimedRecord for MarketSnapshot {
    fn recorded_at(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// One price level of an order book side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Aggregated order book for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    pub symbol: String,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl TimedRecord for OrderBook {
    fn recorded_at(&self) -> OffsetDateTime {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Suspended,
    Closed,
}

/// A live trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSession {
    pub session_id: String,
    pub user_id: String,
    pub status: SessionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl TimedRecord for TradingSession {
    fn recorded_at(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// One held position inside a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub symbol: String,
    pub quantity: f64,
    pub avg_entry_price: f64,
}

/// A user's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub user_id: String,
    pub positions: Vec<PortfolioPosition>,
    pub cash_balance: f64,
    pub total_value: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl TimedRecord for Portfolio {
    fn recorded_at(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// Metrics derived for one trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub session_id: String,
    pub realized_pnl: f64,
    pub exposure: f64,
    pub win_rate_pct: f64,
    pub trade_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl TimedRecord for DerivedMetrics {
    fn recorded_at(&self) -> OffsetDateTime {
        self.timestamp
    }
}
