use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for OrderSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            _ => anyhow::bail!("Invalid order side: {}. Must be 'buy' or 'sell'", s),
        }
    }
}

/// Order kinds accepted by the execution service.
///
/// Only market orders settle today. The enum is non-exhaustive so limit
/// orders can be added later without breaking callers that match on it.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "MARKET"),
        }
    }
}

/// A transient order request. Lives only for the duration of execution;
/// becomes a `Transaction` on success or is discarded on failure.
#[derive(Debug, Clone)]
pub struct Order {
    pub account_id: Uuid,
    pub stock_id: Uuid,
    pub side: OrderSide,
    pub quantity: u64,
    pub kind: OrderKind,
}

/// Immutable record of one settled order. Append-only: the sole audit trail
/// for P&L reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub stock_id: Uuid,
    pub symbol: String,
    pub title: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub price: Decimal,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}
