//! API View Models
//!
//! The serialized shapes of the exchange surface. Incoming requests are
//! loosely typed at the transport edge; `OrderRequest::parse` is the
//! validated constructor that turns one into a well-typed order or rejects
//! it before it reaches the engine.

use crate::application::ranking::StockSummary;
use crate::application::valuation::{PortfolioReport, PositionValuation};
use crate::domain::errors::OrderError;
use crate::domain::trading::stock::Stock;
use crate::domain::trading::types::{OrderKind, OrderSide, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Full stock detail, metadata included.
#[derive(Debug, Clone, Serialize)]
pub struct StockDetail {
    pub id: Uuid,
    pub symbol: String,
    pub title: String,
    pub current_price: Decimal,
    pub previous_close: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: u64,
    pub total_shares: u64,
    pub poster: Option<String>,
    pub release_date: Option<String>,
    pub synopsis: Option<String>,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Stock> for StockDetail {
    fn from(stock: &Stock) -> Self {
        Self {
            id: stock.id,
            symbol: stock.symbol.clone(),
            title: stock.title.clone(),
            current_price: stock.current_price,
            previous_close: stock.previous_close,
            change: stock.change().round_dp(2),
            change_percent: stock.change_percent(),
            volume: stock.volume,
            total_shares: stock.total_shares,
            poster: stock.metadata.poster.clone(),
            release_date: stock.metadata.release_date.clone(),
            synopsis: stock.metadata.synopsis.clone(),
            genres: stock.metadata.genres.clone(),
            cast: stock.metadata.cast.clone(),
            created_at: stock.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub movie_symbol: String,
    pub movie_title: String,
    #[serde(rename = "type")]
    pub side: String,
    pub quantity: u64,
    pub price: Decimal,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            movie_id: tx.stock_id,
            movie_symbol: tx.symbol.clone(),
            movie_title: tx.title.clone(),
            side: tx.side.to_string(),
            quantity: tx.quantity,
            price: tx.price,
            amount: tx.amount,
            timestamp: tx.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioEntryView {
    pub movie_id: Uuid,
    pub movie_symbol: String,
    pub movie_title: String,
    pub quantity: u64,
    pub avg_price: Decimal,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub pl: Decimal,
    pub pl_percent: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
}

impl From<&PositionValuation> for PortfolioEntryView {
    fn from(p: &PositionValuation) -> Self {
        Self {
            movie_id: p.stock_id,
            movie_symbol: p.symbol.clone(),
            movie_title: p.title.clone(),
            quantity: p.quantity,
            avg_price: p.avg_price,
            current_price: p.current_price,
            current_value: p.current_value,
            pl: p.pl,
            pl_percent: p.pl_percent,
            day_change: p.day_change,
            day_change_percent: p.day_change_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioView {
    pub balance: Decimal,
    pub portfolio: Vec<PortfolioEntryView>,
    pub total_value: Decimal,
    pub total_pl: Decimal,
}

impl From<&PortfolioReport> for PortfolioView {
    fn from(report: &PortfolioReport) -> Self {
        Self {
            balance: report.balance,
            portfolio: report.positions.iter().map(PortfolioEntryView::from).collect(),
            total_value: report.total_value,
            total_pl: report.total_pl,
        }
    }
}

fn default_order_type() -> String {
    "market".to_string()
}

/// Raw order submission as it arrives from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub movie_id: Uuid,
    pub action: String,
    pub quantity: i64,
    #[serde(default = "default_order_type")]
    pub order_type: String,
}

impl OrderRequest {
    /// Validate at the edge: unknown actions, non-positive quantities and
    /// unsupported order types never reach the engine.
    pub fn parse(&self) -> Result<(OrderSide, u64, OrderKind), OrderError> {
        let side = OrderSide::from_str(&self.action).map_err(|_| OrderError::InvalidAction {
            action: self.action.clone(),
        })?;

        if self.quantity <= 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: self.quantity,
            });
        }

        let kind = match self.order_type.to_lowercase().as_str() {
            "market" => OrderKind::Market,
            other => {
                return Err(OrderError::UnsupportedOrderKind {
                    kind: other.to_string(),
                });
            }
        };

        Ok((side, self.quantity as u64, kind))
    }
}

/// Response to a settled order. Carries the post-trade balance and holding so
/// the caller does not need a follow-up portfolio read.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub message: String,
    pub transaction: TransactionView,
    pub balance: Decimal,
    pub holding_quantity: u64,
    pub realized_pl: Option<Decimal>,
    pub stock: StockSummary,
}
