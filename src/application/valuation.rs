//! Portfolio Valuation Service
//!
//! Marks an account's holdings to the current quotes. Pure read computed on
//! demand from the market store; never cached beyond a single response.
//! Realized gains from past sells already sit in the balance, so `total_pl`
//! here is unrealized only.

use crate::domain::errors::OrderError;
use crate::infrastructure::market_store::MarketStore;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct PositionValuation {
    pub stock_id: Uuid,
    pub symbol: String,
    pub title: String,
    pub quantity: u64,
    pub avg_price: Decimal,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub pl: Decimal,
    pub pl_percent: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub balance: Decimal,
    pub positions: Vec<PositionValuation>,
    /// Cash plus the marked value of every position.
    pub total_value: Decimal,
    /// Unrealized P&L across all positions.
    pub total_pl: Decimal,
}

pub struct PortfolioValuationService {
    store: Arc<MarketStore>,
}

impl PortfolioValuationService {
    pub fn new(store: Arc<MarketStore>) -> Self {
        Self { store }
    }

    pub async fn valuate(&self, account_id: Uuid) -> Result<PortfolioReport, OrderError> {
        let account = self
            .store
            .account_snapshot(account_id)
            .await
            .ok_or(OrderError::AccountNotFound { account_id })?;

        let mut positions = Vec::with_capacity(account.holdings.len());
        for holding in account.holdings.values() {
            // A delisted stock would be a catalog bug; value the position at
            // its cost basis rather than dropping it from the report.
            let (current_price, day_change, day_change_percent) =
                match self.store.stock_snapshot(holding.stock_id).await {
                    Some(stock) => (
                        stock.current_price,
                        stock.change().round_dp(2),
                        stock.change_percent(),
                    ),
                    None => (holding.avg_price, Decimal::ZERO, Decimal::ZERO),
                };

            let quantity = Decimal::from(holding.quantity);
            let current_value = (quantity * current_price).round_dp(2);
            let cost_basis = quantity * holding.avg_price;
            let pl = (current_value - cost_basis).round_dp(2);
            let pl_percent = if cost_basis.is_zero() {
                Decimal::ZERO
            } else {
                (pl / cost_basis * Decimal::from(100)).round_dp(2)
            };

            positions.push(PositionValuation {
                stock_id: holding.stock_id,
                symbol: holding.symbol.clone(),
                title: holding.title.clone(),
                quantity: holding.quantity,
                avg_price: holding.avg_price,
                current_price,
                current_value,
                pl,
                pl_percent,
                day_change,
                day_change_percent,
            });
        }
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let positions_value: Decimal = positions.iter().map(|p| p.current_value).sum();
        let total_pl: Decimal = positions.iter().map(|p| p.pl).sum();

        Ok(PortfolioReport {
            balance: account.balance,
            total_value: account.balance + positions_value,
            total_pl,
            positions,
        })
    }
}
