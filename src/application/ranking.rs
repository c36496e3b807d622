//! Market Ranking Service
//!
//! Read-side projections over the catalog: gainers, losers and volume
//! leaders, plus aggregate market statistics. Pure reads against the same
//! stock records the price engine writes, so the views are always consistent
//! with the latest committed fills.

use crate::domain::repositories::Ledger;
use crate::domain::trading::stock::Stock;
use crate::infrastructure::market_store::MarketStore;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Compact stock view used by the ranked lists.
#[derive(Debug, Clone, Serialize)]
pub struct StockSummary {
    pub id: Uuid,
    pub symbol: String,
    pub title: String,
    pub current_price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: u64,
    pub poster: Option<String>,
}

impl From<&Stock> for StockSummary {
    fn from(stock: &Stock) -> Self {
        Self {
            id: stock.id,
            symbol: stock.symbol.clone(),
            title: stock.title.clone(),
            current_price: stock.current_price,
            change: stock.change().round_dp(2),
            change_percent: stock.change_percent(),
            volume: stock.volume,
            poster: stock.metadata.poster.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingReport {
    pub gainers: Vec<StockSummary>,
    pub losers: Vec<StockSummary>,
    pub volume_leaders: Vec<StockSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketStats {
    pub total_stocks: usize,
    pub total_accounts: usize,
    pub total_transactions: usize,
    pub total_market_cap: Decimal,
}

pub struct MarketRankingService {
    store: Arc<MarketStore>,
    ledger: Arc<dyn Ledger>,
    top_n: usize,
}

impl MarketRankingService {
    pub fn new(store: Arc<MarketStore>, ledger: Arc<dyn Ledger>, top_n: usize) -> Self {
        Self {
            store,
            ledger,
            top_n,
        }
    }

    /// Ranked market-mover lists, each truncated to the configured top N.
    /// Ties break by symbol ascending so re-querying unchanged state yields
    /// an identical order.
    pub async fn trending(&self) -> TrendingReport {
        let snapshots = self.store.stock_snapshots().await;

        let mut gainers: Vec<&Stock> = snapshots
            .iter()
            .filter(|s| s.change_percent() > Decimal::ZERO)
            .collect();
        gainers.sort_by(|a, b| {
            b.change_percent()
                .cmp(&a.change_percent())
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        let mut losers: Vec<&Stock> = snapshots
            .iter()
            .filter(|s| s.change_percent() < Decimal::ZERO)
            .collect();
        losers.sort_by(|a, b| {
            a.change_percent()
                .cmp(&b.change_percent())
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        let mut volume_leaders: Vec<&Stock> = snapshots.iter().collect();
        volume_leaders.sort_by(|a, b| {
            b.volume
                .cmp(&a.volume)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        TrendingReport {
            gainers: self.take_top(gainers),
            losers: self.take_top(losers),
            volume_leaders: self.take_top(volume_leaders),
        }
    }

    /// Aggregate catalog statistics, market cap valued at current quotes.
    pub async fn market_stats(&self) -> Result<MarketStats> {
        let snapshots = self.store.stock_snapshots().await;
        let total_market_cap: Decimal = snapshots.iter().map(|s| s.market_cap()).sum();

        Ok(MarketStats {
            total_stocks: snapshots.len(),
            total_accounts: self.store.account_count().await,
            total_transactions: self.ledger.transaction_count().await?,
            total_market_cap: total_market_cap.round_dp(2),
        })
    }

    fn take_top(&self, ranked: Vec<&Stock>) -> Vec<StockSummary> {
        ranked
            .into_iter()
            .take(self.top_n)
            .map(StockSummary::from)
            .collect()
    }
}
