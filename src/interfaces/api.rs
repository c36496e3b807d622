//! Exchange API Facade
//!
//! The transport-agnostic surface of the engine. An HTTP layer (out of scope
//! here) resolves the authenticated principal to an `account_id` and maps
//! these calls one-to-one onto its routes; the facade never performs
//! authentication itself.

use crate::application::execution::OrderExecutionService;
use crate::application::ranking::{MarketRankingService, MarketStats, StockSummary, TrendingReport};
use crate::application::valuation::PortfolioValuationService;
use crate::domain::errors::OrderError;
use crate::domain::repositories::Ledger;
use crate::domain::trading::types::Order;
use crate::infrastructure::market_store::MarketStore;
use crate::interfaces::view_models::{
    OrderConfirmation, OrderRequest, PortfolioView, StockDetail, TransactionView,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct ExchangeApi {
    store: Arc<MarketStore>,
    ledger: Arc<dyn Ledger>,
    execution: Arc<OrderExecutionService>,
    ranking: Arc<MarketRankingService>,
    valuation: Arc<PortfolioValuationService>,
    transactions_limit: usize,
}

impl ExchangeApi {
    pub fn new(
        store: Arc<MarketStore>,
        ledger: Arc<dyn Ledger>,
        execution: Arc<OrderExecutionService>,
        ranking: Arc<MarketRankingService>,
        valuation: Arc<PortfolioValuationService>,
        transactions_limit: usize,
    ) -> Self {
        Self {
            store,
            ledger,
            execution,
            ranking,
            valuation,
            transactions_limit,
        }
    }

    /// The whole catalog, sorted by symbol for a stable listing.
    pub async fn get_catalog(&self) -> Vec<StockSummary> {
        let mut entries: Vec<StockSummary> = self
            .store
            .stock_snapshots()
            .await
            .iter()
            .map(StockSummary::from)
            .collect();
        entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        entries
    }

    pub async fn get_stock(&self, stock_id: Uuid) -> Result<StockDetail, OrderError> {
        let stock = self
            .store
            .stock_snapshot(stock_id)
            .await
            .ok_or(OrderError::StockNotFound { stock_id })?;
        Ok(StockDetail::from(&stock))
    }

    pub async fn get_trending(&self) -> TrendingReport {
        self.ranking.trending().await
    }

    pub async fn get_market_stats(&self) -> Result<MarketStats, OrderError> {
        self.ranking.market_stats().await.map_err(OrderError::Ledger)
    }

    pub async fn get_portfolio(&self, account_id: Uuid) -> Result<PortfolioView, OrderError> {
        let report = self.valuation.valuate(account_id).await?;
        Ok(PortfolioView::from(&report))
    }

    pub async fn get_transactions(
        &self,
        account_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<TransactionView>, OrderError> {
        if self.store.account(account_id).await.is_none() {
            return Err(OrderError::AccountNotFound { account_id });
        }

        let limit = limit.unwrap_or(self.transactions_limit);
        let transactions = self
            .ledger
            .transactions_for_account(account_id, limit)
            .await
            .map_err(OrderError::Ledger)?;
        Ok(transactions.iter().map(TransactionView::from).collect())
    }

    pub async fn place_order(
        &self,
        account_id: Uuid,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, OrderError> {
        let (side, quantity, kind) = request.parse()?;

        let receipt = self
            .execution
            .place_order(Order {
                account_id,
                stock_id: request.movie_id,
                side,
                quantity,
                kind,
            })
            .await?;

        Ok(OrderConfirmation {
            message: "Order placed successfully".to_string(),
            transaction: TransactionView::from(&receipt.transaction),
            balance: receipt.balance,
            holding_quantity: receipt.holding.as_ref().map_or(0, |h| h.quantity),
            realized_pl: receipt.realized_pl,
            stock: StockSummary::from(&receipt.stock),
        })
    }
}
