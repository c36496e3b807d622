//! Price Engine
//!
//! Quotes are a pure function of trading activity, not an external feed:
//! every committed fill nudges the price in the direction of the order flow,
//! scaled by how large the fill is relative to the stock's issued shares.
//!
//! Impact model (per fill):
//! `impact_pct = min(coefficient * quantity / total_shares * 100, max_move_pct)`
//! signed by side, and the result is floored at `initial_price *
//! min_price_ratio` so a quote can never reach zero.

use crate::domain::errors::OrderError;
use crate::domain::trading::stock::Stock;
use crate::domain::trading::types::OrderSide;
use crate::infrastructure::market_store::MarketStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Scales volume-relative impact into a percentage move.
    pub impact_coefficient: Decimal,
    /// Hard cap on the move a single fill can cause, in percent.
    pub max_move_pct: Decimal,
    /// Quote floor as a fraction of the listing price.
    pub min_price_ratio: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            impact_coefficient: dec!(0.5),
            max_move_pct: dec!(5.0),
            min_price_ratio: dec!(0.1),
        }
    }
}

pub struct PriceEngine {
    store: Arc<MarketStore>,
    config: PricingConfig,
}

impl PriceEngine {
    pub fn new(store: Arc<MarketStore>, config: PricingConfig) -> Self {
        Self { store, config }
    }

    /// Current tradeable price for a stock.
    pub async fn quote(&self, stock_id: Uuid) -> Result<Decimal, OrderError> {
        let handle = self
            .store
            .stock(stock_id)
            .await
            .ok_or(OrderError::StockNotFound { stock_id })?;
        let stock = handle.lock().await;
        Ok(stock.current_price)
    }

    /// Reprice a stock from a committed fill and bump its traded volume.
    /// Called only by the execution service, after settlement. The per-stock
    /// lock is held for the whole update, so concurrent fills apply in a
    /// well-defined order.
    pub async fn apply_fill(
        &self,
        stock_id: Uuid,
        side: OrderSide,
        quantity: u64,
    ) -> Result<Stock, OrderError> {
        let handle = self
            .store
            .stock(stock_id)
            .await
            .ok_or(OrderError::StockNotFound { stock_id })?;
        let mut stock = handle.lock().await;

        let raw_impact = self.config.impact_coefficient * Decimal::from(quantity)
            / Decimal::from(stock.total_shares)
            * dec!(100);
        let impact_pct = raw_impact.min(self.config.max_move_pct);
        let signed_pct = match side {
            OrderSide::Buy => impact_pct,
            OrderSide::Sell => -impact_pct,
        };

        let floor = (stock.initial_price * self.config.min_price_ratio).round_dp(2);
        let moved = (stock.current_price * (Decimal::ONE + signed_pct / dec!(100))).round_dp(2);
        stock.current_price = moved.max(floor);
        stock.volume += quantity;

        debug!(
            "Fill {} x{} on {}: impact {:.4}%, quote {}",
            side, quantity, stock.symbol, signed_pct, stock.current_price
        );

        Ok(stock.clone())
    }

    /// Start a new trading period for every listed stock: the current quote
    /// becomes the previous close and traded volume resets. The scheduling of
    /// this reset lives outside the engine.
    pub async fn roll_trading_period(&self) -> usize {
        let snapshots = self.store.stock_snapshots().await;
        let mut rolled = 0;
        for snapshot in &snapshots {
            if let Some(handle) = self.store.stock(snapshot.id).await {
                handle.lock().await.roll_period();
                rolled += 1;
            }
        }
        info!("Trading period rolled for {} stocks", rolled);
        rolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::stock::StockMetadata;

    async fn engine_with_stock(
        price: Decimal,
        total_shares: u64,
    ) -> (PriceEngine, Arc<MarketStore>, Uuid) {
        let store = Arc::new(MarketStore::new());
        let stock = Stock::new("Fighter", price, total_shares, StockMetadata::default());
        let id = stock.id;
        store.insert_stock(stock).await.unwrap();
        let engine = PriceEngine::new(store.clone(), PricingConfig::default());
        (engine, store, id)
    }

    #[tokio::test]
    async fn test_buy_fill_pushes_price_up() {
        let (engine, _, id) = engine_with_stock(dec!(100), 10_000).await;

        // impact = 0.5 * 100 / 10000 * 100 = 0.5% => 100.50
        let stock = engine.apply_fill(id, OrderSide::Buy, 100).await.unwrap();

        assert_eq!(stock.current_price, dec!(100.50));
        assert_eq!(stock.volume, 100);
        assert_eq!(stock.change_percent(), dec!(0.50));
    }

    #[tokio::test]
    async fn test_sell_fill_pushes_price_down() {
        let (engine, _, id) = engine_with_stock(dec!(100), 10_000).await;

        let stock = engine.apply_fill(id, OrderSide::Sell, 100).await.unwrap();

        assert_eq!(stock.current_price, dec!(99.50));
        assert_eq!(stock.volume, 100);
    }

    #[tokio::test]
    async fn test_impact_capped_at_max_move() {
        let (engine, _, id) = engine_with_stock(dec!(100), 10_000).await;

        // raw impact = 0.5 * 5000 / 10000 * 100 = 25%, capped to 5%
        let stock = engine.apply_fill(id, OrderSide::Buy, 5_000).await.unwrap();

        assert_eq!(stock.current_price, dec!(105.00));
    }

    #[tokio::test]
    async fn test_price_floored_at_ratio_of_listing_price() {
        let (engine, store, id) = engine_with_stock(dec!(100), 1_000).await;
        {
            let handle = store.stock(id).await.unwrap();
            handle.lock().await.current_price = dec!(10.20);
        }

        // 5% down from 10.20 would be 9.69, below the 10.00 floor
        let stock = engine.apply_fill(id, OrderSide::Sell, 1_000).await.unwrap();

        assert_eq!(stock.current_price, dec!(10.00));
    }

    #[tokio::test]
    async fn test_volume_accumulates_regardless_of_side() {
        let (engine, _, id) = engine_with_stock(dec!(100), 100_000).await;

        engine.apply_fill(id, OrderSide::Buy, 300).await.unwrap();
        let stock = engine.apply_fill(id, OrderSide::Sell, 200).await.unwrap();

        assert_eq!(stock.volume, 500);
    }

    #[tokio::test]
    async fn test_quote_for_unknown_stock_fails() {
        let (engine, _, _) = engine_with_stock(dec!(100), 10_000).await;

        let missing = Uuid::new_v4();
        let err = engine.quote(missing).await.unwrap_err();
        assert!(matches!(err, OrderError::StockNotFound { stock_id } if stock_id == missing));
    }

    #[tokio::test]
    async fn test_roll_trading_period_resets_close_and_volume() {
        let (engine, store, id) = engine_with_stock(dec!(100), 10_000).await;
        engine.apply_fill(id, OrderSide::Buy, 100).await.unwrap();

        let rolled = engine.roll_trading_period().await;

        assert_eq!(rolled, 1);
        let stock = store.stock_snapshot(id).await.unwrap();
        assert_eq!(stock.previous_close, dec!(100.50));
        assert_eq!(stock.volume, 0);
        assert_eq!(stock.change_percent(), dec!(0));
    }
}
