//! Market Drift Simulator
//!
//! Optional background task that nudges every quote by a small random amount
//! each tick, so a quiet market still looks alive. Volume is untouched; only
//! fills trade. The engine's correctness never depends on this running.

use crate::application::pricing::PricingConfig;
use crate::infrastructure::market_store::MarketStore;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct MarketSimulator {
    store: Arc<MarketStore>,
    /// Maximum drift per tick in basis points (200 = ±2%).
    max_drift_bps: i64,
    min_price_ratio: Decimal,
}

impl MarketSimulator {
    pub fn new(store: Arc<MarketStore>, max_drift_bps: i64, pricing: &PricingConfig) -> Self {
        Self {
            store,
            max_drift_bps,
            min_price_ratio: pricing.min_price_ratio,
        }
    }

    /// Apply one round of drift to every listed stock.
    pub async fn tick(&self) -> usize {
        let snapshots = self.store.stock_snapshots().await;
        let mut moved = 0;

        for snapshot in &snapshots {
            let drift_bps: i64 = {
                let mut rng = rand::rng();
                rng.random_range(-self.max_drift_bps..=self.max_drift_bps)
            };
            let factor = Decimal::ONE + Decimal::new(drift_bps, 4);

            let Some(handle) = self.store.stock(snapshot.id).await else {
                continue;
            };
            let mut stock = handle.lock().await;
            let floor = (stock.initial_price * self.min_price_ratio).round_dp(2);
            stock.current_price = (stock.current_price * factor).round_dp(2).max(floor);
            moved += 1;
        }

        debug!("Simulator tick moved {} quotes", moved);
        moved
    }

    /// Tick forever on a fixed interval. Intended to be spawned.
    pub async fn run(self, interval_secs: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::stock::{Stock, StockMetadata};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_tick_keeps_quotes_within_drift_band_and_above_floor() {
        let store = Arc::new(MarketStore::new());
        let stock = Stock::new("Fighter", dec!(100), 100_000, StockMetadata::default());
        let id = stock.id;
        store.insert_stock(stock).await.unwrap();

        let simulator = MarketSimulator::new(store.clone(), 200, &PricingConfig::default());

        for _ in 0..50 {
            let before = store.stock_snapshot(id).await.unwrap().current_price;
            simulator.tick().await;
            let after = store.stock_snapshot(id).await.unwrap().current_price;

            assert!(after >= dec!(10.00)); // floor: 10% of listing price
            let band = before * dec!(0.02) + dec!(0.01); // rounding slack
            assert!((after - before).abs() <= band);
        }
    }

    #[tokio::test]
    async fn test_tick_does_not_touch_volume() {
        let store = Arc::new(MarketStore::new());
        let mut stock = Stock::new("Crew", dec!(100), 100_000, StockMetadata::default());
        stock.volume = 777;
        let id = stock.id;
        store.insert_stock(stock).await.unwrap();

        MarketSimulator::new(store.clone(), 200, &PricingConfig::default())
            .tick()
            .await;

        assert_eq!(store.stock_snapshot(id).await.unwrap().volume, 777);
    }
}
