//! Order Execution Service
//!
//! Settles one market order end to end: validate, check funds/holdings,
//! journal, mutate the account, reprice the stock. The account mutex is held
//! from the first balance read to the in-memory commit, so the check can
//! never pass against a stale balance. Lock order is account first, then
//! stock (inside the quote read and again inside the fill update), never the
//! reverse.
//!
//! The ledger append is the commit point: any failure before it leaves no
//! observable state change; snapshot persistence after it is durability
//! catch-up and never unwinds a settled order.

use crate::domain::errors::OrderError;
use crate::domain::repositories::Ledger;
use crate::domain::trading::account::Holding;
use crate::domain::trading::stock::Stock;
use crate::domain::trading::types::{Order, OrderKind, OrderSide, Transaction};
use crate::infrastructure::market_store::MarketStore;
use crate::application::pricing::PriceEngine;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything the caller needs after a fill, so no follow-up read (or page
/// reload) is required to see the new balance.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub transaction: Transaction,
    /// Account balance after settlement.
    pub balance: Decimal,
    /// The holding after settlement; `None` when a sell closed the position.
    pub holding: Option<Holding>,
    /// Realized P&L of a sell fill; `None` for buys.
    pub realized_pl: Option<Decimal>,
    /// The stock as repriced by this fill.
    pub stock: Stock,
}

pub struct OrderExecutionService {
    store: Arc<MarketStore>,
    ledger: Arc<dyn Ledger>,
    pricing: Arc<PriceEngine>,
}

impl OrderExecutionService {
    pub fn new(store: Arc<MarketStore>, ledger: Arc<dyn Ledger>, pricing: Arc<PriceEngine>) -> Self {
        Self {
            store,
            ledger,
            pricing,
        }
    }

    pub async fn place_order(&self, order: Order) -> Result<OrderReceipt, OrderError> {
        if order.quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity: 0 });
        }
        if order.kind != OrderKind::Market {
            return Err(OrderError::UnsupportedOrderKind {
                kind: order.kind.to_string(),
            });
        }

        let account_handle = self
            .store
            .account(order.account_id)
            .await
            .ok_or(OrderError::AccountNotFound {
                account_id: order.account_id,
            })?;

        // Serialization point: the whole check-then-act window runs under
        // this lock.
        let mut account = account_handle.lock().await;
        if !account.active {
            return Err(OrderError::AccountInactive {
                account_id: order.account_id,
            });
        }

        let stock = self
            .store
            .stock_snapshot(order.stock_id)
            .await
            .ok_or(OrderError::StockNotFound {
                stock_id: order.stock_id,
            })?;
        let quote = stock.current_price;
        let amount = Decimal::from(order.quantity) * quote;

        // Pure pre-checks; the entity methods re-check at commit but under
        // this lock the answer cannot change.
        match order.side {
            OrderSide::Buy => {
                if amount > account.balance {
                    return Err(OrderError::InsufficientFunds {
                        need: amount,
                        available: account.balance,
                    });
                }
            }
            OrderSide::Sell => {
                let held = account.holding_quantity(order.stock_id);
                if order.quantity > held {
                    return Err(OrderError::InsufficientHoldings {
                        requested: order.quantity,
                        held,
                    });
                }
            }
        }

        let transaction = Transaction {
            id: Uuid::new_v4(),
            account_id: order.account_id,
            stock_id: order.stock_id,
            symbol: stock.symbol.clone(),
            title: stock.title.clone(),
            side: order.side,
            quantity: order.quantity,
            price: quote,
            amount,
            timestamp: Utc::now(),
        };

        // Commit point. A journal failure aborts with nothing mutated.
        self.ledger
            .append_transaction(&transaction)
            .await
            .map_err(OrderError::Ledger)?;

        let realized_pl = match order.side {
            OrderSide::Buy => {
                account.buy(
                    order.stock_id,
                    &stock.symbol,
                    &stock.title,
                    order.quantity,
                    quote,
                )?;
                None
            }
            OrderSide::Sell => {
                let (_, pl) = account.sell(order.stock_id, order.quantity, quote)?;
                Some(pl)
            }
        };

        let balance = account.balance;
        let holding = account.holdings.get(&order.stock_id).cloned();
        let account_snapshot = account.clone();
        drop(account);

        // Post-commit: reprice from the fill, then catch up the durable
        // snapshots. Neither may unwind the settled order.
        let updated_stock = self
            .pricing
            .apply_fill(order.stock_id, order.side, order.quantity)
            .await?;

        if let Err(e) = self.ledger.save_account(&account_snapshot).await {
            warn!("Account snapshot persist failed for {}: {:#}", account_snapshot.id, e);
        }
        if let Err(e) = self.ledger.save_stock(&updated_stock).await {
            warn!("Stock snapshot persist failed for {}: {:#}", updated_stock.symbol, e);
        }

        info!(
            "{} {} x{} @ {} settled for account {} (balance {})",
            order.side, updated_stock.symbol, order.quantity, quote, order.account_id, balance
        );

        Ok(OrderReceipt {
            transaction,
            balance,
            holding,
            realized_pl,
            stock: updated_stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pricing::PricingConfig;
    use crate::domain::trading::stock::StockMetadata;
    use crate::infrastructure::repositories::InMemoryLedger;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<MarketStore>,
        ledger: Arc<InMemoryLedger>,
        service: OrderExecutionService,
        account_id: Uuid,
        stock_id: Uuid,
    }

    async fn fixture(price: Decimal, total_shares: u64) -> Fixture {
        let store = Arc::new(MarketStore::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let pricing = Arc::new(PriceEngine::new(store.clone(), PricingConfig::default()));

        let account = store
            .create_account("Asha", "asha@example.com", dec!(100000))
            .await
            .unwrap();
        let stock = Stock::new("Fighter", price, total_shares, StockMetadata::default());
        let stock_id = stock.id;
        store.insert_stock(stock).await.unwrap();

        let service =
            OrderExecutionService::new(store.clone(), ledger.clone(), pricing);
        Fixture {
            store,
            ledger,
            service,
            account_id: account.id,
            stock_id,
        }
    }

    fn order(f: &Fixture, side: OrderSide, quantity: u64) -> Order {
        Order {
            account_id: f.account_id,
            stock_id: f.stock_id,
            side,
            quantity,
            kind: OrderKind::Market,
        }
    }

    #[tokio::test]
    async fn test_buy_then_sell_scenario() {
        // The canonical flow: 100000 start, buy 10 @ 120, sell 4 @ 130.
        let f = fixture(dec!(120.00), 1_000_000).await;

        let receipt = f
            .service
            .place_order(order(&f, OrderSide::Buy, 10))
            .await
            .unwrap();

        assert_eq!(receipt.balance, dec!(98800.00));
        assert_eq!(receipt.transaction.amount, dec!(1200.00));
        let holding = receipt.holding.unwrap();
        assert_eq!(holding.quantity, 10);
        assert_eq!(holding.avg_price, dec!(120.00));
        assert!(receipt.realized_pl.is_none());

        // The market moved since the buy; sell 4 at the new quote of 130.
        {
            let handle = f.store.stock(f.stock_id).await.unwrap();
            handle.lock().await.current_price = dec!(130.00);
        }

        let receipt = f
            .service
            .place_order(order(&f, OrderSide::Sell, 4))
            .await
            .unwrap();

        assert_eq!(receipt.balance, dec!(99320.00));
        assert_eq!(receipt.transaction.amount, dec!(520.00));
        assert_eq!(receipt.realized_pl, Some(dec!(40.00)));
        let holding = receipt.holding.unwrap();
        assert_eq!(holding.quantity, 6);
        assert_eq!(holding.avg_price, dec!(120.00));

        assert_eq!(f.ledger.transaction_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected_before_touching_state() {
        let f = fixture(dec!(100), 100_000).await;

        let err = f
            .service
            .place_order(order(&f, OrderSide::Buy, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InvalidQuantity { quantity: 0 }));
        assert_eq!(f.ledger.transaction_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overdraw_buy_rejected_without_state_change() {
        let f = fixture(dec!(100), 100_000).await;

        let err = f
            .service
            .place_order(order(&f, OrderSide::Buy, 1_001))
            .await
            .unwrap_err();

        assert!(
            matches!(err, OrderError::InsufficientFunds { need, available }
                if need == dec!(100100) && available == dec!(100000))
        );
        let account = f.store.account_snapshot(f.account_id).await.unwrap();
        assert_eq!(account.balance, dec!(100000));
        assert!(account.holdings.is_empty());
        // No journal entry, no price movement
        assert_eq!(f.ledger.transaction_count().await.unwrap(), 0);
        let stock = f.store.stock_snapshot(f.stock_id).await.unwrap();
        assert_eq!(stock.current_price, dec!(100));
        assert_eq!(stock.volume, 0);
    }

    #[tokio::test]
    async fn test_oversell_rejected_holding_unchanged() {
        let f = fixture(dec!(100), 100_000).await;
        f.service
            .place_order(order(&f, OrderSide::Buy, 5))
            .await
            .unwrap();

        let err = f
            .service
            .place_order(order(&f, OrderSide::Sell, 6))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientHoldings { requested: 6, held: 5 }
        ));
        let account = f.store.account_snapshot(f.account_id).await.unwrap();
        assert_eq!(account.holding_quantity(f.stock_id), 5);
    }

    #[tokio::test]
    async fn test_unknown_stock_and_account() {
        let f = fixture(dec!(100), 100_000).await;

        let mut bad_stock = order(&f, OrderSide::Buy, 1);
        bad_stock.stock_id = Uuid::new_v4();
        assert!(matches!(
            f.service.place_order(bad_stock).await.unwrap_err(),
            OrderError::StockNotFound { .. }
        ));

        let mut bad_account = order(&f, OrderSide::Buy, 1);
        bad_account.account_id = Uuid::new_v4();
        assert!(matches!(
            f.service.place_order(bad_account).await.unwrap_err(),
            OrderError::AccountNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_trade() {
        let f = fixture(dec!(100), 100_000).await;
        f.store.deactivate_account(f.account_id).await.unwrap();

        let err = f
            .service
            .place_order(order(&f, OrderSide::Buy, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::AccountInactive { .. }));
    }

    #[tokio::test]
    async fn test_fill_moves_quote_and_volume() {
        let f = fixture(dec!(100), 10_000).await;

        let receipt = f
            .service
            .place_order(order(&f, OrderSide::Buy, 100))
            .await
            .unwrap();

        // Executed at the pre-fill quote, repriced after
        assert_eq!(receipt.transaction.price, dec!(100));
        assert_eq!(receipt.stock.current_price, dec!(100.50));
        assert_eq!(receipt.stock.volume, 100);
    }

    #[tokio::test]
    async fn test_settled_order_persists_snapshots() {
        let f = fixture(dec!(100), 10_000).await;

        f.service
            .place_order(order(&f, OrderSide::Buy, 10))
            .await
            .unwrap();

        let accounts = f.ledger.load_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, dec!(99000));
        let stocks = f.ledger.load_stocks().await.unwrap();
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].volume, 10);
    }
}
