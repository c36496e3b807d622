//! Races the execution service from many tasks to validate the per-account
//! and per-stock serialization discipline.

use reeltrade::application::execution::OrderExecutionService;
use reeltrade::application::pricing::{PriceEngine, PricingConfig};
use reeltrade::domain::errors::OrderError;
use reeltrade::domain::repositories::Ledger;
use reeltrade::domain::trading::stock::{Stock, StockMetadata};
use reeltrade::domain::trading::types::{Order, OrderKind, OrderSide};
use reeltrade::infrastructure::market_store::MarketStore;
use reeltrade::infrastructure::repositories::InMemoryLedger;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

async fn service_with(
    balance: Decimal,
    price: Decimal,
) -> (Arc<OrderExecutionService>, Arc<MarketStore>, Uuid, Uuid) {
    let store = Arc::new(MarketStore::new());
    let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new());
    let pricing = Arc::new(PriceEngine::new(store.clone(), PricingConfig::default()));

    let account = store
        .create_account("Asha", "asha@example.com", balance)
        .await
        .unwrap();
    // Huge issue keeps the quote effectively flat during the race, so every
    // fill debits a predictable amount.
    let stock = Stock::new("Fighter", price, u32::MAX as u64, StockMetadata::default());
    let stock_id = stock.id;
    store.insert_stock(stock).await.unwrap();

    let service = Arc::new(OrderExecutionService::new(store.clone(), ledger, pricing));
    (service, store, account.id, stock_id)
}

fn order(account_id: Uuid, stock_id: Uuid, side: OrderSide, quantity: u64) -> Order {
    Order {
        account_id,
        stock_id,
        side,
        quantity,
        kind: OrderKind::Market,
    }
}

/// Two concurrent buys that individually fit but jointly overdraw: exactly
/// one settles.
#[tokio::test]
async fn test_joint_overdraw_settles_exactly_one_order() {
    let (service, store, account_id, stock_id) = service_with(dec!(1000), dec!(100)).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .place_order(order(account_id, stock_id, OrderSide::Buy, 6))
                .await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(OrderError::InsufficientFunds { .. }) => insufficient += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(insufficient, 1);
    let account = store.account_snapshot(account_id).await.unwrap();
    assert_eq!(account.balance, dec!(400));
    assert_eq!(account.holding_quantity(stock_id), 6);
}

/// A storm of buys never debits more than the starting balance in total.
#[tokio::test]
async fn test_total_debits_never_exceed_starting_balance() {
    let starting = dec!(1000);
    let (service, store, account_id, stock_id) = service_with(starting, dec!(100)).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .place_order(order(account_id, stock_id, OrderSide::Buy, 3))
                .await
        }));
    }

    let mut debited = Decimal::ZERO;
    for handle in handles {
        if let Ok(receipt) = handle.await.unwrap() {
            debited += receipt.transaction.amount;
        }
    }

    assert!(debited <= starting);
    let account = store.account_snapshot(account_id).await.unwrap();
    assert!(account.balance >= Decimal::ZERO);
    assert_eq!(account.balance, starting - debited);
}

/// Concurrent sells can never take a holding below zero.
#[tokio::test]
async fn test_concurrent_sells_never_oversell() {
    let (service, store, account_id, stock_id) = service_with(dec!(100000), dec!(100)).await;
    service
        .place_order(order(account_id, stock_id, OrderSide::Buy, 10))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .place_order(order(account_id, stock_id, OrderSide::Sell, 4))
                .await
        }));
    }

    let mut sold = 0u64;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            sold += 4;
        }
    }

    // 10 held: two sells of 4 fit, the rest must fail.
    assert_eq!(sold, 8);
    let account = store.account_snapshot(account_id).await.unwrap();
    assert_eq!(account.holding_quantity(stock_id), 2);
}

/// Orders from different accounts on the same stock make progress and every
/// fill lands in the stock's volume. Also exercises the account-then-stock
/// lock order from many tasks at once.
#[tokio::test]
async fn test_cross_account_fills_all_reach_the_stock() {
    let store = Arc::new(MarketStore::new());
    let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new());
    let pricing = Arc::new(PriceEngine::new(store.clone(), PricingConfig::default()));
    let stock = Stock::new("Crew", dec!(50), u32::MAX as u64, StockMetadata::default());
    let stock_id = stock.id;
    store.insert_stock(stock).await.unwrap();
    let service = Arc::new(OrderExecutionService::new(
        store.clone(),
        ledger.clone(),
        pricing,
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let account = store
            .create_account(&format!("Trader {}", i), &format!("t{}@example.com", i), dec!(10000))
            .await
            .unwrap();
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .place_order(order(account.id, stock_id, OrderSide::Buy, 5))
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stock = store.stock_snapshot(stock_id).await.unwrap();
    assert_eq!(stock.volume, 40);
    assert_eq!(ledger.transaction_count().await.unwrap(), 8);
}
