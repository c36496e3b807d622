//! Shared Market State
//!
//! `MarketStore` holds every account and every listed stock behind explicit
//! locks. It is the one shared-state object of the engine: services receive
//! an `Arc<MarketStore>` handle instead of touching ambient globals.
//!
//! # Locking discipline
//!
//! The outer `RwLock<HashMap>` maps only guard membership (listing a stock,
//! registering an account) and are held briefly. Each entity sits behind its
//! own `Arc<Mutex<_>>`:
//!
//! - the per-account mutex serializes the whole check-then-act window of an
//!   order (funds/holdings check + mutation), so two concurrent orders can
//!   never both pass validation against a stale balance;
//! - the per-stock mutex serializes price/volume writes from fills.
//!
//! Lock order is always account before stock, and a stock lock is released
//! before another is taken. No operation holds two account locks.

use crate::domain::trading::account::Account;
use crate::domain::trading::stock::Stock;
use anyhow::{Result, bail};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub struct MarketStore {
    accounts: RwLock<HashMap<Uuid, Arc<Mutex<Account>>>>,
    stocks: RwLock<HashMap<Uuid, Arc<Mutex<Stock>>>>,
    // Secondary indexes: symbol -> stock id, email -> account id
    symbols: RwLock<HashMap<String, Uuid>>,
    emails: RwLock<HashMap<String, Uuid>>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            stocks: RwLock::new(HashMap::new()),
            symbols: RwLock::new(HashMap::new()),
            emails: RwLock::new(HashMap::new()),
        }
    }

    // ---- Accounts ----

    /// Register a new account with the configured starting balance.
    pub async fn create_account(
        &self,
        name: &str,
        email: &str,
        starting_balance: Decimal,
    ) -> Result<Account> {
        let mut emails = self.emails.write().await;
        if emails.contains_key(email) {
            bail!("Email already registered: {}", email);
        }

        let account = Account::new(name, email, starting_balance);
        emails.insert(email.to_string(), account.id);
        self.accounts
            .write()
            .await
            .insert(account.id, Arc::new(Mutex::new(account.clone())));
        Ok(account)
    }

    /// Re-insert an account loaded from the durable ledger.
    pub async fn restore_account(&self, account: Account) {
        self.emails
            .write()
            .await
            .insert(account.email.clone(), account.id);
        self.accounts
            .write()
            .await
            .insert(account.id, Arc::new(Mutex::new(account)));
    }

    /// Handle to an account's lock, if the account exists.
    pub async fn account(&self, account_id: Uuid) -> Option<Arc<Mutex<Account>>> {
        self.accounts.read().await.get(&account_id).cloned()
    }

    pub async fn account_snapshot(&self, account_id: Uuid) -> Option<Account> {
        let handle = self.account(account_id).await?;
        let account = handle.lock().await;
        Some(account.clone())
    }

    /// Mark an account inactive. Accounts are never deleted.
    pub async fn deactivate_account(&self, account_id: Uuid) -> Result<()> {
        let Some(handle) = self.account(account_id).await else {
            bail!("Account not found: {}", account_id);
        };
        handle.lock().await.active = false;
        Ok(())
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    // ---- Stocks ----

    /// List a stock. Symbols are unique and immutable.
    pub async fn insert_stock(&self, stock: Stock) -> Result<()> {
        let mut symbols = self.symbols.write().await;
        if symbols.contains_key(&stock.symbol) {
            bail!("Symbol already listed: {}", stock.symbol);
        }
        symbols.insert(stock.symbol.clone(), stock.id);
        self.stocks
            .write()
            .await
            .insert(stock.id, Arc::new(Mutex::new(stock)));
        Ok(())
    }

    /// Handle to a stock's lock, if the stock is listed.
    pub async fn stock(&self, stock_id: Uuid) -> Option<Arc<Mutex<Stock>>> {
        self.stocks.read().await.get(&stock_id).cloned()
    }

    pub async fn stock_by_symbol(&self, symbol: &str) -> Option<Arc<Mutex<Stock>>> {
        let id = *self.symbols.read().await.get(symbol)?;
        self.stock(id).await
    }

    pub async fn stock_snapshot(&self, stock_id: Uuid) -> Option<Stock> {
        let handle = self.stock(stock_id).await?;
        let stock = handle.lock().await;
        Some(stock.clone())
    }

    /// Point-in-time copies of every listed stock. Each stock lock is taken
    /// briefly in turn; readers may observe at most one in-flight fill late.
    pub async fn stock_snapshots(&self) -> Vec<Stock> {
        let handles: Vec<Arc<Mutex<Stock>>> =
            self.stocks.read().await.values().cloned().collect();

        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshots.push(handle.lock().await.clone());
        }
        snapshots
    }

    pub async fn stock_count(&self) -> usize {
        self.stocks.read().await.len()
    }
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::stock::StockMetadata;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_account_rejects_duplicate_email() {
        let store = MarketStore::new();

        store
            .create_account("Asha", "asha@example.com", dec!(100000))
            .await
            .unwrap();
        let err = store
            .create_account("Asha Again", "asha@example.com", dec!(100000))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already registered"));
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_stock_rejects_duplicate_symbol() {
        let store = MarketStore::new();

        store
            .insert_stock(Stock::new("Fighter", dec!(120), 50_000, StockMetadata::default()))
            .await
            .unwrap();
        let err = store
            .insert_stock(Stock::new("Fighter", dec!(130), 60_000, StockMetadata::default()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already listed"));
        assert_eq!(store.stock_count().await, 1);
    }

    #[tokio::test]
    async fn test_stock_lookup_by_symbol() {
        let store = MarketStore::new();
        let stock = Stock::new("War 2", dec!(250), 80_000, StockMetadata::default());
        let id = stock.id;
        store.insert_stock(stock).await.unwrap();

        let handle = store.stock_by_symbol("WAR2").await.unwrap();
        assert_eq!(handle.lock().await.id, id);
        assert!(store.stock_by_symbol("NOPE").await.is_none());
    }

    #[tokio::test]
    async fn test_deactivate_account() {
        let store = MarketStore::new();
        let account = store
            .create_account("Ravi", "ravi@example.com", dec!(100000))
            .await
            .unwrap();

        store.deactivate_account(account.id).await.unwrap();

        let snapshot = store.account_snapshot(account.id).await.unwrap();
        assert!(!snapshot.active);
    }

    #[tokio::test]
    async fn test_snapshots_are_point_in_time_copies() {
        let store = MarketStore::new();
        let stock = Stock::new("Crew", dec!(90), 70_000, StockMetadata::default());
        let id = stock.id;
        store.insert_stock(stock).await.unwrap();

        let mut snapshot = store.stock_snapshot(id).await.unwrap();
        snapshot.current_price = dec!(999);

        // Mutating the copy must not touch the store.
        let fresh = store.stock_snapshot(id).await.unwrap();
        assert_eq!(fresh.current_price, dec!(90));
    }
}
