//! In-Memory Ledger Implementation
//!
//! Thread-safe, in-memory implementation of the `Ledger` trait. Backs unit
//! tests and development runs; data is lost on restart. For durability use
//! `SqliteLedger` from `infrastructure::persistence`.

use crate::domain::repositories::Ledger;
use crate::domain::trading::account::Account;
use crate::domain::trading::stock::Stock;
use crate::domain::trading::types::Transaction;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct InMemoryLedger {
    transactions: RwLock<Vec<Transaction>>,
    accounts: RwLock<HashMap<Uuid, Account>>,
    stocks: RwLock<HashMap<Uuid, Stock>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
            accounts: RwLock::new(HashMap::new()),
            stocks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn append_transaction(&self, tx: &Transaction) -> Result<()> {
        self.transactions.write().await.push(tx.clone());
        Ok(())
    }

    async fn transactions_for_account(
        &self,
        account_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn transaction_count(&self) -> Result<usize> {
        Ok(self.transactions.read().await.len())
    }

    async fn save_account(&self, account: &Account) -> Result<()> {
        self.accounts
            .write()
            .await
            .insert(account.id, account.clone());
        Ok(())
    }

    async fn load_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }

    async fn save_stock(&self, stock: &Stock) -> Result<()> {
        self.stocks.write().await.insert(stock.id, stock.clone());
        Ok(())
    }

    async fn load_stocks(&self) -> Result<Vec<Stock>> {
        Ok(self.stocks.read().await.values().cloned().collect())
    }
}
