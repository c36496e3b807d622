//! Ledger Persistence Abstraction
//!
//! The engine settles orders against the in-memory `MarketStore`; the
//! `Ledger` trait is the durable side: an append-only transaction journal
//! plus account/stock snapshots for restart recovery.
//!
//! The `InMemory` implementation backs tests and development; the SQLite
//! implementation backs single-instance deployments. Both live under
//! `infrastructure`.

use crate::domain::trading::account::Account;
use crate::domain::trading::stock::Stock;
use crate::domain::trading::types::Transaction;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Durable store for the trading ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append one settled transaction. The journal is append-only; a
    /// transaction is never mutated or deleted.
    async fn append_transaction(&self, tx: &Transaction) -> Result<()>;

    /// Transactions for an account, newest first, at most `limit`.
    async fn transactions_for_account(
        &self,
        account_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Transaction>>;

    /// Total number of journaled transactions.
    async fn transaction_count(&self) -> Result<usize>;

    /// Upsert an account snapshot (balance + holdings).
    async fn save_account(&self, account: &Account) -> Result<()>;

    /// Load all account snapshots.
    async fn load_accounts(&self) -> Result<Vec<Account>>;

    /// Upsert a stock snapshot (price/volume state + metadata).
    async fn save_stock(&self, stock: &Stock) -> Result<()>;

    /// Load all stock snapshots.
    async fn load_stocks(&self) -> Result<Vec<Stock>>;
}
