use crate::domain::repositories::Ledger;
use crate::domain::trading::account::{Account, Holding};
use crate::domain::trading::stock::{Stock, StockMetadata};
use crate::domain::trading::types::{OrderSide, Transaction};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// SQLite-backed `Ledger`. Decimals are stored as TEXT to avoid any float
/// round-trip; timestamps as RFC 3339 TEXT.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_transaction(&self, row: &SqliteRow) -> Result<Transaction> {
        let side: String = row.try_get("side")?;
        let quantity: i64 = row.try_get("quantity")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Transaction {
            id: parse_uuid(row, "id")?,
            account_id: parse_uuid(row, "account_id")?,
            stock_id: parse_uuid(row, "stock_id")?,
            symbol: row.try_get("symbol")?,
            title: row.try_get("title")?,
            side: OrderSide::from_str(&side)?,
            quantity: quantity as u64,
            price: parse_decimal(row, "price")?,
            amount: parse_decimal(row, "amount")?,
            timestamp: parse_timestamp(&timestamp)?,
        })
    }
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).with_context(|| format!("Invalid uuid in column {}", column))
}

fn parse_decimal(row: &SqliteRow, column: &str) -> Result<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).with_context(|| format!("Invalid decimal in column {}", column))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .context("Invalid timestamp")?
        .with_timezone(&Utc))
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn append_transaction(&self, tx: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, account_id, stock_id, symbol, title, side, quantity, price, amount, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(tx.id.to_string())
        .bind(tx.account_id.to_string())
        .bind(tx.stock_id.to_string())
        .bind(&tx.symbol)
        .bind(&tx.title)
        .bind(tx.side.to_string())
        .bind(tx.quantity as i64)
        .bind(tx.price.to_string())
        .bind(tx.amount.to_string())
        .bind(tx.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to append transaction")?;

        debug!("Journaled transaction {}", tx.id);
        Ok(())
    }

    async fn transactions_for_account(
        &self,
        account_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE account_id = ? ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(account_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load transactions")?;

        rows.iter()
            .map(|row| self.map_row_to_transaction(row))
            .collect()
    }

    async fn transaction_count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as usize)
    }

    async fn save_account(&self, account: &Account) -> Result<()> {
        let mut db_tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, balance, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                balance = excluded.balance,
                active = excluded.active
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.balance.to_string())
        .bind(account.active as i64)
        .bind(account.created_at.to_rfc3339())
        .execute(&mut *db_tx)
        .await
        .context("Failed to save account")?;

        // Holdings are replaced wholesale; the set per account is small.
        sqlx::query("DELETE FROM holdings WHERE account_id = ?")
            .bind(account.id.to_string())
            .execute(&mut *db_tx)
            .await
            .context("Failed to clear holdings")?;

        for holding in account.holdings.values() {
            sqlx::query(
                r#"
                INSERT INTO holdings (account_id, stock_id, symbol, title, quantity, avg_price)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(account.id.to_string())
            .bind(holding.stock_id.to_string())
            .bind(&holding.symbol)
            .bind(&holding.title)
            .bind(holding.quantity as i64)
            .bind(holding.avg_price.to_string())
            .execute(&mut *db_tx)
            .await
            .context("Failed to save holding")?;
        }

        db_tx.commit().await.context("Failed to commit account")?;
        Ok(())
    }

    async fn load_accounts(&self) -> Result<Vec<Account>> {
        let holding_rows = sqlx::query("SELECT * FROM holdings")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load holdings")?;

        let mut holdings_by_account: HashMap<Uuid, HashMap<Uuid, Holding>> = HashMap::new();
        for row in &holding_rows {
            let account_id = parse_uuid(row, "account_id")?;
            let quantity: i64 = row.try_get("quantity")?;
            let holding = Holding {
                stock_id: parse_uuid(row, "stock_id")?,
                symbol: row.try_get("symbol")?,
                title: row.try_get("title")?,
                quantity: quantity as u64,
                avg_price: parse_decimal(row, "avg_price")?,
            };
            holdings_by_account
                .entry(account_id)
                .or_default()
                .insert(holding.stock_id, holding);
        }

        let rows = sqlx::query("SELECT * FROM accounts")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load accounts")?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = parse_uuid(row, "id")?;
            let active: i64 = row.try_get("active")?;
            let created_at: String = row.try_get("created_at")?;
            accounts.push(Account {
                id,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                balance: parse_decimal(row, "balance")?,
                active: active != 0,
                holdings: holdings_by_account.remove(&id).unwrap_or_default(),
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(accounts)
    }

    async fn save_stock(&self, stock: &Stock) -> Result<()> {
        let metadata =
            serde_json::to_string(&stock.metadata).context("Failed to encode stock metadata")?;

        sqlx::query(
            r#"
            INSERT INTO stocks
                (id, symbol, title, current_price, previous_close, initial_price,
                 total_shares, volume, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                current_price = excluded.current_price,
                previous_close = excluded.previous_close,
                volume = excluded.volume
            "#,
        )
        .bind(stock.id.to_string())
        .bind(&stock.symbol)
        .bind(&stock.title)
        .bind(stock.current_price.to_string())
        .bind(stock.previous_close.to_string())
        .bind(stock.initial_price.to_string())
        .bind(stock.total_shares as i64)
        .bind(stock.volume as i64)
        .bind(metadata)
        .bind(stock.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save stock")?;

        Ok(())
    }

    async fn load_stocks(&self) -> Result<Vec<Stock>> {
        let rows = sqlx::query("SELECT * FROM stocks")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load stocks")?;

        let mut stocks = Vec::with_capacity(rows.len());
        for row in &rows {
            let total_shares: i64 = row.try_get("total_shares")?;
            let volume: i64 = row.try_get("volume")?;
            let metadata_raw: String = row.try_get("metadata")?;
            let metadata: StockMetadata = serde_json::from_str(&metadata_raw)
                .context("Failed to decode stock metadata")?;
            let created_at: String = row.try_get("created_at")?;

            stocks.push(Stock {
                id: parse_uuid(row, "id")?,
                symbol: row.try_get("symbol")?,
                title: row.try_get("title")?,
                current_price: parse_decimal(row, "current_price")?,
                previous_close: parse_decimal(row, "previous_close")?,
                initial_price: parse_decimal(row, "initial_price")?,
                total_shares: total_shares as u64,
                volume: volume as u64,
                metadata,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(stocks)
    }
}
