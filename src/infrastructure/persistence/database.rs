use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Singleton database wrapper
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal); // Better for concurrency

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                stock_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                title TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price TEXT NOT NULL,
                amount TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create transactions table")?;

        // Index for the per-account journal reads (newest first)
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_account_time
            ON transactions (account_id, timestamp DESC);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create transactions index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                balance TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create accounts table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS holdings (
                account_id TEXT NOT NULL,
                stock_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                title TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                avg_price TEXT NOT NULL,
                PRIMARY KEY (account_id, stock_id)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create holdings table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stocks (
                id TEXT PRIMARY KEY,
                symbol TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                current_price TEXT NOT NULL,
                previous_close TEXT NOT NULL,
                initial_price TEXT NOT NULL,
                total_shares INTEGER NOT NULL,
                volume INTEGER NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create stocks table")?;

        info!("Database schema initialized");
        Ok(())
    }
}
