//! Reeltrade Server - Headless movie-stock trading engine
//!
//! Boots the market from its SQLite ledger (seeding the catalog on first
//! run), then keeps the background tasks running: the trading-period roll
//! and the optional market drift simulator. Transport layers consume the
//! `ExchangeApi` facade from the library; this binary runs the market.
//!
//! # Usage
//! ```sh
//! RUST_LOG=info cargo run -- --database-url sqlite://data/reeltrade.db
//! ```

use anyhow::Result;
use clap::Parser;
use reeltrade::application::execution::OrderExecutionService;
use reeltrade::application::pricing::PriceEngine;
use reeltrade::application::ranking::MarketRankingService;
use reeltrade::application::simulation::MarketSimulator;
use reeltrade::application::valuation::PortfolioValuationService;
use reeltrade::config::Config;
use reeltrade::domain::repositories::Ledger;
use reeltrade::infrastructure::catalog::seed_catalog;
use reeltrade::infrastructure::market_store::MarketStore;
use reeltrade::infrastructure::persistence::{Database, SqliteLedger};
use reeltrade::interfaces::ExchangeApi;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about = "Movie-stock trading engine")]
struct Args {
    /// Override DATABASE_URL from the environment
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Reeltrade Server {} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = args.database_url {
        config.database_url = url;
    }

    let db = Database::new(&config.database_url).await?;
    let ledger: Arc<dyn Ledger> = Arc::new(SqliteLedger::new(db.pool.clone()));
    let store = Arc::new(MarketStore::new());

    // Restore the market from the ledger, or list the seed catalog on a
    // fresh database.
    let stocks = ledger.load_stocks().await?;
    if stocks.is_empty() {
        let listed = seed_catalog(&store).await?;
        for stock in store.stock_snapshots().await {
            ledger.save_stock(&stock).await?;
        }
        info!("Seeded catalog with {} listings", listed);
    } else {
        let count = stocks.len();
        for stock in stocks {
            store.insert_stock(stock).await?;
        }
        info!("Restored {} listings from ledger", count);
    }

    let accounts = ledger.load_accounts().await?;
    let account_count = accounts.len();
    for account in accounts {
        store.restore_account(account).await;
    }
    info!("Restored {} accounts from ledger", account_count);

    let pricing = Arc::new(PriceEngine::new(store.clone(), config.pricing()));
    let execution = Arc::new(OrderExecutionService::new(
        store.clone(),
        ledger.clone(),
        pricing.clone(),
    ));
    let ranking = Arc::new(MarketRankingService::new(
        store.clone(),
        ledger.clone(),
        config.trending_top_n,
    ));
    let valuation = Arc::new(PortfolioValuationService::new(store.clone()));
    let _api = ExchangeApi::new(
        store.clone(),
        ledger.clone(),
        execution,
        ranking.clone(),
        valuation,
        config.transactions_limit,
    );

    // Trading-period roll: previous close and volume reset on a schedule.
    {
        let pricing = pricing.clone();
        let store = store.clone();
        let ledger = ledger.clone();
        let period = config.period_roll_interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(period));
            interval.tick().await; // skip the immediate tick at boot
            loop {
                interval.tick().await;
                pricing.roll_trading_period().await;
                for stock in store.stock_snapshots().await {
                    if let Err(e) = ledger.save_stock(&stock).await {
                        warn!("Stock snapshot persist failed after roll: {:#}", e);
                    }
                }
            }
        });
        info!("Trading-period roll scheduled every {}s", period);
    }

    if config.simulator_enabled {
        let simulator = MarketSimulator::new(
            store.clone(),
            config.simulator_max_drift_bps,
            &config.pricing(),
        );
        let interval = config.simulator_interval_secs;
        tokio::spawn(simulator.run(interval));
        info!("Market drift simulator started (interval: {}s)", interval);
    } else {
        info!("Market drift simulator disabled.");
    }

    // Periodic market summary to the log
    {
        let ranking = ranking.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let report = ranking.trending().await;
                if let Some(top) = report.gainers.first() {
                    info!(
                        "Top gainer: {} {} ({}%)",
                        top.symbol, top.current_price, top.change_percent
                    );
                }
                if let Ok(stats) = ranking.market_stats().await {
                    info!(
                        "Market: {} listings, {} accounts, {} transactions, cap {}",
                        stats.total_stocks,
                        stats.total_accounts,
                        stats.total_transactions,
                        stats.total_market_cap
                    );
                }
            }
        });
    }

    info!("Server running. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting...");

    Ok(())
}
