use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Cash every new account starts with.
    pub starting_balance: Decimal,
    // Price impact model
    pub impact_coefficient: Decimal,
    pub max_move_pct: Decimal,
    pub min_price_ratio: Decimal,
    /// Bound on each ranked trending list.
    pub trending_top_n: usize,
    /// Default page size for transaction history reads.
    pub transactions_limit: usize,
    /// Seconds between trading-period rolls (previous close + volume reset).
    pub period_roll_interval_secs: u64,
    // Background drift simulator
    pub simulator_enabled: bool,
    pub simulator_interval_secs: u64,
    pub simulator_max_drift_bps: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/reeltrade.db".to_string());

        let starting_balance = parse_decimal("STARTING_BALANCE", "100000.00")?;
        let impact_coefficient = parse_decimal("IMPACT_COEFFICIENT", "0.5")?;
        let max_move_pct = parse_decimal("MAX_MOVE_PCT", "5.0")?;
        let min_price_ratio = parse_decimal("MIN_PRICE_RATIO", "0.1")?;

        let trending_top_n = env::var("TRENDING_TOP_N")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<usize>()
            .context("Failed to parse TRENDING_TOP_N")?;

        let transactions_limit = env::var("TRANSACTIONS_LIMIT")
            .unwrap_or_else(|_| "50".to_string())
            .parse::<usize>()
            .context("Failed to parse TRANSACTIONS_LIMIT")?;

        let period_roll_interval_secs = env::var("PERIOD_ROLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .context("Failed to parse PERIOD_ROLL_INTERVAL_SECS")?;

        let simulator_enabled = env::var("SIMULATOR_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let simulator_interval_secs = env::var("SIMULATOR_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("Failed to parse SIMULATOR_INTERVAL_SECS")?;

        let simulator_max_drift_bps = env::var("SIMULATOR_MAX_DRIFT_BPS")
            .unwrap_or_else(|_| "200".to_string())
            .parse::<i64>()
            .context("Failed to parse SIMULATOR_MAX_DRIFT_BPS")?;

        let config = Self {
            database_url,
            starting_balance,
            impact_coefficient,
            max_move_pct,
            min_price_ratio,
            trending_top_n,
            transactions_limit,
            period_roll_interval_secs,
            simulator_enabled,
            simulator_interval_secs,
            simulator_max_drift_bps,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.starting_balance < Decimal::ZERO {
            anyhow::bail!("STARTING_BALANCE must not be negative");
        }
        if self.min_price_ratio <= Decimal::ZERO || self.min_price_ratio >= Decimal::ONE {
            anyhow::bail!("MIN_PRICE_RATIO must be between 0 and 1 exclusive");
        }
        if self.max_move_pct <= Decimal::ZERO {
            anyhow::bail!("MAX_MOVE_PCT must be positive");
        }
        if self.trending_top_n == 0 {
            anyhow::bail!("TRENDING_TOP_N must be at least 1");
        }
        Ok(())
    }

    pub fn pricing(&self) -> crate::application::pricing::PricingConfig {
        crate::application::pricing::PricingConfig {
            impact_coefficient: self.impact_coefficient,
            max_move_pct: self.max_move_pct,
            min_price_ratio: self.min_price_ratio,
        }
    }
}

fn parse_decimal(key: &str, default: &str) -> Result<Decimal> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Decimal::from_str(&raw).with_context(|| format!("Failed to parse {}", key))
}
