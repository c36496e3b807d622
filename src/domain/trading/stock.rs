use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static movie metadata carried alongside the tradeable fields. Ingestion of
/// this data is outside the engine; it is stored verbatim for read models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockMetadata {
    pub poster: Option<String>,
    pub release_date: Option<String>,
    pub synopsis: Option<String>,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
}

/// A listed movie stock.
///
/// `current_price`, `previous_close` and `volume` are written only by the
/// price engine after a committed fill; everything else is immutable after
/// listing. `total_shares` doubles as the liquidity factor of the impact
/// model: the same order quantity moves a thinly-issued title further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: Uuid,
    pub symbol: String,
    pub title: String,
    pub current_price: Decimal,
    pub previous_close: Decimal,
    pub initial_price: Decimal,
    pub total_shares: u64,
    pub volume: u64,
    pub metadata: StockMetadata,
    pub created_at: DateTime<Utc>,
}

impl Stock {
    pub fn new(
        title: &str,
        initial_price: Decimal,
        total_shares: u64,
        metadata: StockMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: derive_symbol(title),
            title: title.to_string(),
            current_price: initial_price,
            previous_close: initial_price,
            initial_price,
            total_shares,
            volume: 0,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Absolute move since the previous close.
    pub fn change(&self) -> Decimal {
        self.current_price - self.previous_close
    }

    /// Percentage move since the previous close (0 when the close is 0,
    /// which only happens for a stock that never traded a period).
    pub fn change_percent(&self) -> Decimal {
        if self.previous_close.is_zero() {
            return Decimal::ZERO;
        }
        (self.change() / self.previous_close * Decimal::from(100)).round_dp(2)
    }

    /// Market capitalization at the current quote.
    pub fn market_cap(&self) -> Decimal {
        self.current_price * Decimal::from(self.total_shares)
    }

    /// Start a new trading period: the current price becomes the close and
    /// the traded volume resets.
    pub fn roll_period(&mut self) {
        self.previous_close = self.current_price;
        self.volume = 0;
    }
}

/// Ticker symbol from a title: uppercase alphanumerics, capped at six chars.
pub fn derive_symbol(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(6)
        .collect()
}
