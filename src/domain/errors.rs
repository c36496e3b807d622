use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by order execution.
///
/// Every variant is terminal for the order: the caller sees the structured
/// error and no partial state change is ever observable. Resubmission is the
/// caller's decision.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid quantity: {quantity}. Must be a positive integer")]
    InvalidQuantity { quantity: i64 },

    #[error("Unsupported order kind: {kind}. Only market orders are accepted")]
    UnsupportedOrderKind { kind: String },

    #[error("Invalid action: {action}. Must be 'buy' or 'sell'")]
    InvalidAction { action: String },

    #[error("Stock not found: {stock_id}")]
    StockNotFound { stock_id: Uuid },

    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: Uuid },

    #[error("Account is deactivated: {account_id}")]
    AccountInactive { account_id: Uuid },

    #[error("Insufficient funds: need ${need}, available ${available}")]
    InsufficientFunds { need: Decimal, available: Decimal },

    #[error("Insufficient holdings: requested {requested}, held {held}")]
    InsufficientHoldings { requested: u64, held: u64 },

    #[error("Ledger write failed: {0}")]
    Ledger(#[source] anyhow::Error),
}
