use crate::domain::errors::OrderError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An account's position in one stock: quantity held plus average cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub stock_id: Uuid,
    pub symbol: String,
    pub title: String,
    pub quantity: u64,
    pub avg_price: Decimal,
}

impl Holding {
    /// Cost basis of the position: quantity * average acquisition price.
    pub fn cost_basis(&self) -> Decimal {
        Decimal::from(self.quantity) * self.avg_price
    }
}

/// A trading account: cash balance plus holdings keyed by stock id.
///
/// Balance is mutated only through `buy`/`sell`, which check and apply in one
/// step so the caller can make the whole operation atomic by holding the
/// account lock. Accounts are never deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub balance: Decimal,
    pub active: bool,
    pub holdings: HashMap<Uuid, Holding>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: &str, email: &str, starting_balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            balance: starting_balance,
            active: true,
            holdings: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn holding_quantity(&self, stock_id: Uuid) -> u64 {
        self.holdings.get(&stock_id).map_or(0, |h| h.quantity)
    }

    /// Debit `quantity * price` and fold the shares into the holding at a
    /// recomputed weighted-average price. Fails without mutating if the cost
    /// exceeds the balance.
    pub fn buy(
        &mut self,
        stock_id: Uuid,
        symbol: &str,
        title: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<Decimal, OrderError> {
        let cost = Decimal::from(quantity) * price;
        if cost > self.balance {
            return Err(OrderError::InsufficientFunds {
                need: cost,
                available: self.balance,
            });
        }

        self.balance -= cost;

        match self.holdings.get_mut(&stock_id) {
            Some(holding) => {
                // newAvg = (oldQty*oldAvg + qty*price) / (oldQty + qty)
                let total_quantity = Decimal::from(holding.quantity + quantity);
                let total_value = holding.cost_basis() + cost;
                holding.avg_price = (total_value / total_quantity).round_dp(2);
                holding.quantity += quantity;
            }
            None => {
                self.holdings.insert(
                    stock_id,
                    Holding {
                        stock_id,
                        symbol: symbol.to_string(),
                        title: title.to_string(),
                        quantity,
                        avg_price: price,
                    },
                );
            }
        }

        Ok(cost)
    }

    /// Credit `quantity * price` and reduce the holding, removing it at zero.
    /// Average price is untouched; returns (proceeds, realized P&L). Fails
    /// without mutating if the quantity exceeds the held quantity.
    pub fn sell(
        &mut self,
        stock_id: Uuid,
        quantity: u64,
        price: Decimal,
    ) -> Result<(Decimal, Decimal), OrderError> {
        let held = self.holding_quantity(stock_id);
        if quantity > held {
            return Err(OrderError::InsufficientHoldings {
                requested: quantity,
                held,
            });
        }

        // Checked above: the holding exists and covers the quantity.
        let holding = self
            .holdings
            .get_mut(&stock_id)
            .ok_or(OrderError::InsufficientHoldings {
                requested: quantity,
                held: 0,
            })?;

        let proceeds = Decimal::from(quantity) * price;
        let realized_pl = ((price - holding.avg_price) * Decimal::from(quantity)).round_dp(2);

        holding.quantity -= quantity;
        if holding.quantity == 0 {
            self.holdings.remove(&stock_id);
        }
        self.balance += proceeds;

        Ok((proceeds, realized_pl))
    }
}
