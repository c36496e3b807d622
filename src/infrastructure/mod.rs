pub mod catalog;
pub mod market_store;
pub mod persistence;
pub mod repositories;

pub use market_store::MarketStore;
pub use repositories::InMemoryLedger;
