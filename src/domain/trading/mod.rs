// Core trading domain entities and value objects
pub mod account;
pub mod stock;
pub mod types;
