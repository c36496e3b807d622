pub mod api;
pub mod view_models;

pub use api::ExchangeApi;
