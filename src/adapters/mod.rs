// Adapters layer: concrete implementations for external systems.

pub mod coinmarketcap;
pub mod postgres;

pub use coinmarketcap::CoinMarketCapClient;
pub use postgres::PostgresStore;
