pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::JobConfig;

pub use adapters::{CoinMarketCapClient, PostgresStore};
pub use crate::core::{etl::EtlEngine, pipeline::ListingsPipeline};
pub use domain::model::{JobReport, JobStatus};
pub use utils::error::{EtlError, Result};
