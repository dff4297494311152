#[cfg(feature = "cli")]
pub mod cli;
pub mod job_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use job_config::{DatabaseConfig, JobConfig, MonitoringConfig, ServerConfig, SourceConfig};
