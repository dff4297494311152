use crate::config::JobConfig;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "crypto-etl")]
#[command(about = "Collects the latest cryptocurrency listings into PostgreSQL")]
pub struct CliConfig {
    /// TOML configuration file; the environment is used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the collection job once and exit
    Run,
    /// Serve HTTP; every GET / runs the collection job
    Serve {
        /// Overrides PORT / server.port
        #[arg(long)]
        port: Option<u16>,

        /// Overrides server.host
        #[arg(long)]
        host: Option<String>,
    },
}

impl CliConfig {
    /// Without a subcommand the binary serves, matching the container entry point.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            port: None,
            host: None,
        })
    }

    /// Loads the job configuration and applies overrides. Precedence for the
    /// listen port is `--port`, then `PORT`, then the file.
    pub fn load_job_config(&self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                let mut config = JobConfig::from_file(path)?;
                config.apply_port_override(|key| std::env::var(key).ok())?;
                config
            }
            None => JobConfig::from_env()?,
        };

        if self.monitor {
            config.monitoring.enabled = true;
        }

        if let Some(Command::Serve { port, host }) = &self.command {
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(host) = host {
                config.server.host = host.clone();
            }
        }

        Ok(config)
    }
}
