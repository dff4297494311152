use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored output for terminals
    #[default]
    Compact,
    /// One JSON object per line, for container log collectors
    Json,
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("crypto_etl=debug,tower_http=debug,info")
        } else {
            EnvFilter::new("crypto_etl=info,tower_http=info,warn")
        }
    })
}

pub fn init_logger(verbose: bool, format: LogFormat) {
    let filter = default_filter(verbose);

    match format {
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .json(), // Cloud log collectors parse JSON lines
                )
                .init();
        }
    }
}
