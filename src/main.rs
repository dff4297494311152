use clap::Parser;
use crypto_etl::utils::{logger, validation::Validate};
use crypto_etl::{CliConfig, Command, EtlEngine, EtlError, JobConfig, ListingsPipeline, PostgresStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_logger(cli.verbose, cli.log_format);

    tracing::info!("Starting crypto-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_job_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => exit_with(&e, 1),
    };

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match cli.command() {
        Command::Run => run_once(config, monitor_enabled).await,
        Command::Serve { .. } => serve(config, monitor_enabled).await,
    }
}

async fn run_once(config: JobConfig, monitor_enabled: bool) -> anyhow::Result<()> {
    let store = match PostgresStore::connect_lazy(&config.database) {
        Ok(store) => store,
        Err(e) => exit_with(&e, e.exit_code()),
    };
    let pipeline = ListingsPipeline::new(store, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let outcome = engine.run().await;
    engine.pipeline().store().close().await;

    match outcome {
        Ok(report) => {
            tracing::info!(
                "📁 {} listings fetched, {} rows inserted, {} skipped in {:?}",
                report.extracted,
                report.inserted,
                report.skipped,
                report.elapsed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Collection job failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            let code = e.exit_code();
            if code > 0 {
                exit_with(&e, code);
            }
            Ok(())
        }
    }
}

async fn serve(config: JobConfig, monitor_enabled: bool) -> anyhow::Result<()> {
    let addr = config.server.bind_address();
    let store = PostgresStore::connect_lazy(&config.database)?;
    let pipeline = ListingsPipeline::new(store, config);
    let engine = Arc::new(EtlEngine::new_with_monitoring(pipeline, monitor_enabled));

    let router = crypto_etl::app::server::build_router(Arc::clone(&engine));
    crypto_etl::app::server::serve(router, &addr).await?;

    engine.pipeline().store().close().await;
    Ok(())
}

fn exit_with(e: &EtlError, code: i32) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(code);
}
