//! HTTP trigger for the collection job.
//!
//! `GET /` runs the job once and answers with a JSON status. Runs are
//! serialised: a request arriving mid-run waits for the current run.

use crate::core::etl::EtlEngine;
use crate::core::Pipeline;
use crate::domain::model::JobReport;
use crate::utils::error::Result;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub struct AppState<P: Pipeline> {
    engine: Arc<EtlEngine<P>>,
    run_lock: Arc<Mutex<()>>,
}

impl<P: Pipeline> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            run_lock: Arc::clone(&self.run_lock),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<JobReport>,
}

pub fn build_router<P: Pipeline + 'static>(engine: Arc<EtlEngine<P>>) -> Router {
    let state = AppState {
        engine,
        run_lock: Arc::new(Mutex::new(())),
    };

    Router::new()
        .route("/", get(trigger_job::<P>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn trigger_job<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
) -> (StatusCode, Json<JobResponse>) {
    tracing::info!("Received HTTP request to trigger data collection job.");

    let _guard = state.run_lock.lock().await;
    match state.engine.run().await {
        Ok(report) => (
            StatusCode::OK,
            Json(JobResponse {
                status: "success",
                message: "Data collection job completed successfully".to_string(),
                report: Some(report),
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(JobResponse {
                status: "error",
                message: e.to_string(),
                report: None,
            }),
        ),
    }
}

/// Binds `addr` and serves until Ctrl-C or SIGTERM.
pub async fn serve(router: Router, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Starting HTTP server on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
