use crate::core::Pipeline;
use crate::domain::model::{JobReport, JobStatus, LoadSummary};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::{Local, NaiveDateTime};
use std::time::Instant;

const BANNER_WIDTH: usize = 54;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs one collection job end to end. The closing banner is logged
    /// whether the job succeeds or fails.
    pub async fn run(&self) -> Result<JobReport> {
        let started = Instant::now();
        log_start_banner();
        self.monitor.log_stats("Start");

        let outcome = self.run_phases(started).await;

        let finished_at = Local::now().naive_local();
        match &outcome {
            Ok(_) => {
                tracing::info!("✅ Job completed successfully");
                log_end_banner(JobStatus::Success, finished_at);
            }
            Err(e) => {
                tracing::error!("Job failed: {}", e);
                log_end_banner(JobStatus::Failed, finished_at);
            }
        }
        self.monitor.log_final_stats();

        outcome.map(|mut report| {
            report.finished_at = finished_at;
            report
        })
    }

    async fn run_phases(&self, started: Instant) -> Result<JobReport> {
        self.pipeline.prepare().await?;
        self.monitor.log_stats("Prepare");

        let page = self.pipeline.extract().await?;
        let extracted = page.len();
        tracing::info!("Extracted {} listings", extracted);
        self.monitor.log_stats("Extract");

        let transformed = self.pipeline.transform(page).await?;
        let skipped = transformed.skipped;
        let rows = transformed.rows.len();
        tracing::info!("Transformed {} rows ({} skipped)", rows, skipped);
        self.monitor.log_stats("Transform");

        let LoadSummary {
            attempted,
            inserted,
        } = self.pipeline.load(transformed).await?;
        self.monitor.log_stats("Load");

        Ok(JobReport {
            status: JobStatus::Success,
            extracted,
            transformed: rows,
            skipped,
            attempted,
            inserted,
            elapsed: started.elapsed(),
            finished_at: Local::now().naive_local(),
        })
    }
}

fn log_start_banner() {
    let title = "Starting Cryptocurrency Data Collection Job";
    tracing::info!("╔{}╗", "═".repeat(BANNER_WIDTH));
    tracing::info!("║{}║", centered(title, BANNER_WIDTH));
    tracing::info!("╚{}╝", "═".repeat(BANNER_WIDTH));
}

fn log_end_banner(status: JobStatus, finished_at: NaiveDateTime) {
    let lines = end_banner_lines(status, finished_at);
    for line in &lines {
        match status {
            JobStatus::Success => tracing::info!("{}", line),
            JobStatus::Failed => tracing::error!("{}", line),
        }
    }
}

pub(crate) fn end_banner_lines(status: JobStatus, finished_at: NaiveDateTime) -> Vec<String> {
    let icon = match status {
        JobStatus::Success => "✅",
        JobStatus::Failed => "❌",
    };
    let title = format!(" {} CRYPTOCURRENCY DATA COLLECTION JOB {}", icon, status);
    let time = format!(" Finished at: {}", finished_at.format("%Y-%m-%d %H:%M:%S"));

    vec![
        format!("╔{}╗", "═".repeat(BANNER_WIDTH)),
        format!("║{}║", padded(&title, BANNER_WIDTH)),
        format!("║{}║", padded(&time, BANNER_WIDTH)),
        format!("╚{}╝", "═".repeat(BANNER_WIDTH)),
    ]
}

fn padded(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn centered(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let left = width.saturating_sub(len) / 2;
    padded(&format!("{}{}", " ".repeat(left), text), width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Listing, ListingsPage, TransformResult};
    use crate::utils::error::EtlError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedPipeline {
        fail_extract: bool,
        loads: AtomicUsize,
    }

    #[async_trait]
    impl Pipeline for ScriptedPipeline {
        async fn extract(&self) -> Result<ListingsPage> {
            if self.fail_extract {
                return Err(EtlError::ApiStatusError {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                });
            }
            Ok(vec![Listing::default(), Listing::default(), Listing::default()].into())
        }

        async fn transform(&self, data: ListingsPage) -> Result<TransformResult> {
            Ok(TransformResult {
                rows: Vec::new(),
                skipped: data.len(),
            })
        }

        async fn load(&self, _result: TransformResult) -> Result<LoadSummary> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(LoadSummary::default())
        }
    }

    #[tokio::test]
    async fn test_run_reports_counts() {
        let engine = EtlEngine::new(ScriptedPipeline::default());
        let report = engine.run().await.unwrap();

        assert_eq!(report.status, JobStatus::Success);
        assert_eq!(report.extracted, 3);
        assert_eq!(report.transformed, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.inserted, 0);
        assert!(report.finished_at.and_utc().timestamp() > 0);
    }

    #[tokio::test]
    async fn test_extract_failure_skips_load() {
        let engine = EtlEngine::new(ScriptedPipeline {
            fail_extract: true,
            ..ScriptedPipeline::default()
        });

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, EtlError::ApiStatusError { status: 500, .. }));
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_monitoring_does_not_change_outcome() {
        let engine = EtlEngine::new_with_monitoring(ScriptedPipeline::default(), true);
        assert!(engine.run().await.is_ok());
    }

    #[test]
    fn test_end_banner_lines() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();

        let lines = end_banner_lines(JobStatus::Failed, at);
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("❌ CRYPTOCURRENCY DATA COLLECTION JOB FAILED"));
        assert!(lines[2].contains("Finished at: 2024-05-01 08:30:00"));
        assert_eq!(lines[0].chars().count(), BANNER_WIDTH + 2);
        assert_eq!(lines[2].chars().count(), BANNER_WIDTH + 2);
    }
}
