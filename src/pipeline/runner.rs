use crate::config::{Config, RetryConfig};
use crate::error::{EtlError, Result};
use crate::pipeline::{extract, load, transform, ExtractSummary, LoadSummary, TransformSummary};
use crate::storage::AdmissionStore;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum RunOutcome {
    Succeeded,
    Failed { step: String, error: String },
}

/// Report for one full pipeline run, persisted as JSON into the output dir
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: RunOutcome,
    pub extract: Option<ExtractSummary>,
    pub transform: Option<TransformSummary>,
    pub load: Option<LoadSummary>,
}

/// Run a step up to `max_attempts` times with a fixed pause between tries.
/// Retries are whole-step retries, the way an external scheduler would rerun
/// a failed task.
async fn with_retries<T, F, Fut>(step: &str, retry: &RetryConfig, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {}s",
                    step, attempt, max_attempts, e, retry.delay_secs
                );
                counter!("hospital_etl_step_retries_total", "step" => step.to_string())
                    .increment(1);
                tokio::time::sleep(Duration::from_secs(retry.delay_secs)).await;
            }
            Err(e) => {
                error!("{} failed after {} attempts: {}", step, attempt, e);
                return Err(e);
            }
        }
    }
}

/// Execute extract, transform and load as a linear chain.
///
/// A step only starts once the previous one succeeded; a step that exhausts
/// its retries fails the run and the remaining steps do not execute. Passing
/// `None` for the store skips the load step. The run report is persisted
/// whether the run succeeded or not.
pub async fn run_pipeline(
    config: &Config,
    store: Option<Arc<dyn AdmissionStore>>,
) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    info!("🚀 Starting ETL run {}", run_id);
    counter!("hospital_etl_runs_total").increment(1);
    let t_run = Instant::now();

    let mut report = RunReport {
        run_id,
        started_at: Utc::now(),
        finished_at: None,
        outcome: RunOutcome::Succeeded,
        extract: None,
        transform: None,
        load: None,
    };
    let mut failed: Option<(&'static str, EtlError)> = None;

    let raw_path = config.raw_path();
    let processed_path = config.processed_path();
    let final_path = config.final_path();

    // Step 1: extract
    info!("📥 Step 1: extract");
    let t_step = Instant::now();
    match with_retries("extract", &config.retry, || async {
        extract(&raw_path, &processed_path)
    })
    .await
    {
        Ok(summary) => {
            histogram!("hospital_etl_step_duration_seconds", "step" => "extract")
                .record(t_step.elapsed().as_secs_f64());
            report.extract = Some(summary);
        }
        Err(e) => failed = Some(("extract", e)),
    }

    // Step 2: transform
    if failed.is_none() {
        info!("🔧 Step 2: transform");
        let t_step = Instant::now();
        match with_retries("transform", &config.retry, || async {
            transform(&processed_path, &final_path)
        })
        .await
        {
            Ok(summary) => {
                histogram!("hospital_etl_step_duration_seconds", "step" => "transform")
                    .record(t_step.elapsed().as_secs_f64());
                report.transform = Some(summary);
            }
            Err(e) => failed = Some(("transform", e)),
        }
    }

    // Step 3: load
    if failed.is_none() {
        match &store {
            Some(store) => {
                info!("💾 Step 3: load");
                let t_step = Instant::now();
                match with_retries("load", &config.retry, || async {
                    load(&final_path, store.clone()).await
                })
                .await
                {
                    Ok(summary) => {
                        histogram!("hospital_etl_step_duration_seconds", "step" => "load")
                            .record(t_step.elapsed().as_secs_f64());
                        report.load = Some(summary);
                    }
                    Err(e) => failed = Some(("load", e)),
                }
            }
            None => info!("Skipping load step (no store configured)"),
        }
    }

    report.finished_at = Some(Utc::now());
    if let Some((step, e)) = failed {
        report.outcome = RunOutcome::Failed {
            step: step.to_string(),
            error: e.to_string(),
        };
    }

    let total_secs = t_run.elapsed().as_secs_f64();
    histogram!("hospital_etl_run_duration_seconds").record(total_secs);

    match persist_report(&report, &config.paths.output_dir) {
        Ok(path) => info!("💾 Saved run report to {}", path),
        Err(e) => warn!("Failed to persist run report: {}", e),
    }

    push_pushgateway_metrics(&report, total_secs).await;

    Ok(report)
}

/// Persist the run report as pretty JSON, prefixed with the run timestamp
fn persist_report(report: &RunReport, output_dir: &Path) -> Result<String> {
    std::fs::create_dir_all(output_dir)?;
    let ts = report.started_at.format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("{ts}_run_report.json"));
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    Ok(path.display().to_string())
}

/// Push a minimal metrics snapshot to Pushgateway if configured. Batch runs
/// are too short-lived for a scrape, so this is the only way their metrics
/// reach Prometheus.
async fn push_pushgateway_metrics(report: &RunReport, duration_secs: f64) {
    let base = match std::env::var("ETL_PUSHGATEWAY_URL") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return,
    };
    let push_url = format!(
        "{}/metrics/job/hospital_etl/instance/{}",
        base.trim_end_matches('/'),
        report.run_id
    );

    let rows_inserted = report.load.as_ref().map_or(0, |l| l.rows_inserted);
    let rows_skipped = report.load.as_ref().map_or(0, |l| l.rows_skipped);
    let succeeded = u8::from(report.outcome == RunOutcome::Succeeded);
    let timestamp_secs = Utc::now().timestamp() as f64;

    let body = format!(
        "# TYPE hospital_etl_runs_total counter\n\
         hospital_etl_runs_total 1\n\
         # TYPE hospital_etl_run_succeeded gauge\n\
         hospital_etl_run_succeeded {succeeded}\n\
         # TYPE hospital_etl_rows_inserted_total counter\n\
         hospital_etl_rows_inserted_total {rows_inserted}\n\
         # TYPE hospital_etl_insert_errors_total counter\n\
         hospital_etl_insert_errors_total {rows_skipped}\n\
         # TYPE hospital_etl_run_duration_seconds gauge\n\
         hospital_etl_run_duration_seconds {duration_secs}\n\
         # TYPE hospital_etl_last_run_timestamp_seconds gauge\n\
         hospital_etl_last_run_timestamp_seconds {timestamp_secs}\n"
    );

    let client = reqwest::Client::new();
    match client
        .post(&push_url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => {
            info!("Pushed metrics to Pushgateway for run {}", report.run_id);
        }
        Ok(r) => {
            warn!(
                "Pushgateway push responded with status {} for run {}",
                r.status().as_u16(),
                report.run_id
            );
        }
        Err(e) => {
            warn!("Failed to push metrics to Pushgateway: {}", e);
        }
    }
}
