use crate::constants;
use crate::domain::Admission;
use crate::error::{EtlError, Result};
use crate::storage::AdmissionStore;
use metrics::counter;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of one load step run
#[derive(Debug, Serialize)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_inserted: usize,
    pub rows_skipped: usize,
}

/// Insert the final CSV into the admissions table, one row at a time.
///
/// A row whose insert is rejected is logged and skipped; the step keeps
/// going. A missing table or an empty input fails the whole step.
#[instrument(skip_all, fields(input = %input.display()))]
pub async fn load(input: &Path, store: Arc<dyn AdmissionStore>) -> Result<LoadSummary> {
    info!("Starting data loading...");

    if !input.exists() {
        return Err(EtlError::Validation {
            message: format!("Input file '{}' does not exist", input.display()),
        });
    }

    let mut reader = csv::Reader::from_path(input)?;
    let mut admissions: Vec<Admission> = Vec::new();
    for result in reader.deserialize::<Admission>() {
        admissions.push(result?);
    }

    if admissions.is_empty() {
        return Err(EtlError::Validation {
            message: "No data found to load".to_string(),
        });
    }

    if !store.table_exists().await? {
        return Err(EtlError::Store {
            message: format!(
                "Target table '{}' does not exist",
                constants::ADMISSIONS_TABLE
            ),
        });
    }

    let mut rows_inserted = 0usize;
    let mut rows_skipped = 0usize;

    for (i, admission) in admissions.iter().enumerate() {
        match store.insert_admission(admission).await {
            Ok(()) => rows_inserted += 1,
            Err(e) => {
                warn!("Failed to insert row {}: {}", i + 1, e);
                rows_skipped += 1;
            }
        }
    }

    counter!("hospital_etl_rows_inserted_total").increment(rows_inserted as u64);
    counter!("hospital_etl_insert_errors_total").increment(rows_skipped as u64);

    info!(
        "Successfully loaded {}/{} records",
        rows_inserted,
        admissions.len()
    );

    Ok(LoadSummary {
        rows_read: admissions.len(),
        rows_inserted,
        rows_skipped,
    })
}
