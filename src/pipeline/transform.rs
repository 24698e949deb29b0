use crate::domain::{coerce_date, Admission, DateCoercion, RawAdmission};
use crate::error::{EtlError, Result};
use metrics::counter;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Result of one transform step run
#[derive(Debug, Serialize)]
pub struct TransformSummary {
    pub rows_read: usize,
    pub rows_written: usize,
    pub invalid_admission_dates: usize,
    pub invalid_discharge_dates: usize,
    pub output_file: String,
}

/// Normalize the date columns of the processed CSV into the final CSV.
///
/// Unparseable dates coerce to null and are counted; they never abort the
/// step. An empty input (zero data rows) does.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn transform(input: &Path, output: &Path) -> Result<TransformSummary> {
    info!("Starting data transformation...");

    if !input.exists() {
        return Err(EtlError::Validation {
            message: format!("Input file '{}' does not exist", input.display()),
        });
    }

    let mut reader = csv::Reader::from_path(input)?;
    let mut records: Vec<RawAdmission> = Vec::new();
    for result in reader.deserialize::<RawAdmission>() {
        records.push(result?);
    }

    if records.is_empty() {
        return Err(EtlError::Validation {
            message: "No data found in the input file".to_string(),
        });
    }

    let mut writer = csv::Writer::from_path(output)?;

    let mut invalid_admission_dates = 0usize;
    let mut invalid_discharge_dates = 0usize;

    for raw in &records {
        let admission_date = match coerce_date(&raw.admission_date) {
            DateCoercion::Invalid => {
                invalid_admission_dates += 1;
                None
            }
            coercion => coercion.into_option(),
        };
        let discharge_date = match coerce_date(&raw.discharge_date) {
            DateCoercion::Invalid => {
                invalid_discharge_dates += 1;
                None
            }
            coercion => coercion.into_option(),
        };

        writer.serialize(Admission {
            patient_id: raw.patient_id.clone(),
            admission_date,
            discharge_date,
            diagnosis: raw.diagnosis.clone(),
            department: raw.department.clone(),
        })?;
    }
    writer.flush()?;

    let invalid_total = invalid_admission_dates + invalid_discharge_dates;
    if invalid_total > 0 {
        warn!("Found {} records with invalid dates", invalid_total);
    }

    counter!("hospital_etl_rows_read_total", "step" => "transform")
        .increment(records.len() as u64);
    counter!("hospital_etl_rows_written_total", "step" => "transform")
        .increment(records.len() as u64);
    counter!("hospital_etl_invalid_dates_total", "column" => "admission_date")
        .increment(invalid_admission_dates as u64);
    counter!("hospital_etl_invalid_dates_total", "column" => "discharge_date")
        .increment(invalid_discharge_dates as u64);

    info!("Successfully transformed data to {}", output.display());

    Ok(TransformSummary {
        rows_read: records.len(),
        rows_written: records.len(),
        invalid_admission_dates,
        invalid_discharge_dates,
        output_file: output.display().to_string(),
    })
}
