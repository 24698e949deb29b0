use crate::constants;
use crate::domain::RawAdmission;
use crate::error::{EtlError, Result};
use metrics::counter;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Result of one extract step run
#[derive(Debug, Serialize)]
pub struct ExtractSummary {
    pub rows_read: usize,
    pub rows_written: usize,
    pub malformed_rows: usize,
    pub output_file: String,
}

/// Copy the raw admissions CSV into the processed file, validating its shape.
///
/// Records that fail CSV deserialization are logged and skipped; a missing
/// file or a header without the expected columns fails the whole step.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn extract(input: &Path, output: &Path) -> Result<ExtractSummary> {
    info!("Starting data extraction...");

    if !input.exists() {
        return Err(EtlError::Validation {
            message: format!("Input file '{}' does not exist", input.display()),
        });
    }

    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    validate_header(&headers)?;

    let mut writer = csv::Writer::from_path(output)?;

    let mut rows_read = 0usize;
    let mut rows_written = 0usize;
    let mut malformed_rows = 0usize;

    for (i, result) in reader.deserialize::<RawAdmission>().enumerate() {
        rows_read += 1;
        match result {
            Ok(record) => {
                writer.serialize(&record)?;
                rows_written += 1;
            }
            Err(e) => {
                warn!("Skipping malformed record {}: {}", i + 1, e);
                malformed_rows += 1;
            }
        }
    }
    writer.flush()?;

    counter!("hospital_etl_rows_read_total", "step" => "extract").increment(rows_read as u64);
    counter!("hospital_etl_rows_written_total", "step" => "extract")
        .increment(rows_written as u64);
    counter!("hospital_etl_malformed_rows_total").increment(malformed_rows as u64);

    info!(
        "Successfully extracted {} rows to {} ({} malformed)",
        rows_written,
        output.display(),
        malformed_rows
    );

    Ok(ExtractSummary {
        rows_read,
        rows_written,
        malformed_rows,
        output_file: output.display().to_string(),
    })
}

fn validate_header(headers: &csv::StringRecord) -> Result<()> {
    for expected in constants::EXPECTED_COLUMNS {
        if !headers.iter().any(|h| h == expected) {
            return Err(EtlError::MissingField(format!(
                "column '{expected}' not found in CSV header"
            )));
        }
    }
    Ok(())
}
