use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

use hospital_etl::config::{Config, DatabaseConfig, PathsConfig, RetryConfig};
use hospital_etl::domain::Admission;
use hospital_etl::error::EtlError;
use hospital_etl::pipeline::{extract, load, run_pipeline, transform, RunOutcome};
use hospital_etl::storage::{AdmissionStore, InMemoryStore};

const HEADER: &str = "patient_id,admission_date,discharge_date,diagnosis,department";

fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut contents = String::from(HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    fs::write(&path, contents).unwrap();
    path
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn test_config(data_root: &Path, output_dir: &Path) -> Config {
    Config {
        paths: PathsConfig {
            data_root: data_root.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        },
        retry: RetryConfig {
            max_attempts: 2,
            delay_secs: 0,
        },
        database: DatabaseConfig {
            url: String::new(),
        },
    }
}

#[tokio::test]
async fn full_pipeline_happy_path() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    write_csv(
        data_root,
        "hospital_admissions.csv",
        &[
            "P001,2024-04-01,2024-04-05,Pneumonia,Pulmonology",
            "P002,04/15/2024,,Fracture,Orthopedics",
        ],
    );

    let raw = data_root.join("hospital_admissions.csv");
    let processed = data_root.join("processed_admissions.csv");
    let final_file = data_root.join("final_admissions.csv");

    let extract_summary = extract(&raw, &processed)?;
    assert_eq!(extract_summary.rows_read, 2);
    assert_eq!(extract_summary.rows_written, 2);
    assert_eq!(extract_summary.malformed_rows, 0);

    let transform_summary = transform(&processed, &final_file)?;
    assert_eq!(transform_summary.rows_written, 2);
    assert_eq!(transform_summary.invalid_admission_dates, 0);
    assert_eq!(transform_summary.invalid_discharge_dates, 0);

    let store = Arc::new(InMemoryStore::new());
    let load_summary = load(&final_file, store.clone()).await?;
    assert_eq!(load_summary.rows_read, 2);
    assert_eq!(load_summary.rows_inserted, 2);
    assert_eq!(load_summary.rows_skipped, 0);

    let rows = store.rows();
    assert_eq!(
        rows[0],
        Admission {
            patient_id: "P001".to_string(),
            admission_date: Some(date(2024, 4, 1)),
            discharge_date: Some(date(2024, 4, 5)),
            diagnosis: "Pneumonia".to_string(),
            department: "Pulmonology".to_string(),
        }
    );
    // US-formatted date normalized, open discharge stays null
    assert_eq!(rows[1].admission_date, Some(date(2024, 4, 15)));
    assert_eq!(rows[1].discharge_date, None);

    Ok(())
}

#[tokio::test]
async fn transform_coerces_invalid_dates() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    let processed = write_csv(
        data_root,
        "processed_admissions.csv",
        &[
            "P001,not-a-date,2024-04-05,Pneumonia,Pulmonology",
            "P002,2024-04-02,garbage,Asthma,Pulmonology",
        ],
    );
    let final_file = data_root.join("final_admissions.csv");

    let summary = transform(&processed, &final_file)?;
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.invalid_admission_dates, 1);
    assert_eq!(summary.invalid_discharge_dates, 1);

    // Coerced values serialize as empty fields
    let contents = fs::read_to_string(&final_file)?;
    assert!(contents.contains("P001,,2024-04-05"));
    assert!(contents.contains("P002,2024-04-02,"));

    Ok(())
}

#[tokio::test]
async fn transform_rejects_empty_input() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    let processed = write_csv(data_root, "processed_admissions.csv", &[]);
    let final_file = data_root.join("final_admissions.csv");

    let err = transform(&processed, &final_file).unwrap_err();
    assert!(matches!(err, EtlError::Validation { .. }));

    Ok(())
}

#[tokio::test]
async fn extract_rejects_missing_columns() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    let raw = data_root.join("hospital_admissions.csv");
    fs::write(&raw, "patient_id,admission_date,diagnosis\nP001,2024-04-01,Flu\n")?;
    let processed = data_root.join("processed_admissions.csv");

    let err = extract(&raw, &processed).unwrap_err();
    assert!(matches!(err, EtlError::MissingField(_)));

    Ok(())
}

#[tokio::test]
async fn extract_skips_malformed_rows() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    let raw = write_csv(
        data_root,
        "hospital_admissions.csv",
        &[
            "P001,2024-04-01,2024-04-05,Pneumonia,Pulmonology",
            "P002,2024-04-02,2024-04-06",
            "P003,2024-04-03,2024-04-07,Asthma,Pulmonology",
        ],
    );
    let processed = data_root.join("processed_admissions.csv");

    let summary = extract(&raw, &processed)?;
    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.malformed_rows, 1);

    Ok(())
}

#[tokio::test]
async fn extract_passes_through_header_only_file() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    let raw = write_csv(data_root, "hospital_admissions.csv", &[]);
    let processed = data_root.join("processed_admissions.csv");

    let summary = extract(&raw, &processed)?;
    assert_eq!(summary.rows_read, 0);
    assert_eq!(summary.rows_written, 0);

    Ok(())
}

#[tokio::test]
async fn load_skips_rows_without_admission_date() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    // Final file as transform would write it: coerced admission date is empty
    let final_file = write_csv(
        data_root,
        "final_admissions.csv",
        &[
            "P001,2024-04-01,2024-04-05,Pneumonia,Pulmonology",
            "P002,,2024-04-06,Fracture,Orthopedics",
            ",2024-04-03,,Asthma,Pulmonology",
        ],
    );

    let store = Arc::new(InMemoryStore::new());
    let summary = load(&final_file, store.clone()).await?;

    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.rows_inserted, 1);
    assert_eq!(summary.rows_skipped, 2);
    assert_eq!(store.rows().len(), 1);
    assert_eq!(store.rows()[0].patient_id, "P001");

    Ok(())
}

#[tokio::test]
async fn load_rejects_empty_input() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path();

    let final_file = write_csv(data_root, "final_admissions.csv", &[]);
    let store: Arc<dyn AdmissionStore> = Arc::new(InMemoryStore::new());

    let err = load(&final_file, store).await.unwrap_err();
    assert!(matches!(err, EtlError::Validation { .. }));

    Ok(())
}

#[tokio::test]
async fn run_pipeline_writes_report_on_success() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path().join("data");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&data_root)?;

    write_csv(
        &data_root,
        "hospital_admissions.csv",
        &["P001,2024-04-01,2024-04-05,Pneumonia,Pulmonology"],
    );

    let config = test_config(&data_root, &output_dir);
    let store = Arc::new(InMemoryStore::new());

    let report = run_pipeline(&config, Some(store.clone())).await?;
    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert!(report.finished_at.is_some());
    assert_eq!(report.load.as_ref().map(|l| l.rows_inserted), Some(1));
    assert_eq!(store.rows().len(), 1);

    // Run report persisted into the output directory
    let reports: Vec<_> = fs::read_dir(&output_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with("_run_report.json")
        })
        .collect();
    assert_eq!(reports.len(), 1);

    Ok(())
}

#[tokio::test]
async fn run_pipeline_fails_fast_on_missing_input() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path().join("data");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&data_root)?;

    let config = test_config(&data_root, &output_dir);

    let report = run_pipeline(&config, None).await?;
    match &report.outcome {
        RunOutcome::Failed { step, .. } => assert_eq!(step, "extract"),
        RunOutcome::Succeeded => panic!("run should have failed without an input file"),
    }
    assert!(report.transform.is_none());
    assert!(report.load.is_none());

    Ok(())
}

#[tokio::test]
async fn skip_load_runs_extract_and_transform_only() -> Result<()> {
    let temp_dir = tempdir()?;
    let data_root = temp_dir.path().join("data");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&data_root)?;

    write_csv(
        &data_root,
        "hospital_admissions.csv",
        &["P001,2024-04-01,,Pneumonia,Pulmonology"],
    );

    let config = test_config(&data_root, &output_dir);
    let report = run_pipeline(&config, None).await?;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert!(report.extract.is_some());
    assert!(report.transform.is_some());
    assert!(report.load.is_none());
    assert!(data_root.join("final_admissions.csv").exists());

    Ok(())
}
