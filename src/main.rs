use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use hospital_etl::config::Config;
use hospital_etl::db::PostgresStore;
use hospital_etl::error::Result;
use hospital_etl::pipeline::{
    extract, load, run_pipeline, transform, ExtractSummary, LoadSummary, RunOutcome, RunReport,
    TransformSummary,
};
use hospital_etl::storage::AdmissionStore;
use hospital_etl::{logging, observability};

#[derive(Parser)]
#[command(name = "hospital_etl")]
#[command(about = "Batch ETL pipeline for hospital admissions data")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the data directory from the config file
    #[arg(long)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the raw admissions CSV and write the processed file
    Extract,
    /// Normalize the date columns into the final file
    Transform,
    /// Insert the final file into the hospital_admissions table
    Load {
        /// Apply migrations before loading
        #[arg(long)]
        migrate: bool,
    },
    /// Run extract, transform and load sequentially with retries
    Run {
        /// Stop after transform (no database required)
        #[arg(long)]
        skip_load: bool,
        /// Apply migrations before loading
        #[arg(long)]
        migrate: bool,
    },
}

async fn connect_store(config: &Config, migrate: bool) -> Result<Arc<dyn AdmissionStore>> {
    let store = PostgresStore::connect(&config.database.url).await?;
    if migrate {
        store.run_migrations().await?;
    }
    Ok(Arc::new(store))
}

fn print_extract(summary: &ExtractSummary) {
    println!("\n📊 Extract Results:");
    println!("   Rows read: {}", summary.rows_read);
    println!("   Rows written: {}", summary.rows_written);
    println!("   Malformed rows: {}", summary.malformed_rows);
    println!("   Output file: {}", summary.output_file);
}

fn print_transform(summary: &TransformSummary) {
    println!("\n📊 Transform Results:");
    println!("   Rows read: {}", summary.rows_read);
    println!("   Rows written: {}", summary.rows_written);
    println!(
        "   Invalid admission dates: {}",
        summary.invalid_admission_dates
    );
    println!(
        "   Invalid discharge dates: {}",
        summary.invalid_discharge_dates
    );
    println!("   Output file: {}", summary.output_file);
}

fn print_load(summary: &LoadSummary) {
    println!("\n📊 Load Results:");
    println!("   Rows read: {}", summary.rows_read);
    println!("   Rows inserted: {}", summary.rows_inserted);
    println!("   Rows skipped: {}", summary.rows_skipped);
}

fn print_report(report: &RunReport) {
    println!("\n📊 Run Summary ({}):", report.run_id);
    if let Some(summary) = &report.extract {
        println!(
            "   Extract: {} read, {} written, {} malformed",
            summary.rows_read, summary.rows_written, summary.malformed_rows
        );
    }
    if let Some(summary) = &report.transform {
        println!(
            "   Transform: {} written, {} invalid dates",
            summary.rows_written,
            summary.invalid_admission_dates + summary.invalid_discharge_dates
        );
    }
    if let Some(summary) = &report.load {
        println!(
            "   Load: {} inserted, {} skipped",
            summary.rows_inserted, summary.rows_skipped
        );
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize logging and metrics
    logging::init_logging();
    observability::init_metrics();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(data_root) = cli.data_root {
        config.paths.data_root = data_root;
    }

    match cli.command {
        Commands::Extract => {
            println!("📥 Running extract step...");
            let summary = extract(&config.raw_path(), &config.processed_path())?;
            print_extract(&summary);
        }
        Commands::Transform => {
            println!("🔧 Running transform step...");
            let summary = transform(&config.processed_path(), &config.final_path())?;
            print_transform(&summary);
        }
        Commands::Load { migrate } => {
            println!("💾 Running load step...");
            let store = connect_store(&config, migrate).await?;
            let summary = load(&config.final_path(), store).await?;
            print_load(&summary);
        }
        Commands::Run { skip_load, migrate } => {
            println!("🚀 Running full pipeline (extract + transform + load)...");

            let store = if skip_load {
                None
            } else {
                Some(connect_store(&config, migrate).await?)
            };

            let report = run_pipeline(&config, store).await?;
            print_report(&report);

            match &report.outcome {
                RunOutcome::Succeeded => {
                    println!("✅ ETL run {} completed successfully", report.run_id);
                }
                RunOutcome::Failed { step, error: cause } => {
                    error!("ETL run {} failed at {}: {}", report.run_id, step, cause);
                    println!("❌ ETL run {} failed at {}: {}", report.run_id, step, cause);
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
