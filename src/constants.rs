/// File, table and format constants to ensure consistency across the pipeline steps.
/// The three CSV names mirror the step boundaries: extract writes the processed
/// file, transform writes the final file, load reads it.

// CSV file names inside the data root
pub const RAW_FILE: &str = "hospital_admissions.csv";
pub const PROCESSED_FILE: &str = "processed_admissions.csv";
pub const FINAL_FILE: &str = "final_admissions.csv";

// Target table for the load step
pub const ADMISSIONS_TABLE: &str = "hospital_admissions";

/// Columns every input CSV must carry (order in the file does not matter)
pub const EXPECTED_COLUMNS: [&str; 5] = [
    "patient_id",
    "admission_date",
    "discharge_date",
    "diagnosis",
    "department",
];

/// Date formats accepted by the transform step, tried in order.
/// ISO first; the rest cover the variants seen in source exports.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Datetime formats whose date part is taken when a plain date fails
pub const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
