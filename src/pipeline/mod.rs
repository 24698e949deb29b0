// Pipeline steps: extract, transform, load, plus the runner that chains them

pub mod extract;
pub mod load;
pub mod runner;
pub mod transform;

// Re-export the step entry points and their summaries
pub use extract::{extract, ExtractSummary};
pub use load::{load, LoadSummary};
pub use runner::{run_pipeline, RunOutcome, RunReport};
pub use transform::{transform, TransformSummary};
