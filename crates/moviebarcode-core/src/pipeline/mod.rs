pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_barcode, run_barcode_reported, run_barcode_with_source, BarcodeSummary};
pub use types::{PipelineStage, ProgressReporter};
