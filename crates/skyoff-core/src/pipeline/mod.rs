pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{
    fit_measurements, measure_pairs, prepare_images, run_apply, run_fit, run_measure,
    run_pipeline, ApplyRun, FitRun, MeasurementRun,
};
pub use types::{NoOpReporter, PipelineStage, ProgressReporter};
