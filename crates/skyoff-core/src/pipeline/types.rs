use std::fmt;

/// Coarse steps of a run, reported to a [`ProgressReporter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Inspecting,
    Overlap,
    Measuring,
    Bootstrap,
    Fitting,
    Writing,
    Applying,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Reading => "Reading inputs",
            Self::Inspecting => "Inspecting images",
            Self::Overlap => "Finding overlaps",
            Self::Measuring => "Measuring pairs",
            Self::Bootstrap => "Bootstrapping",
            Self::Fitting => "Fitting offsets",
            Self::Writing => "Writing output",
            Self::Applying => "Applying offsets",
        };
        f.write_str(label)
    }
}

/// Receives stage and item progress from the pipeline.
///
/// Every method defaults to doing nothing.
pub trait ProgressReporter: Send + Sync {
    /// `total_items` is known for per-image and per-pair stages.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` counts completed items since the stage began.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

/// Reporter for library callers and tests that want no progress output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpReporter;

impl ProgressReporter for NoOpReporter {}
