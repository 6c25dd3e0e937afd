/// Minimum number of difference pixels for a pair measurement to count.
pub const DEFAULT_MIN_PIXELS: usize = 500;

/// Default clip threshold, in standard deviations around the median.
pub const DEFAULT_CLIP_SIGMA: f64 = 5.0;

/// Default iteration cap for the sigma-clip loop.
pub const DEFAULT_CLIP_MAX_ITERATIONS: usize = 10;

/// The clip loop stops once the retained count changes by less than this
/// fraction of the previous count.
pub const DEFAULT_CLIP_CONVERGENCE: f64 = 0.0001;

/// Divisor turning a pair dispersion into its weight proxy (`std / 20`).
/// Empirical; exposed through `WeightProxy::Dispersion`.
pub const DEFAULT_DISPERSION_DIVISOR: f64 = 20.0;

/// Magnitude base used to convert zero-points into flux scales.
pub const DEFAULT_MAGBASE: f64 = 30.0;

/// Suffix appended to the file stem of offset-corrected images.
pub const DEFAULT_APPLY_SUFFIX: &str = "_zoff";

/// Sentinel line separating the file list from the pair measurements.
pub const END_OF_FILELIST: &str = "END OF FILELIST";

/// Minimum pixel count (h*w) to map pixel coordinates in parallel chunks.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Number of coordinates handed to the mapper per parallel chunk.
pub const MAPPING_CHUNK_SIZE: usize = 16_384;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;
