use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::error::{Result, SkyoffError};
use crate::fit::{bootstrap_offsets, solve_offsets, zero_seed, BootstrapResult, OffsetSolution};
use crate::graph::{OffsetGraph, PairwiseMeasurement};
use crate::image::{ImageHeader, ImageRecord};
use crate::io::catalog::{
    apply_catalog, read_catalog, strip_extension_marker, CatalogApplyReport, CatalogKind,
};
use crate::io::diagnostics::DiagnosticsReport;
use crate::io::exposure::write_shifted_copy;
use crate::io::image_list::{read_image_list, read_index_list};
use crate::io::measurements::{load_measurements, save_measurements, MeasurementFile};
use crate::io::offsets::{load_offsets, save_offsets};
use crate::io::ImageLoader;
use crate::measure::{estimate_pair_offset, PairEstimate, PairSide};
use crate::overlap::OverlapMatrix;

use super::config::{FitConfig, FluxScaleSource, MeasureConfig, SkyoffConfig};
use super::types::{PipelineStage, ProgressReporter};

/// Outcome of the measurement stage.
#[derive(Clone, Debug)]
pub struct MeasurementRun {
    pub overlap: OverlapMatrix,
    pub file: MeasurementFile,
    /// Overlapping pairs `(i, j, pixels)` that fell short of the pixel threshold.
    pub insufficient: Vec<(usize, usize, usize)>,
    /// Flux-scale catalog matching, when a catalog was configured.
    pub catalog: Option<CatalogApplyReport>,
}

/// Outcome of the fitting stage.
#[derive(Clone, Debug)]
pub struct FitRun {
    pub filenames: Vec<String>,
    pub bootstrap: Option<BootstrapResult>,
    pub solution: OffsetSolution,
    /// Zero-based images whose measurements were dropped.
    pub excluded: Vec<usize>,
}

/// Read the image list, apply flux scales, check every image exists and
/// inspect headers.
///
/// Any missing image aborts the run before headers are read.
pub fn prepare_images(
    config: &SkyoffConfig,
    loader: &dyn ImageLoader,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<ImageRecord>> {
    prepare_with_catalog(config, loader, reporter).map(|(records, _)| records)
}

fn prepare_with_catalog(
    config: &SkyoffConfig,
    loader: &dyn ImageLoader,
    reporter: &dyn ProgressReporter,
) -> Result<(Vec<ImageRecord>, Option<CatalogApplyReport>)> {
    reporter.begin_stage(PipelineStage::Reading, None);
    let mut records = read_image_list(&config.image_list)?;
    let catalog = apply_flux_source(&config.flux, &mut records)?;
    ensure_inputs_exist(&records)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Inspecting, Some(records.len()));
    let mut inspected = Vec::with_capacity(records.len());
    for (k, record) in records.into_iter().enumerate() {
        let header = loader.inspect(&record.path)?;
        info!(
            image = %record.path.display(),
            flux_scale = record.flux_scale,
            "Read coordinate system"
        );
        inspected.push(record.with_header(header));
        reporter.advance(k + 1);
    }
    reporter.finish_stage();
    Ok((inspected, catalog))
}

fn apply_flux_source(
    source: &FluxScaleSource,
    records: &mut [ImageRecord],
) -> Result<Option<CatalogApplyReport>> {
    let entries = match source {
        FluxScaleSource::None => {
            debug!("No flux-scale catalog; all flux scales are 1.0");
            return Ok(None);
        }
        FluxScaleSource::FluxScale { path } => read_catalog(path, CatalogKind::FluxScale)?,
        FluxScaleSource::MagZero { path, magbase } => {
            read_catalog(path, CatalogKind::MagZero { magbase: *magbase })?
        }
    };
    let report = apply_catalog(records, &entries);
    debug!(
        applied = report.applied,
        unmatched = report.unmatched.len(),
        "Flux-scale catalog applied"
    );
    Ok(Some(report))
}

/// Fail with every missing path logged, before any image is opened.
fn ensure_inputs_exist(records: &[ImageRecord]) -> Result<()> {
    let missing: Vec<PathBuf> = records
        .iter()
        .filter(|r| !r.path.is_file())
        .map(|r| r.path.clone())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    for path in &missing {
        error!(image = %path.display(), "Input image not found");
    }
    Err(SkyoffError::MissingInputs(missing))
}

/// Measure every overlapping pair `(i, j > i)`.
///
/// Image i's planes stay loaded while its partners `j > i` are measured;
/// only the scalar results are kept.
pub fn measure_pairs(
    records: &[ImageRecord],
    loader: &dyn ImageLoader,
    config: &MeasureConfig,
    reporter: &dyn ProgressReporter,
) -> Result<MeasurementRun> {
    reporter.begin_stage(PipelineStage::Overlap, None);
    let overlap = OverlapMatrix::from_records(records);
    reporter.finish_stage();

    let candidates: Vec<(usize, usize, usize)> = overlap.candidate_pairs().collect();
    info!(candidates = candidates.len(), "Overlapping pairs to measure");
    reporter.begin_stage(PipelineStage::Measuring, Some(candidates.len()));

    let mut measurements = Vec::new();
    let mut insufficient = Vec::new();
    let mut done = 0;

    for (i, record) in records.iter().enumerate() {
        let partners: Vec<(usize, usize)> = candidates
            .iter()
            .filter(|c| c.1 == i)
            .map(|&(pair_index, _, j)| (pair_index, j))
            .collect();
        if partners.is_empty() {
            continue;
        }
        let i_planes = loader.load(&record.path)?;
        let i_header = inspected_header(records, i)?;

        for (pair_index, j) in partners {
            let j_planes = loader.load(&records[j].path)?;
            let j_header = inspected_header(records, j)?;

            let estimate = estimate_pair_offset(
                PairSide {
                    planes: &i_planes,
                    flux_scale: record.flux_scale,
                    mapper: i_header.mapper.as_ref(),
                },
                PairSide {
                    planes: &j_planes,
                    flux_scale: records[j].flux_scale,
                    mapper: j_header.mapper.as_ref(),
                },
                config.min_pixels,
                &config.clip,
            )?;

            match estimate {
                PairEstimate::Measured(stats) => {
                    debug!(
                        i,
                        j,
                        offset = stats.median,
                        std = stats.std,
                        pixels = stats.count,
                        "Measured pair"
                    );
                    measurements.push(PairwiseMeasurement {
                        i,
                        j,
                        offset: stats.median,
                        pair_index,
                        pixels: stats.count,
                        std: stats.std,
                    });
                }
                PairEstimate::Insufficient { pixels } => {
                    debug!(i, j, pixels, min = config.min_pixels, "Insufficient overlap");
                    insufficient.push((i, j, pixels));
                }
            }
            done += 1;
            reporter.advance(done);
        }
    }
    reporter.finish_stage();

    info!(
        valid = measurements.len(),
        insufficient = insufficient.len(),
        "Pair measurement complete"
    );

    Ok(MeasurementRun {
        overlap,
        file: MeasurementFile {
            filenames: records.iter().map(ImageRecord::name).collect(),
            measurements,
        },
        insufficient,
        catalog: None,
    })
}

fn inspected_header(records: &[ImageRecord], k: usize) -> Result<&ImageHeader> {
    records[k]
        .header
        .as_ref()
        .ok_or_else(|| SkyoffError::NotInspected(records[k].path.clone()))
}

/// Measurement stage: prepare images, measure pairs, write the measurement file.
pub fn run_measure(
    config: &SkyoffConfig,
    loader: &dyn ImageLoader,
    reporter: &dyn ProgressReporter,
) -> Result<MeasurementRun> {
    let start = Instant::now();
    let (records, catalog) = prepare_with_catalog(config, loader, reporter)?;
    let mut run = measure_pairs(&records, loader, &config.measure, reporter)?;
    run.catalog = catalog;

    reporter.begin_stage(PipelineStage::Writing, None);
    save_measurements(&config.measurements, &run.file)?;
    reporter.finish_stage();

    info!(
        output = %config.measurements.display(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "Measurement stage complete"
    );
    Ok(run)
}

/// Bootstrap and fit offsets from parsed measurements.
pub fn fit_measurements(
    file: &MeasurementFile,
    config: &FitConfig,
    excluded: &[usize],
    reporter: &dyn ProgressReporter,
) -> Result<FitRun> {
    let n = file.filenames.len();
    info!(images = n, measurements = file.measurements.len(), "Fitting offsets");
    if let Some(&index) = excluded.iter().find(|&&index| index >= n) {
        return Err(SkyoffError::ExcludedImageOutOfRange {
            number: index + 1,
            total: n,
        });
    }

    let full = OffsetGraph::from_measurements(n, file.measurements.iter().cloned())?;
    let graph = if excluded.is_empty() {
        full
    } else {
        let kept = full.without_images(excluded);
        warn!(
            images = ?excluded,
            dropped = full.len() - kept.len(),
            "Excluding images from the fit"
        );
        kept
    };

    reporter.begin_stage(PipelineStage::Bootstrap, None);
    let (seed, bootstrap) = if config.bootstrap {
        let result = bootstrap_offsets(&graph, config.reference)?;
        (result.offsets.clone(), Some(result))
    } else {
        (zero_seed(n), None)
    };
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Fitting, None);
    let solution = solve_offsets(&graph, &seed, &config.weighting, &config.solver)?;
    reporter.finish_stage();

    Ok(FitRun {
        filenames: file.filenames.clone(),
        bootstrap,
        solution,
        excluded: excluded.to_vec(),
    })
}

/// Fitting stage: read measurements, fit, write offsets (and diagnostics).
pub fn run_fit(config: &SkyoffConfig, reporter: &dyn ProgressReporter) -> Result<FitRun> {
    let start = Instant::now();
    reporter.begin_stage(PipelineStage::Reading, None);
    let file = load_measurements(&config.measurements)?;
    let excluded = match &config.fit.exclude {
        Some(path) => read_index_list(path)?,
        None => Vec::new(),
    };
    reporter.finish_stage();

    let run = fit_measurements(&file, &config.fit, &excluded, reporter)?;
    write_fit_outputs(config, &run)?;

    info!(
        images = run.filenames.len(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "Fit stage complete"
    );
    Ok(run)
}

fn write_fit_outputs(config: &SkyoffConfig, run: &FitRun) -> Result<()> {
    save_offsets(&config.offsets, &run.filenames, run.solution.offsets())?;
    if let Some(path) = &config.fit.diagnostics {
        DiagnosticsReport::new(
            &run.filenames,
            &run.solution,
            &run.excluded,
            config.fit.weighting.to_string(),
        )
        .save(path)?;
        info!(diagnostics = %path.display(), "Wrote fit diagnostics");
    }
    Ok(())
}

/// Outcome of the apply stage.
#[derive(Clone, Debug)]
pub struct ApplyRun {
    /// Corrected image manifests with the shift added to each, input order.
    pub outputs: Vec<(PathBuf, f64)>,
}

/// Apply stage: add each fitted offset, divided by the image's flux scale, to
/// its science plane and write corrected copies.
pub fn run_apply(config: &SkyoffConfig, reporter: &dyn ProgressReporter) -> Result<ApplyRun> {
    let start = Instant::now();
    reporter.begin_stage(PipelineStage::Reading, None);
    let offsets = load_offsets(&config.offsets)?;
    let mut records: Vec<ImageRecord> = offsets
        .iter()
        .enumerate()
        .map(|(k, (name, _))| ImageRecord::new(PathBuf::from(strip_extension_marker(name)), k))
        .collect();
    apply_flux_source(&config.flux, &mut records)?;
    ensure_inputs_exist(&records)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Applying, Some(records.len()));
    let mut outputs = Vec::with_capacity(records.len());
    for (k, (record, (_, offset))) in records.iter().zip(&offsets).enumerate() {
        if !(record.flux_scale > 0.0 && record.flux_scale.is_finite()) {
            return Err(SkyoffError::InvalidFluxScale {
                image: record.path.clone(),
                scale: record.flux_scale,
            });
        }
        let shift = offset / record.flux_scale;
        let out = write_shifted_copy(&record.path, shift as f32, &config.apply.suffix)?;
        info!(
            image = %record.path.display(),
            offset,
            flux_scale = record.flux_scale,
            shift,
            "Applied offset"
        );
        outputs.push((out, shift));
        reporter.advance(k + 1);
    }
    reporter.finish_stage();

    info!(
        images = outputs.len(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "Apply stage complete"
    );
    Ok(ApplyRun { outputs })
}

/// Both stages back to back.
pub fn run_pipeline(
    config: &SkyoffConfig,
    loader: &dyn ImageLoader,
    reporter: &dyn ProgressReporter,
) -> Result<(MeasurementRun, FitRun)> {
    let measured = run_measure(config, loader, reporter)?;
    let fitted = run_fit(config, reporter)?;
    Ok((measured, fitted))
}
