mod common;

use approx::assert_relative_eq;
use common::{make_planes, ShiftMapper};
use ndarray::Array2;
use skyoff_core::measure::{estimate_pair_offset, pixel_correspondence, PairEstimate, PairSide};
use skyoff_core::stats::SigmaClipParams;
use skyoff_core::wcs::CoordinateMapper;

/// Maps every pixel to NaN sky coordinates.
struct NanMapper;

impl CoordinateMapper for NanMapper {
    fn pixel_to_sky(&self, x: &[f64], _y: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (vec![f64::NAN; x.len()], vec![f64::NAN; x.len()])
    }

    fn sky_to_pixel(&self, ra: &[f64], _dec: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (vec![f64::NAN; ra.len()], vec![f64::NAN; ra.len()])
    }
}

/// Integer sky pattern in global columns, exact in f32.
fn pattern(global_col: usize) -> f32 {
    100.0 + (global_col % 7) as f32
}

#[test]
fn test_correspondence_excludes_edge_targets() {
    // j sits 10 columns to the right: i column c lands on j column c - 10.
    let i_mapper = ShiftMapper::new(0.0, 0.0);
    let j_mapper = ShiftMapper::new(10.0, 0.0);
    let ones = Array2::<f32>::ones((40, 40));

    let corr = pixel_correspondence(&ones, &i_mapper, &ones, &j_mapper);

    // Targets on row 0 or column 0 of j are rejected: 29 columns x 39 rows.
    assert_eq!(corr.len(), 29 * 39);
    assert!(corr.j_pixels.iter().all(|&(r, c)| r > 0 && c > 0));
    assert!(corr
        .i_pixels
        .iter()
        .zip(&corr.j_pixels)
        .all(|(&(ir, ic), &(jr, jc))| ir == jr && ic == jc + 10));
}

#[test]
fn test_correspondence_respects_both_weight_planes() {
    let i_mapper = ShiftMapper::new(0.0, 0.0);
    let j_mapper = ShiftMapper::new(0.0, 0.0);
    let mut i_weight = Array2::<f32>::ones((20, 20));
    let mut j_weight = Array2::<f32>::ones((20, 20));
    // Zero weight on i's top half and j's left half.
    i_weight.slice_mut(ndarray::s![..10, ..]).fill(0.0);
    j_weight.slice_mut(ndarray::s![.., ..10]).fill(0.0);

    let corr = pixel_correspondence(&i_weight, &i_mapper, &j_weight, &j_mapper);

    assert_eq!(corr.len(), 10 * 10);
    assert!(corr.i_pixels.iter().all(|&(r, c)| r >= 10 && c >= 10));
}

#[test]
fn test_correspondence_drops_unmappable_pixels() {
    let ones = Array2::<f32>::ones((10, 10));
    let corr = pixel_correspondence(&ones, &NanMapper, &ones, &ShiftMapper::new(0.0, 0.0));
    assert!(corr.is_empty());
}

#[test]
fn test_parallel_mapping_matches_geometry() {
    let i_mapper = ShiftMapper::new(0.0, 0.0);
    let j_mapper = ShiftMapper::new(100.0, 0.0);
    let ones = Array2::<f32>::ones((256, 256));

    let corr = pixel_correspondence(&ones, &i_mapper, &ones, &j_mapper);

    assert_eq!(corr.len(), 155 * 255);
    assert_eq!(corr.i_pixels[0], (1, 101));
    assert_eq!(corr.j_pixels[0], (1, 1));
}

#[test]
fn test_estimate_recovers_known_offset() {
    let i_planes = make_planes(40, 40, |_, c| pattern(c) + 3.0);
    let j_planes = make_planes(40, 40, |_, c| pattern(c + 10));
    let i_mapper = ShiftMapper::new(0.0, 0.0);
    let j_mapper = ShiftMapper::new(10.0, 0.0);

    let estimate = estimate_pair_offset(
        PairSide {
            planes: &i_planes,
            flux_scale: 1.0,
            mapper: &i_mapper,
        },
        PairSide {
            planes: &j_planes,
            flux_scale: 1.0,
            mapper: &j_mapper,
        },
        500,
        &SigmaClipParams::default(),
    )
    .unwrap();

    let stats = estimate.stats().expect("measured");
    assert_relative_eq!(stats.median, 3.0);
    assert_relative_eq!(stats.std, 0.0);
    assert_eq!(stats.count, 29 * 39);
    assert_eq!(estimate.as_tuple(), (3.0, 0.0, 29 * 39));
}

#[test]
fn test_reverse_pair_negates_offset() {
    let a = make_planes(40, 40, |_, c| pattern(c) + 3.0);
    let b = make_planes(40, 40, |_, c| pattern(c + 10));
    let a_mapper = ShiftMapper::new(0.0, 0.0);
    let b_mapper = ShiftMapper::new(10.0, 0.0);

    let estimate = estimate_pair_offset(
        PairSide {
            planes: &b,
            flux_scale: 1.0,
            mapper: &b_mapper,
        },
        PairSide {
            planes: &a,
            flux_scale: 1.0,
            mapper: &a_mapper,
        },
        500,
        &SigmaClipParams::default(),
    )
    .unwrap();

    assert_relative_eq!(estimate.stats().unwrap().median, -3.0);
}

#[test]
fn test_flux_scales_apply_before_differencing() {
    let i_planes = make_planes(30, 30, |_, _| 5.0);
    let j_planes = make_planes(30, 30, |_, _| 4.0);
    let mapper = ShiftMapper::new(0.0, 0.0);

    let estimate = estimate_pair_offset(
        PairSide {
            planes: &i_planes,
            flux_scale: 2.0,
            mapper: &mapper,
        },
        PairSide {
            planes: &j_planes,
            flux_scale: 0.5,
            mapper: &mapper,
        },
        500,
        &SigmaClipParams::default(),
    )
    .unwrap();

    assert_relative_eq!(estimate.stats().unwrap().median, 8.0);
}

#[test]
fn test_small_overlap_returns_sentinel() {
    // Only a 20 x 20 block of i is weighted; all of it lands inside j.
    let mut i_planes = make_planes(40, 40, |_, _| 1.0);
    i_planes.weight.fill(0.0);
    i_planes
        .weight
        .slice_mut(ndarray::s![10..30, 15..35])
        .fill(1.0);
    let j_planes = make_planes(40, 40, |_, _| 0.0);
    let i_mapper = ShiftMapper::new(0.0, 0.0);
    let j_mapper = ShiftMapper::new(10.0, 0.0);

    let estimate = estimate_pair_offset(
        PairSide {
            planes: &i_planes,
            flux_scale: 1.0,
            mapper: &i_mapper,
        },
        PairSide {
            planes: &j_planes,
            flux_scale: 1.0,
            mapper: &j_mapper,
        },
        500,
        &SigmaClipParams::default(),
    )
    .unwrap();

    assert_eq!(estimate, PairEstimate::Insufficient { pixels: 400 });
    assert!(!estimate.is_valid());
    assert_eq!(estimate.as_tuple(), (0.0, -1.0, -1));
}

#[test]
fn test_clipping_below_threshold_returns_sentinel() {
    // Rows 1..5 of i carry a bright artefact inside the overlap.
    let i_planes = make_planes(40, 40, |r, _| if r < 5 { 1000.0 } else { 3.0 });
    let j_planes = make_planes(40, 40, |_, _| 0.0);
    let i_mapper = ShiftMapper::new(0.0, 0.0);
    let j_mapper = ShiftMapper::new(10.0, 0.0);
    let clip = SigmaClipParams {
        sigma: 2.0,
        ..SigmaClipParams::default()
    };

    let estimate = estimate_pair_offset(
        PairSide {
            planes: &i_planes,
            flux_scale: 1.0,
            mapper: &i_mapper,
        },
        PairSide {
            planes: &j_planes,
            flux_scale: 1.0,
            mapper: &j_mapper,
        },
        1100,
        &clip,
    )
    .unwrap();

    // 29 x 39 overlap minus 4 artefact rows of 29 columns.
    assert_eq!(estimate, PairEstimate::Insufficient { pixels: 1131 - 116 });
}

#[test]
fn test_nan_pixels_are_dropped_from_the_difference() {
    let mut i_planes = make_planes(40, 40, |_, c| pattern(c) + 3.0);
    i_planes.science[[20, 20]] = f32::NAN;
    let j_planes = make_planes(40, 40, |_, c| pattern(c + 10));
    let i_mapper = ShiftMapper::new(0.0, 0.0);
    let j_mapper = ShiftMapper::new(10.0, 0.0);
    let i = PairSide {
        planes: &i_planes,
        flux_scale: 1.0,
        mapper: &i_mapper,
    };
    let j = PairSide {
        planes: &j_planes,
        flux_scale: 1.0,
        mapper: &j_mapper,
    };

    let estimate = estimate_pair_offset(i, j, 500, &SigmaClipParams::default()).unwrap();
    assert_eq!(estimate.as_tuple(), (3.0, 0.0, 29 * 39 - 1));

    // The dropped pixel counts against the threshold before clipping.
    let estimate = estimate_pair_offset(i, j, 29 * 39, &SigmaClipParams::default()).unwrap();
    assert_eq!(estimate, PairEstimate::Insufficient { pixels: 29 * 39 - 1 });
}
