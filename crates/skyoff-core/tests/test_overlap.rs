mod common;

use std::sync::Arc;

use common::ShiftMapper;
use skyoff_core::image::{Footprint, ImageHeader, ImageRecord};
use skyoff_core::overlap::{footprints_overlap, OverlapMatrix};

fn footprint(ra: f64, dec: f64, extent: f64) -> Footprint {
    Footprint {
        ra_center: ra,
        dec_center: dec,
        ra_extent: extent,
        dec_extent: extent,
        crosses_ra_zero: false,
    }
}

#[test]
fn test_overlap_uses_averaged_extents() {
    let a = footprint(10.0, 0.0, 0.5);
    let b = footprint(10.35, 0.0, 0.3);
    let c = footprint(10.5, 0.0, 0.3);

    assert!(footprints_overlap(&a, &b));
    assert!(!footprints_overlap(&a, &c));
}

#[test]
fn test_overlap_needs_both_axes() {
    let a = footprint(10.0, 0.0, 0.5);
    let b = footprint(10.1, 0.6, 0.5);
    assert!(!footprints_overlap(&a, &b));
}

#[test]
fn test_overlap_is_symmetric() {
    let fps = [
        footprint(10.0, 0.0, 0.5),
        footprint(10.3, 0.2, 0.5),
        footprint(11.0, 0.0, 0.5),
        footprint(10.45, -0.1, 0.4),
    ];
    for a in &fps {
        for b in &fps {
            assert_eq!(footprints_overlap(a, b), footprints_overlap(b, a));
        }
    }
}

#[test]
fn test_overlap_across_ra_zero() {
    let mut a = footprint(359.9, 0.0, 0.5);
    a.crosses_ra_zero = true;
    let b = footprint(0.1, 0.0, 0.5);
    assert!(footprints_overlap(&a, &b));
    assert!(footprints_overlap(&b, &a));

    // Without the crossing flag the raw difference is used.
    let plain = footprint(359.9, 0.0, 0.5);
    assert!(!footprints_overlap(&plain, &b));
}

#[test]
fn test_footprint_extent_across_ra_zero() {
    let fp = Footprint::from_bounds(0.0, 5.0, 0.2, 359.7, 4.8, 5.2, true);
    assert!((fp.ra_extent - 0.5).abs() < 1e-9);
    assert!((fp.dec_extent - 0.4).abs() < 1e-9);

    let fp = Footprint::from_bounds(10.0, 5.0, 9.8, 10.2, 4.8, 5.2, false);
    assert!((fp.ra_extent - 0.4).abs() < 1e-9);
}

#[test]
fn test_matrix_diagonal_is_false() {
    let a = footprint(10.0, 0.0, 0.5);
    let matrix = OverlapMatrix::from_footprints(&[&a, &a]);
    assert!(!matrix.get(0, 0));
    assert!(!matrix.get(1, 1));
    assert!(matrix.get(0, 1));
    assert!(matrix.get(1, 0));
}

#[test]
fn test_candidate_pairs_carry_row_major_index() {
    let fps = [
        footprint(10.0, 0.0, 0.5),
        footprint(10.3, 0.0, 0.5),
        footprint(20.0, 0.0, 0.5),
        footprint(10.6, 0.0, 0.5),
    ];
    let refs: Vec<&Footprint> = fps.iter().collect();
    let matrix = OverlapMatrix::from_footprints(&refs);

    let pairs: Vec<(usize, usize, usize)> = matrix.candidate_pairs().collect();
    // All pairs: (0,1)=1 (0,2)=2 (0,3)=3 (1,2)=4 (1,3)=5 (2,3)=6.
    assert_eq!(pairs, vec![(1, 0, 1), (5, 1, 3)]);
}

#[test]
fn test_matrix_display() {
    let a = footprint(10.0, 0.0, 0.5);
    let b = footprint(30.0, 0.0, 0.5);
    let matrix = OverlapMatrix::from_footprints(&[&a, &a, &b]);
    assert_eq!(matrix.to_string(), "[0 1 0]\n[1 0 0]\n[0 0 0]\n");
}

#[test]
fn test_uninspected_records_never_overlap() {
    let header = ImageHeader {
        width: 10,
        height: 10,
        footprint: footprint(10.0, 0.0, 0.5),
        mapper: Arc::new(ShiftMapper::new(0.0, 0.0)),
    };
    let records = vec![
        ImageRecord::new("a".into(), 0).with_header(header.clone()),
        ImageRecord::new("b".into(), 1).with_header(header),
        ImageRecord::new("c".into(), 2),
    ];
    let matrix = OverlapMatrix::from_records(&records);
    assert_eq!(matrix.len(), 3);
    assert!(matrix.get(0, 1));
    assert!(!matrix.get(0, 2));
    assert!(!matrix.get(2, 1));
}
