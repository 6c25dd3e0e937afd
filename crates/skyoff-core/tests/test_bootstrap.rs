use approx::assert_relative_eq;
use skyoff_core::error::SkyoffError;
use skyoff_core::fit::{bootstrap_offsets, NodeStatus};
use skyoff_core::graph::{OffsetGraph, PairwiseMeasurement};
use skyoff_core::stats::median;

fn graph(n: usize, edges: &[(usize, usize, f64)]) -> OffsetGraph {
    OffsetGraph::from_measurements(
        n,
        edges.iter().enumerate().map(|(k, &(i, j, offset))| PairwiseMeasurement {
            i,
            j,
            offset,
            pair_index: k + 1,
            pixels: 1000,
            std: 1.0,
        }),
    )
    .unwrap()
}

#[test]
fn test_chain_propagation() {
    let g = graph(4, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)]);
    let result = bootstrap_offsets(&g, 0).unwrap();

    // Raw [0, 1, 3, 6], median 2.
    assert_eq!(result.offsets, vec![-2.0, -1.0, 1.0, 4.0]);
    assert_eq!(result.tree_edges, vec![(0, 1), (1, 2), (2, 3)]);
    assert_eq!(result.levels, 4);
    assert!(result.unreached.is_empty());
    assert!(result.status.iter().all(|&s| s == NodeStatus::Resolved));
}

#[test]
fn test_reverse_edges_negate() {
    let g = graph(2, &[(0, 1, 4.0)]);
    let result = bootstrap_offsets(&g, 1).unwrap();

    // Raw [-4, 0]; the difference survives centring.
    assert_relative_eq!(result.offsets[1] - result.offsets[0], 4.0);
    assert_eq!(result.tree_edges, vec![(1, 0)]);
}

#[test]
fn test_level_visits_in_ascending_order() {
    // 0 reaches 2 before 1 in insertion order, but 1 is visited first on the
    // next level, so 3 is resolved through 1.
    let g = graph(4, &[(0, 2, 10.0), (0, 1, 1.0), (1, 3, 1.0), (2, 3, 5.0)]);
    let result = bootstrap_offsets(&g, 0).unwrap();

    assert_eq!(result.tree_edges, vec![(0, 2), (0, 1), (1, 3)]);
    let raw: Vec<f64> = {
        let base = result.offsets[0];
        result.offsets.iter().map(|v| v - base).collect()
    };
    assert_relative_eq!(raw[3], 2.0);
    assert_relative_eq!(raw[2], 10.0);
}

#[test]
fn test_unreached_images_keep_neutral_seed() {
    let g = graph(5, &[(0, 1, 3.0), (3, 4, 1.0)]);
    let result = bootstrap_offsets(&g, 0).unwrap();

    assert_eq!(result.unreached, vec![2, 3, 4]);
    assert_eq!(result.status[2], NodeStatus::Unresolved);
    // Raw [0, 3, 0, 0, 0]: median 0, so nothing moves.
    assert_eq!(result.offsets, vec![0.0, 3.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_seed_is_median_centred() {
    let g = graph(
        5,
        &[(0, 1, 2.0), (0, 2, -7.0), (2, 3, 1.5), (3, 4, 4.0), (1, 4, 0.5)],
    );
    let result = bootstrap_offsets(&g, 0).unwrap();
    assert_relative_eq!(median(&result.offsets).unwrap(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_isolated_reference() {
    let g = graph(3, &[(1, 2, 1.0)]);
    let result = bootstrap_offsets(&g, 0).unwrap();
    assert_eq!(result.unreached, vec![1, 2]);
    assert_eq!(result.offsets, vec![0.0; 3]);
    assert_eq!(result.levels, 1);
}

#[test]
fn test_reference_out_of_range() {
    let g = graph(2, &[(0, 1, 1.0)]);
    assert!(matches!(
        bootstrap_offsets(&g, 2),
        Err(SkyoffError::ImageIndexOutOfRange { index: 2, total: 2 })
    ));
}
