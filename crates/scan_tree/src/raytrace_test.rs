use glam::{DVec2, DVec3};

use crate::data::{CarveData, LeafData};
use crate::error::TreeError;
use crate::shape::PointSample;
use crate::tree::Tree;

type Octree = Tree<DVec3, CarveData>;
type Quadtree = Tree<DVec2, CarveData>;

/// Samples at the depth-3 cell centers along y = z = 0.3 of an 8-wide tree.
fn row_of_samples() -> Octree {
  let mut tree = Octree::with_bounds(DVec3::ZERO, 4.0, 1.0);
  assert_eq!(tree.max_depth(), 3);
  for (i, x) in [-3.5, -1.5, 0.5, 2.5].into_iter().enumerate() {
    let prob = 0.1 + 0.2 * i as f64;
    tree
      .insert(&mut PointSample::new(DVec3::new(x, 0.3, 0.3), prob, 0.0, 0.0))
      .unwrap();
  }
  tree
}

// =========================================================================
// raytrace
// =========================================================================

#[test]
fn test_end_to_end_point_then_raytrace() {
  let mut tree = Octree::with_bounds(DVec3::ZERO, 1.0, 1.0);
  assert_eq!(tree.max_depth(), 1);

  tree
    .insert(&mut PointSample::new(DVec3::ONE, 0.8, 0.0, 0.0))
    .unwrap();
  let leaf = tree.retrieve(DVec3::ONE).expect("Point leaf exists");
  assert_eq!(leaf.count(), 1);

  let hits = tree.raytrace(DVec3::ZERO, DVec3::splat(2.0));
  assert_eq!(hits.len(), 1);
  assert!(std::ptr::eq(hits[0], leaf), "Raytrace returns the inserted leaf");
}

#[test]
fn test_raytrace_orders_along_segment() {
  let tree = row_of_samples();

  let forward: Vec<f64> = tree
    .raytrace(DVec3::new(-4.0, 0.3, 0.3), DVec3::new(4.0, 0.3, 0.3))
    .into_iter()
    .map(CarveData::probability)
    .collect();
  assert_eq!(forward.len(), 4);
  assert!(forward.windows(2).all(|w| w[0] < w[1]), "Ascending x: {:?}", forward);

  let backward: Vec<f64> = tree
    .raytrace(DVec3::new(4.0, 0.3, 0.3), DVec3::new(-4.0, 0.3, 0.3))
    .into_iter()
    .map(CarveData::probability)
    .collect();
  assert!(backward.windows(2).all(|w| w[0] > w[1]), "Descending x: {:?}", backward);
}

#[test]
fn test_raytrace_stops_at_segment_end() {
  let tree = row_of_samples();
  let hits = tree.raytrace(DVec3::new(-4.0, 0.3, 0.3), DVec3::new(-0.2, 0.3, 0.3));
  assert_eq!(hits.len(), 2, "Only the samples at x < 0");
}

#[test]
fn test_raytrace_misses_and_leaves_tree_alone() {
  let tree = row_of_samples();
  let before = tree.num_nodes();
  assert!(tree
    .raytrace(DVec3::new(-4.0, 3.0, 3.0), DVec3::new(4.0, 3.0, 3.0))
    .is_empty());
  assert!(tree
    .raytrace(DVec3::splat(10.0), DVec3::splat(20.0))
    .is_empty(), "Segment outside the root");
  assert_eq!(tree.num_nodes(), before);
  assert!(Octree::new().raytrace(DVec3::ZERO, DVec3::ONE).is_empty());
}

#[test]
fn test_first_hit() {
  let tree = row_of_samples();
  let hit = tree
    .first_hit(DVec3::new(4.0, 0.3, 0.3), DVec3::new(-4.0, 0.3, 0.3))
    .expect("Row is populated");
  assert!((hit.probability() - 0.7).abs() < 1e-12, "Nearest to x = 4 is x = 2.5");
  assert!(tree
    .first_hit(DVec3::new(4.0, -3.0, 0.3), DVec3::new(-4.0, -3.0, 0.3))
    .is_none());
}

// =========================================================================
// trace_and_insert
// =========================================================================

#[test]
fn test_trace_and_insert_creates_leaves_in_order() {
  let mut tree = Quadtree::with_bounds(DVec2::ZERO, 2.0, 1.0);
  assert_eq!(tree.max_depth(), 2);

  let a = DVec2::new(-1.5, 0.25);
  let b = DVec2::new(1.5, 0.25);
  let leaves = tree.trace_and_insert(a, b).unwrap();
  assert_eq!(leaves.len(), 4, "One leaf per unit cell along the row");
  for (i, data) in leaves.into_iter().enumerate() {
    data.set_room(i as i32);
  }

  assert_eq!(tree.leaves().count(), 4);
  for leaf in tree.leaves() {
    assert_eq!(leaf.halfwidth(), 0.5);
    assert_eq!(leaf.center().y, 0.5, "Only the row above y = 0");
  }
  assert_eq!(tree.retrieve(a).unwrap().room_label(), 0);
  assert_eq!(tree.retrieve(DVec2::new(0.5, 0.25)).unwrap().room_label(), 2);
  assert_eq!(tree.retrieve(b).unwrap().room_label(), 3);
}

#[test]
fn test_trace_and_insert_keeps_existing_data() {
  let mut tree = Quadtree::with_bounds(DVec2::ZERO, 2.0, 1.0);
  tree
    .insert(&mut PointSample::new(DVec2::new(0.5, 0.5), 0.9, 0.0, 0.0))
    .unwrap();
  tree
    .trace_and_insert(DVec2::new(-1.5, 0.25), DVec2::new(1.5, 0.25))
    .unwrap();
  assert_eq!(
    tree.retrieve(DVec2::new(0.5, 0.5)).unwrap().count(),
    1,
    "Sample survives tracing"
  );
}

#[test]
fn test_trace_and_insert_grows_domain() {
  let mut tree = Quadtree::with_resolution(1.0);
  let b = DVec2::new(10.3, 0.4);
  let hits = tree.trace_and_insert(DVec2::new(0.2, 0.4), b).unwrap();
  assert!(!hits.is_empty());
  assert!(tree.root().unwrap().contains(b).is_some());
  assert_eq!(tree.get_resolution(), Some(1.0), "Growth keeps the resolution");
  assert!(tree.retrieve(b).is_some(), "End point became a leaf");
}

#[test]
fn test_trace_and_insert_degenerate_segment() {
  let mut tree = Quadtree::with_bounds(DVec2::ZERO, 2.0, 1.0);
  let p = DVec2::new(0.3, 0.7);
  let hits = tree.trace_and_insert(p, p).unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(tree.num_nodes(), 3);
}

#[test]
fn test_trace_and_insert_rejects_non_finite() {
  let mut tree = Quadtree::with_resolution(1.0);
  let err = tree
    .trace_and_insert(DVec2::ZERO, DVec2::new(f64::NAN, 0.0))
    .unwrap_err();
  assert!(matches!(err, TreeError::NonFinitePoint));
  assert_eq!(tree.max_depth(), 0, "Tree untouched");
}
