//! Carving predicates.
//!
//! A [`Shape`] tells the tree where to go (`intersects`) and what to do once
//! it gets there (`apply_to_leaf`). Its vertices bound the region the tree
//! must cover before an insertion starts.

use crate::data::LeafData;
use crate::space::Space;

mod point;
mod region;
mod segment;

pub use point::PointSample;
pub use region::RoomRegion;
pub use segment::{CarveSegment, LineSegment};

/// A region of space that can be carved into a tree.
pub trait Shape<P: Space, D: LeafData> {
  /// Number of bounding vertices.
  fn num_vertices(&self) -> usize;

  /// Bounding vertex `index`, for `index < num_vertices()`.
  ///
  /// Vertices are only used to grow the tree's domain; the convex hull of
  /// the vertices must enclose the shape.
  fn vertex(&self, index: usize) -> P;

  /// Whether the shape overlaps the axis-aligned cube at `center`.
  ///
  /// May report false positives, never false negatives.
  fn intersects(&self, center: P, halfwidth: f64) -> bool;

  /// The single point a point-like shape occupies.
  ///
  /// When set, traversal ignores `intersects` below the root and follows
  /// `Space::octant` of this point, so exactly one cell per level takes the
  /// shape even when it sits on a shared face.
  fn point(&self) -> Option<P> {
    None
  }

  /// Update (or create) the payload of one touched leaf.
  fn apply_to_leaf(&mut self, center: P, halfwidth: f64, existing: Option<D>) -> D;
}

/// Overlap test between the box `[min, max]` and the cube at `center`.
///
/// Boxes with extent on an axis must overlap the cube with positive length
/// there, so cells that only share a face or corner are left out. A flat
/// axis (`min == max`) falls back to the closed test.
pub(crate) fn box_overlaps_cube<P: Space>(min: P, max: P, center: P, halfwidth: f64) -> bool {
  (0..P::DIM).all(|axis| {
    let (lo, hi) = (min.component(axis), max.component(axis));
    let c = center.component(axis);
    if lo < hi {
      lo < c + halfwidth && hi > c - halfwidth
    } else {
      lo <= c + halfwidth && hi >= c - halfwidth
    }
  })
}
