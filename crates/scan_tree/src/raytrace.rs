//! Segment traversal: collecting, probing and carving leaves along a line.
//!
//! Children are visited in order of the parameter at which the segment
//! enters them, so results come out ordered from the segment's origin to
//! its end.

use smallvec::SmallVec;

use crate::constants::OCT_CHILDREN;
use crate::data::LeafData;
use crate::error::TreeError;
use crate::node::Node;
use crate::shape::LineSegment;
use crate::space::Space;
use crate::tree::Tree;

/// Existing children crossed by `segment`, sorted by entry parameter.
fn crossed_children<'a, P: Space, D>(
  node: &'a Node<P, D>,
  segment: &LineSegment<P>,
) -> SmallVec<[(f64, &'a Node<P, D>); OCT_CHILDREN]> {
  let mut hits: SmallVec<[(f64, &'a Node<P, D>); OCT_CHILDREN]> = node
    .children
    .iter()
    .filter_map(|slot| slot.as_deref())
    .filter_map(|child| {
      segment
        .clip_cube(child.center, child.halfwidth)
        .map(|(tmin, _)| (tmin, child))
    })
    .collect();
  hits.sort_by(|a, b| a.0.total_cmp(&b.0));
  hits
}

impl<P: Space, D: LeafData> Node<P, D> {
  /// Append the data of every populated leaf below this node that
  /// `segment` crosses. Never creates nodes.
  pub fn raytrace<'a>(&'a self, segment: &LineSegment<P>, out: &mut Vec<&'a D>) {
    if let Some(data) = &self.data {
      out.push(data);
      return;
    }
    for (_, child) in crossed_children(self, segment) {
      child.raytrace(segment, out);
    }
  }

  /// First populated leaf along `segment`.
  pub fn first_hit(&self, segment: &LineSegment<P>) -> Option<&D> {
    if let Some(data) = &self.data {
      return Some(data);
    }
    crossed_children(self, segment)
      .into_iter()
      .find_map(|(_, child)| child.first_hit(segment))
  }

  /// Carve `segment` down `depth` levels, materializing every node it
  /// crosses and default data at the leaves it reaches.
  pub fn trace_and_insert<'a>(&'a mut self, segment: &LineSegment<P>, depth: u32, out: &mut Vec<&'a mut D>)
  where
    D: Default,
  {
    if self.data.is_some() || (depth == 0 && self.is_leaf()) {
      out.push(self.data.get_or_insert_with(D::default));
      return;
    }

    if depth > 0 {
      for index in 0..P::CHILDREN {
        let center = self.child_center(index);
        if segment.clip_cube(center, self.halfwidth * 0.5).is_some() {
          self.init_child(index);
        }
      }
    }

    let mut hits: SmallVec<[(f64, &'a mut Node<P, D>); OCT_CHILDREN]> = self
      .children
      .iter_mut()
      .filter_map(|slot| slot.as_deref_mut())
      .filter_map(|child| {
        segment
          .clip_cube(child.center, child.halfwidth)
          .map(|(tmin, _)| (tmin, child))
      })
      .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (_, child) in hits {
      child.trace_and_insert(segment, depth.saturating_sub(1), out);
    }
  }
}

impl<P: Space, D: LeafData> Tree<P, D> {
  /// Data of every populated leaf crossed by the segment `a -> b`, ordered
  /// from `a` to `b`. Never changes the tree.
  pub fn raytrace(&self, a: P, b: P) -> Vec<&D> {
    let mut out = Vec::new();
    let segment = LineSegment::new(a, b);
    if let Some(root) = self.root() {
      if segment.clip_cube(root.center, root.halfwidth).is_some() {
        root.raytrace(&segment, &mut out);
      }
    }
    out
  }

  /// Data of the first populated leaf met travelling from `a` to `b`.
  pub fn first_hit(&self, a: P, b: P) -> Option<&D> {
    let segment = LineSegment::new(a, b);
    let root = self.root()?;
    segment.clip_cube(root.center, root.halfwidth)?;
    root.first_hit(&segment)
  }

  /// Insert both endpoints as points, then carve the segment between them
  /// down to `max_depth`.
  ///
  /// Returns the data of every leaf along the segment in order, created
  /// with `D::default()` where absent.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "tree::trace_and_insert"))]
  pub fn trace_and_insert(&mut self, a: P, b: P) -> Result<Vec<&mut D>, TreeError>
  where
    D: Default,
  {
    if !(a.is_finite() && b.is_finite()) {
      return Err(TreeError::NonFinitePoint);
    }
    self.insert_point(a)?;
    self.insert_point(b)?;

    let depth = u32::try_from(self.max_depth()).unwrap_or(0);
    let segment = LineSegment::new(a, b);
    let mut out = Vec::new();
    let root = self.root_mut().ok_or(TreeError::Uninitialized)?;
    if segment.clip_cube(root.center, root.halfwidth).is_some() {
      root.trace_and_insert(&segment, depth, &mut out);
    }
    Ok(out)
  }
}

#[cfg(test)]
#[path = "raytrace_test.rs"]
mod raytrace_test;
