//! Proximity queries over populated leaves.
//!
//! A leaf stands at its cell center. Both searches skip a subtree once the
//! distance from the query point to its cube rules it out.

use smallvec::SmallVec;

use crate::constants::OCT_CHILDREN;
use crate::data::LeafData;
use crate::node::Node;
use crate::space::Space;
use crate::tree::Tree;

/// Squared distance from `p` to the closed cube at `center`. Zero inside.
fn cube_distance_squared<P: Space>(p: P, center: P, halfwidth: f64) -> f64 {
  (0..P::DIM)
    .map(|axis| {
      let gap = ((p.component(axis) - center.component(axis)).abs() - halfwidth).max(0.0);
      gap * gap
    })
    .sum()
}

impl<P: Space, D: LeafData> Node<P, D> {
  /// Improve `best` (squared distance, leaf) with the populated leaves
  /// below this node.
  ///
  /// Children are searched nearest cube first, and the search stops once a
  /// cube is no closer than the best leaf found so far.
  pub fn nearest_leaf<'a>(&'a self, p: P, best: &mut Option<(f64, &'a Node<P, D>)>) {
    if self.data.is_some() {
      let distance = (p - self.center).length_squared();
      if best.map_or(true, |(closest, _)| distance < closest) {
        *best = Some((distance, self));
      }
      return;
    }

    let mut near: SmallVec<[(f64, &'a Node<P, D>); OCT_CHILDREN]> = self
      .children
      .iter()
      .filter_map(|slot| slot.as_deref())
      .map(|child| (cube_distance_squared(p, child.center, child.halfwidth), child))
      .collect();
    near.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (gap, child) in near {
      if best.is_some_and(|(closest, _)| gap >= closest) {
        break;
      }
      child.nearest_leaf(p, best);
    }
  }

  /// Append the data of every populated leaf whose center lies strictly
  /// within `radius` of `p`. A negative radius matches every leaf.
  pub fn leaves_in_range<'a>(&'a self, p: P, radius: f64, out: &mut Vec<&'a D>) {
    let unbounded = radius < 0.0;
    if let Some(data) = &self.data {
      if unbounded || (p - self.center).length_squared() < radius * radius {
        out.push(data);
      }
      return;
    }
    for child in self.children.iter().filter_map(|slot| slot.as_deref()) {
      if unbounded || cube_distance_squared(p, child.center, child.halfwidth) < radius * radius {
        child.leaves_in_range(p, radius, out);
      }
    }
  }
}

impl<P: Space, D: LeafData> Tree<P, D> {
  /// Data of the populated leaf whose center is closest to `p`.
  ///
  /// `None` for an empty tree or a non-finite point.
  pub fn nearest_neighbor(&self, p: P) -> Option<&D> {
    if !p.is_finite() {
      return None;
    }
    let mut best = None;
    self.root()?.nearest_leaf(p, &mut best);
    best.and_then(|(_, leaf)| leaf.data())
  }

  /// Data of every populated leaf whose center is closer than `radius` to
  /// `p`, in no particular order. A negative radius means unbounded.
  pub fn neighbors_in_range(&self, p: P, radius: f64) -> Vec<&D> {
    let mut out = Vec::new();
    if !p.is_finite() {
      return out;
    }
    if let Some(root) = self.root() {
      root.leaves_in_range(p, radius, &mut out);
    }
    out
  }
}

#[cfg(test)]
#[path = "neighbors_test.rs"]
mod neighbors_test;
