//! Structural checks.
//!
//! Verification is a diagnostic: nothing on the carving path calls it.
//! It reports the first violation found in pre-order.

use crate::constants::GEOMETRY_TOLERANCE;
use crate::data::LeafData;
use crate::error::Violation;
use crate::node::Node;
use crate::space::Space;
use crate::tree::Tree;

impl<P: Space, D: LeafData> Node<P, D> {
  /// Check this subtree's invariants.
  ///
  /// Leaves must carry valid data, so nodes materialized by
  /// [`Node::subdivide`] fail until a later insertion populates them.
  pub fn verify(&self) -> Result<(), Violation> {
    let halfwidth = self.halfwidth;
    if !(halfwidth.is_finite() && halfwidth > 0.0) {
      return Err(Violation::BadHalfwidth { halfwidth });
    }

    if self.is_leaf() {
      let data = self.data.as_ref().ok_or(Violation::EmptyLeaf)?;
      return data.validate().map_err(Violation::InvalidData);
    }
    if self.data.is_some() {
      return Err(Violation::DataOnInternalNode);
    }

    let tolerance = GEOMETRY_TOLERANCE * halfwidth;
    for (index, child) in self.children() {
      if (child.halfwidth - halfwidth * 0.5).abs() > tolerance {
        return Err(Violation::ChildHalfwidth { index });
      }
      if (child.center - self.child_center(index)).max_abs() > tolerance {
        return Err(Violation::MisplacedChild { index });
      }
      child.verify()?;
    }
    Ok(())
  }
}

impl<P: Space, D: LeafData> Tree<P, D> {
  /// An uninitialized tree, or a root that is still an empty leaf, passes
  /// trivially. Otherwise the depth must be non-negative and every node must
  /// verify.
  pub fn verify(&self) -> Result<(), Violation> {
    let Some(root) = self.root() else {
      return Ok(());
    };
    if self.max_depth() < 0 {
      return Err(Violation::NegativeDepth(self.max_depth()));
    }
    if root.is_empty() {
      return Ok(());
    }
    root.verify()
  }
}

#[cfg(test)]
#[path = "verify_test.rs"]
mod verify_test;
