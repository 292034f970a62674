//! Node - one axis-aligned cube (or square) of the tree.
//!
//! A node owns its children outright (`Option<Box<Node>>` per slot) and an
//! optional leaf payload. Two invariants hold for every node the tree
//! builds:
//!
//! - A node with data has no children; a node with children has no data.
//! - Child `i` is centered at `center + relative_child_pos(i) * hw / 2` and
//!   has halfwidth `hw / 2`.
//!
//! Nodes are created lazily. Carving only materializes a child when the
//! shape intersects its cube, so untouched space costs nothing.

use smallvec::SmallVec;

use crate::constants::OCT_CHILDREN;
use crate::data::LeafData;
use crate::shape::Shape;
use crate::space::Space;

/// Child slots. Length is always `P::CHILDREN`.
pub(crate) type ChildSlots<P, D> = SmallVec<[Option<Box<Node<P, D>>>; OCT_CHILDREN]>;

/// A cube of space, its children, and its leaf payload.
#[derive(Clone, Debug)]
pub struct Node<P: Space, D> {
  pub(crate) center: P,
  pub(crate) halfwidth: f64,
  pub(crate) children: ChildSlots<P, D>,
  pub(crate) data: Option<D>,
}

impl<P: Space, D: LeafData> Node<P, D> {
  /// Empty leaf (no children, no data).
  pub fn new(center: P, halfwidth: f64) -> Self {
    Self {
      center,
      halfwidth,
      children: (0..P::CHILDREN).map(|_| None).collect(),
      data: None,
    }
  }

  #[inline]
  pub fn center(&self) -> P {
    self.center
  }

  #[inline]
  pub fn halfwidth(&self) -> f64 {
    self.halfwidth
  }

  #[inline]
  pub fn data(&self) -> Option<&D> {
    self.data.as_ref()
  }

  #[inline]
  pub fn data_mut(&mut self) -> Option<&mut D> {
    self.data.as_mut()
  }

  /// Child in slot `index`, if materialized.
  #[inline]
  pub fn child(&self, index: usize) -> Option<&Node<P, D>> {
    self.children.get(index)?.as_deref()
  }

  /// Materialized children with their slot indices.
  pub fn children(&self) -> impl Iterator<Item = (usize, &Node<P, D>)> {
    self
      .children
      .iter()
      .enumerate()
      .filter_map(|(index, slot)| slot.as_deref().map(|child| (index, child)))
  }

  /// True iff no child slot is occupied.
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.iter().all(Option::is_none)
  }

  /// A leaf without data.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_none() && self.is_leaf()
  }

  /// Child index whose octant holds `p`, or `None` when `p` lies outside
  /// this node's closed cube (or is not finite).
  #[inline]
  pub fn contains(&self, p: P) -> Option<usize> {
    let offset = p - self.center;
    // NaN compares false, so test for "inside" rather than "outside"
    if offset.max_abs() <= self.halfwidth && offset.is_finite() {
      Some(P::octant(offset))
    } else {
      None
    }
  }

  /// Center of child `index`, materialized or not.
  #[inline]
  pub fn child_center(&self, index: usize) -> P {
    self.center + P::relative_child_pos(index) * (self.halfwidth * 0.5)
  }

  /// Materialize child `index` if absent.
  ///
  /// Returns `None` for an index outside `0..P::CHILDREN`.
  pub fn init_child(&mut self, index: usize) -> Option<&mut Node<P, D>> {
    if index >= self.children.len() {
      return None;
    }
    let center = self.child_center(index);
    let halfwidth = self.halfwidth * 0.5;
    let child = self.children[index].get_or_insert_with(|| Box::new(Node::new(center, halfwidth)));
    Some(&mut **child)
  }

  // ===========================================================================
  // Point queries
  // ===========================================================================

  /// Deepest existing node containing `p`.
  ///
  /// Stops at the current node when the child that would contain `p` has not
  /// been materialized. Below this node the descent follows `P::octant`
  /// alone, the same rule [`Node::expand`] and point insertion use, so a
  /// point on a shared face always resolves to one child.
  pub fn retrieve(&self, p: P) -> Option<&Node<P, D>> {
    let mut index = self.contains(p)?;
    let mut node = self;
    while let Some(child) = node.children[index].as_deref() {
      node = child;
      index = P::octant(p - node.center);
    }
    Some(node)
  }

  /// Mutable variant of [`Node::retrieve`].
  pub fn retrieve_mut(&mut self, p: P) -> Option<&mut Node<P, D>> {
    self.contains(p)?;
    let mut node = self;
    loop {
      let index = P::octant(p - node.center);
      if node.children[index].is_none() {
        return Some(node);
      }
      node = node.children[index].as_deref_mut()?;
    }
  }

  /// Materialize the path `depth` levels down toward `p` and return the node
  /// reached.
  ///
  /// Descent stops early at a node that already carries data. Returns `None`
  /// when `p` is outside this node.
  pub fn expand(&mut self, p: P, depth: u32) -> Option<&mut Node<P, D>> {
    self.contains(p)?;
    Some(self.expand_toward(p, depth))
  }

  fn expand_toward(&mut self, p: P, depth: u32) -> &mut Node<P, D> {
    if depth == 0 || self.data.is_some() {
      return self;
    }
    let index = P::octant(p - self.center);
    let center = self.child_center(index);
    let halfwidth = self.halfwidth * 0.5;
    let child = self.children[index].get_or_insert_with(|| Box::new(Node::new(center, halfwidth)));
    child.expand_toward(p, depth - 1)
  }

  // ===========================================================================
  // Shape traversal
  // ===========================================================================

  /// Apply `shape` to every populated leaf it intersects, without changing
  /// structure. The caller has already tested this node.
  pub fn find<S: Shape<P, D> + ?Sized>(&mut self, shape: &mut S) {
    if let Some(data) = self.data.take() {
      self.data = Some(shape.apply_to_leaf(self.center, self.halfwidth, Some(data)));
    }
    let target = shape.point().map(|p| P::octant(p - self.center));
    for (index, slot) in self.children.iter_mut().enumerate() {
      let Some(child) = slot.as_deref_mut() else {
        continue;
      };
      let touched = match target {
        Some(target) => index == target,
        None => shape.intersects(child.center, child.halfwidth),
      };
      if touched {
        child.find(shape);
      }
    }
  }

  /// Carve `shape` into this subtree, `depth` levels deep.
  ///
  /// Stops at nodes that already carry data. Children are only materialized
  /// where the shape intersects them. With `simplify` set, each internal
  /// node tries to collapse once its children are done.
  pub fn insert<S: Shape<P, D> + ?Sized>(&mut self, shape: &mut S, depth: u32, simplify: bool) {
    if self.data.is_some() || (depth == 0 && self.is_leaf()) {
      let existing = self.data.take();
      self.data = Some(shape.apply_to_leaf(self.center, self.halfwidth, existing));
      return;
    }

    let halfwidth = self.halfwidth * 0.5;
    for index in 0..P::CHILDREN {
      let center = self.child_center(index);
      if !self.touches_child(&*shape, index, center, halfwidth) {
        continue;
      }
      let slot = &mut self.children[index];
      if slot.is_none() && depth == 0 {
        continue;
      }
      let child = slot.get_or_insert_with(|| Box::new(Node::new(center, halfwidth)));
      child.insert(shape, depth.saturating_sub(1), simplify);
    }

    if simplify {
      self.simplify();
    }
  }

  /// Structural refinement: materialize every node down to `depth` that
  /// `shape` intersects. Never touches leaf data, and never subdivides a
  /// populated leaf.
  pub fn subdivide<S: Shape<P, D> + ?Sized>(&mut self, shape: &S, depth: u32) {
    if depth == 0 || self.data.is_some() {
      return;
    }
    let halfwidth = self.halfwidth * 0.5;
    for index in 0..P::CHILDREN {
      let center = self.child_center(index);
      if self.touches_child(shape, index, center, halfwidth) {
        let child = self.children[index].get_or_insert_with(|| Box::new(Node::new(center, halfwidth)));
        child.subdivide(shape, depth - 1);
      }
    }
  }

  /// Whether `shape` reaches child `index`. Point shapes follow the octant
  /// of their point, so exactly one child takes them.
  #[inline]
  fn touches_child<S: Shape<P, D> + ?Sized>(&self, shape: &S, index: usize, center: P, halfwidth: f64) -> bool {
    match shape.point() {
      Some(p) => P::octant(p - self.center) == index,
      None => shape.intersects(center, halfwidth),
    }
  }

  // ===========================================================================
  // Simplification
  // ===========================================================================

  /// Collapse this node into a leaf when all children are populated leaves
  /// that agree with each other. Their data is merged into this node.
  pub fn simplify(&mut self) -> bool {
    if self.data.is_some() {
      return false;
    }

    // the borrowed leaves must be gone before the slots are cleared
    let merged = {
      let mut leaves: SmallVec<[&D; OCT_CHILDREN]> = SmallVec::new();
      for slot in self.children.iter() {
        let Some(child) = slot.as_deref() else {
          return false;
        };
        let Some(data) = child.data.as_ref() else {
          return false;
        };
        if !child.is_leaf() {
          return false;
        }
        leaves.push(data);
      }

      let Some((first, rest)) = leaves.split_first() else {
        return false;
      };
      if !rest.iter().all(|other| first.agrees_with(other)) {
        return false;
      }
      let mut merged = (*first).clone();
      for other in rest {
        merged.merge(other);
      }
      merged
    };

    self.data = Some(merged);
    for slot in self.children.iter_mut() {
      *slot = None;
    }
    true
  }

  /// Bottom-up [`Node::simplify`]. Returns the number of collapsed nodes.
  pub fn simplify_recur(&mut self) -> usize {
    let mut collapsed = 0;
    for child in self.children.iter_mut().flatten() {
      collapsed += child.simplify_recur();
    }
    if self.simplify() {
      collapsed += 1;
    }
    collapsed
  }

  // ===========================================================================
  // Pruning and counting
  // ===========================================================================

  /// Drop leaf data rejected by `keep`, pruning children left empty.
  /// Returns the number of payloads removed.
  pub fn filter<F: FnMut(&D) -> bool>(&mut self, keep: &mut F) -> usize {
    let mut removed = 0;
    if self.data.as_ref().is_some_and(|data| !keep(data)) {
      self.data = None;
      removed += 1;
    }
    for slot in self.children.iter_mut() {
      let prune = match slot.as_deref_mut() {
        Some(child) => {
          removed += child.filter(keep);
          child.is_empty()
        }
        None => false,
      };
      if prune {
        *slot = None;
      }
    }
    removed
  }

  /// This node plus all descendants.
  pub fn num_nodes(&self) -> usize {
    1 + self
      .children
      .iter()
      .flatten()
      .map(|child| child.num_nodes())
      .sum::<usize>()
  }

  /// Nodes without children, populated or not.
  pub fn num_leaves(&self) -> usize {
    if self.is_leaf() {
      return 1;
    }
    self
      .children
      .iter()
      .flatten()
      .map(|child| child.num_leaves())
      .sum()
  }

  /// Populated leaves in pre-order, children in index order.
  pub fn leaves(&self) -> Leaves<'_, P, D> {
    Leaves { stack: vec![self] }
  }
}

/// Iterator over populated leaves, see [`Node::leaves`].
pub struct Leaves<'a, P: Space, D> {
  stack: Vec<&'a Node<P, D>>,
}

impl<'a, P: Space, D> Leaves<'a, P, D> {
  pub(crate) fn empty() -> Self {
    Self { stack: Vec::new() }
  }
}

impl<'a, P: Space, D> Iterator for Leaves<'a, P, D> {
  type Item = &'a Node<P, D>;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(node) = self.stack.pop() {
      self
        .stack
        .extend(node.children.iter().rev().filter_map(|slot| slot.as_deref()));
      if node.data.is_some() {
        return Some(node);
      }
    }
    None
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
