//! Tree - the growing-domain container around a root [`Node`].
//!
//! The tree owns the root, the maximum depth below it, and through them the
//! resolution: `resolution = 2 * root.halfwidth / 2^max_depth`. The domain
//! grows on demand. When a point falls outside the root, the root is wrapped
//! in a parent of twice the size (the old root becomes one of its children)
//! until the point fits, adding one level of depth per wrap so the
//! resolution never changes.
//!
//! # Example
//!
//! ```ignore
//! use glam::DVec3;
//! use scan_tree::{CarveData, CarveSegment, Octree, PointSample};
//!
//! let mut tree: Octree<CarveData> = Octree::with_resolution(0.05);
//! tree.insert(&mut CarveSegment::new(DVec3::ZERO, DVec3::new(3.0, 1.0, 0.5), 0.9))?;
//! tree.insert(&mut PointSample::new(DVec3::new(3.0, 1.0, 0.5), 0.1, 0.0, 0.0))?;
//! let leaf = tree.retrieve(DVec3::new(1.5, 0.5, 0.25));
//! ```

use crate::config::TreeConfig;
use crate::constants::MAX_TREE_DEPTH;
use crate::data::LeafData;
use crate::error::TreeError;
use crate::node::{Leaves, Node};
use crate::shape::Shape;
use crate::space::Space;

/// Depth that best honors `resolution` for a root of the given halfwidth.
///
/// Zero when either value is not a positive finite number, and never more
/// than [`MAX_TREE_DEPTH`].
fn depth_for(halfwidth: f64, resolution: f64) -> i32 {
  let valid = |v: f64| v.is_finite() && v > 0.0;
  if !valid(halfwidth) || !valid(resolution) {
    return 0;
  }
  let depth = (2.0 * halfwidth / resolution).log2().round();
  depth.clamp(0.0, f64::from(MAX_TREE_DEPTH)) as i32
}

/// Root-level shape test. A point shape is in the root exactly when the
/// root contains its point.
fn touches_root<P: Space, D: LeafData, S: Shape<P, D> + ?Sized>(shape: &S, root: &Node<P, D>) -> bool {
  match shape.point() {
    Some(p) => root.contains(p).is_some(),
    None => shape.intersects(root.center, root.halfwidth),
  }
}

/// Adaptive spatial tree over points of type `P` with leaf payload `D`.
#[derive(Clone, Debug)]
pub struct Tree<P: Space, D> {
  root: Option<Node<P, D>>,
  /// -1 when uninitialized.
  max_depth: i32,
  simplify_on_insert: bool,
}

impl<P: Space, D: LeafData> Default for Tree<P, D> {
  fn default() -> Self {
    Self::new()
  }
}

impl<P: Space, D: LeafData> Tree<P, D> {
  /// Uninitialized tree; set a resolution before inserting.
  pub fn new() -> Self {
    Self {
      root: None,
      max_depth: -1,
      simplify_on_insert: false,
    }
  }

  /// Zero-depth tree at the origin with the given resolution.
  pub fn with_resolution(resolution: f64) -> Self {
    let mut tree = Self::new();
    tree.set_resolution(resolution);
    tree
  }

  /// Tree whose root covers `center +- halfwidth`.
  pub fn with_bounds(center: P, halfwidth: f64, resolution: f64) -> Self {
    let mut tree = Self::new();
    tree.set(center, halfwidth, resolution);
    tree
  }

  /// Build from a validated [`TreeConfig`].
  pub fn from_config(config: &TreeConfig) -> Result<Self, TreeError> {
    config.validate()?;
    let mut tree = match config.halfwidth {
      Some(halfwidth) => Self::with_bounds(config.center_point()?, halfwidth, config.resolution),
      None => {
        let center: P = config.center_point()?;
        Self::with_bounds(center, config.resolution * 0.5, config.resolution)
      }
    };
    tree.simplify_on_insert = config.simplify_on_insert;
    Ok(tree)
  }

  // ===========================================================================
  // Attributes
  // ===========================================================================

  /// Reset to an empty single-leaf root.
  ///
  /// Depth is `round(log2(2 * halfwidth / resolution))`, clamped at zero.
  pub fn set(&mut self, center: P, halfwidth: f64, resolution: f64) {
    self.root = Some(Node::new(center, halfwidth));
    self.max_depth = depth_for(halfwidth, resolution);
  }

  /// Reset to a zero-depth tree at the origin whose root is one cell wide.
  pub fn set_resolution(&mut self, resolution: f64) {
    self.set(P::ZERO, resolution * 0.5, resolution);
  }

  /// Edge length of the finest cells, `None` when uninitialized.
  pub fn get_resolution(&self) -> Option<f64> {
    let root = self.root.as_ref()?;
    Some(2.0 * root.halfwidth / f64::from(self.max_depth.max(0)).exp2())
  }

  /// Allow every leaf to be subdivided `levels` further, up to
  /// [`MAX_TREE_DEPTH`]. No node changes.
  pub fn increase_depth(&mut self, levels: u32) {
    if self.root.is_some() {
      let levels = i32::try_from(levels).unwrap_or(i32::MAX);
      self.max_depth = self.max_depth.saturating_add(levels).min(MAX_TREE_DEPTH);
    }
  }

  /// Drop all content and return to the uninitialized state.
  pub fn clear(&mut self) {
    self.root = None;
    self.max_depth = -1;
  }

  #[inline]
  pub fn is_initialized(&self) -> bool {
    self.root.is_some()
  }

  #[inline]
  pub fn max_depth(&self) -> i32 {
    self.max_depth
  }

  #[inline]
  pub fn root(&self) -> Option<&Node<P, D>> {
    self.root.as_ref()
  }

  #[inline]
  pub fn root_mut(&mut self) -> Option<&mut Node<P, D>> {
    self.root.as_mut()
  }

  #[inline]
  pub fn simplify_on_insert(&self) -> bool {
    self.simplify_on_insert
  }

  #[inline]
  pub fn set_simplify_on_insert(&mut self, enabled: bool) {
    self.simplify_on_insert = enabled;
  }

  pub(crate) fn install(&mut self, root: Node<P, D>, max_depth: i32) {
    self.root = Some(root);
    self.max_depth = max_depth;
  }

  /// Depth as a recursion budget. Only meaningful with a root.
  fn depth_budget(&self) -> u32 {
    u32::try_from(self.max_depth).unwrap_or(0)
  }

  pub fn num_nodes(&self) -> usize {
    self.root.as_ref().map_or(0, Node::num_nodes)
  }

  pub fn num_leaves(&self) -> usize {
    self.root.as_ref().map_or(0, Node::num_leaves)
  }

  /// Populated leaves in pre-order.
  pub fn leaves(&self) -> Leaves<'_, P, D> {
    match &self.root {
      Some(root) => root.leaves(),
      None => Leaves::empty(),
    }
  }

  // ===========================================================================
  // Domain growth
  // ===========================================================================

  /// Grow the domain until the root contains `p`.
  ///
  /// An empty zero-depth root is recentred on `p` instead (doubling its
  /// halfwidth and adding a level, so the resolution holds). Otherwise the
  /// root is wrapped repeatedly; each wrap doubles the domain, so the
  /// number of wraps is logarithmic in the distance. Growth past
  /// [`MAX_TREE_DEPTH`] fails with [`TreeError::Config`] and keeps the
  /// levels already added.
  pub fn include_in_domain(&mut self, p: P) -> Result<(), TreeError> {
    if !p.is_finite() {
      return Err(TreeError::NonFinitePoint);
    }
    let Some(mut root) = self.root.take() else {
      return Err(TreeError::Uninitialized);
    };
    // doubling a zero or non-finite halfwidth never covers anything
    if !(root.halfwidth.is_finite() && root.halfwidth > 0.0) {
      let halfwidth = root.halfwidth;
      self.root = Some(root);
      return Err(TreeError::Config(format!("root halfwidth {halfwidth} cannot grow")));
    }

    if self.max_depth == 0 && root.is_empty() {
      #[cfg(feature = "tracing")]
      tracing::debug!(halfwidth = root.halfwidth, "recentering empty root");
      root = Node::new(p, root.halfwidth * 2.0);
      self.max_depth = 1;
    }

    while root.contains(p).is_none() {
      if self.max_depth >= MAX_TREE_DEPTH {
        self.root = Some(root);
        return Err(TreeError::Config(format!("reaching {p:?} needs more than {MAX_TREE_DEPTH} levels")));
      }
      // the old root sits on the far side of p
      let index = P::octant(root.center - p);
      let center = root.center - P::relative_child_pos(index) * root.halfwidth;
      let mut wrapper = Node::new(center, root.halfwidth * 2.0);
      // an empty root would only leave a dataless leaf behind
      if !root.is_empty() {
        wrapper.children[index] = Some(Box::new(root));
      }
      root = wrapper;
      self.max_depth = self.max_depth.saturating_add(1);

      #[cfg(feature = "tracing")]
      tracing::debug!(
        halfwidth = root.halfwidth,
        max_depth = self.max_depth,
        "wrapped root to grow domain"
      );
    }

    self.root = Some(root);
    Ok(())
  }

  /// Grow the domain to cover the cube of `halfwidth` around `p`.
  pub fn include_cube_in_domain(&mut self, p: P, halfwidth: f64) -> Result<(), TreeError> {
    for face in P::face_centers(p, halfwidth) {
      self.include_in_domain(face)?;
    }
    Ok(())
  }

  /// Materialize the node around `p` whose halfwidth is closest to
  /// `target_halfwidth`, growing the domain first.
  ///
  /// Returns the node and the number of levels still allowed below it.
  pub fn expand(&mut self, p: P, target_halfwidth: f64) -> Result<(&mut Node<P, D>, i32), TreeError> {
    self.include_in_domain(p)?;
    let max_depth = self.max_depth;
    let root = self.root.as_mut().ok_or(TreeError::Uninitialized)?;
    let root_halfwidth = root.halfwidth;

    let levels = (root_halfwidth / target_halfwidth).log2().round();
    let levels = if levels.is_nan() {
      0
    } else {
      levels.clamp(0.0, f64::from(max_depth)) as u32
    };

    let node = root.expand(p, levels).ok_or(TreeError::NonFinitePoint)?;
    let reached = (root_halfwidth / node.halfwidth).log2().round() as i32;
    Ok((node, max_depth - reached))
  }

  // ===========================================================================
  // Shape operations
  // ===========================================================================

  fn check_vertices<S: Shape<P, D> + ?Sized>(shape: &S) -> Result<(), TreeError> {
    if (0..shape.num_vertices()).all(|i| shape.vertex(i).is_finite()) {
      Ok(())
    } else {
      Err(TreeError::NonFinitePoint)
    }
  }

  /// Carve `shape` into the tree down to `max_depth`, growing the domain
  /// to cover its vertices first.
  ///
  /// Vertices are validated before anything changes, so an error leaves the
  /// tree as it was.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "tree::insert"))]
  pub fn insert<S: Shape<P, D> + ?Sized>(&mut self, shape: &mut S) -> Result<(), TreeError> {
    if self.root.is_none() {
      return Err(TreeError::Uninitialized);
    }
    Self::check_vertices(shape)?;
    for index in 0..shape.num_vertices() {
      self.include_in_domain(shape.vertex(index))?;
    }

    let depth = self.depth_budget();
    let simplify = self.simplify_on_insert;
    let root = self.root.as_mut().ok_or(TreeError::Uninitialized)?;
    if touches_root(&*shape, root) {
      root.insert(shape, depth, simplify);
    }
    Ok(())
  }

  /// Apply `shape` to the populated leaves it touches. Read-only on
  /// structure; no domain growth.
  pub fn find<S: Shape<P, D> + ?Sized>(&mut self, shape: &mut S) {
    if let Some(root) = self.root.as_mut() {
      if touches_root(&*shape, root) {
        root.find(shape);
      }
    }
  }

  /// Materialize nodes down to `max_depth` wherever `shape` reaches,
  /// without writing data.
  ///
  /// The new leaves carry no data until a later `insert` reaches them.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "tree::subdivide"))]
  pub fn subdivide<S: Shape<P, D> + ?Sized>(&mut self, shape: &S) -> Result<(), TreeError> {
    if self.root.is_none() {
      return Err(TreeError::Uninitialized);
    }
    Self::check_vertices(shape)?;
    for index in 0..shape.num_vertices() {
      self.include_in_domain(shape.vertex(index))?;
    }

    let depth = self.depth_budget();
    let root = self.root.as_mut().ok_or(TreeError::Uninitialized)?;
    if touches_root(&*shape, root) {
      root.subdivide(shape, depth);
    }
    Ok(())
  }

  /// Insert `p` as a single point, creating its max-depth leaf (with
  /// default data) if needed.
  pub fn insert_point(&mut self, p: P) -> Result<&mut D, TreeError>
  where
    D: Default,
  {
    self.include_in_domain(p)?;
    let depth = self.depth_budget();
    let root = self.root.as_mut().ok_or(TreeError::Uninitialized)?;
    let node = root.expand(p, depth).ok_or(TreeError::NonFinitePoint)?;
    Ok(node.data.get_or_insert_with(D::default))
  }

  // ===========================================================================
  // Queries
  // ===========================================================================

  /// Data of the deepest node containing `p`, if that node is populated.
  pub fn retrieve(&self, p: P) -> Option<&D> {
    self.retrieve_node(p)?.data.as_ref()
  }

  /// Deepest existing node containing `p`.
  pub fn retrieve_node(&self, p: P) -> Option<&Node<P, D>> {
    self.root.as_ref()?.retrieve(p)
  }

  pub fn retrieve_mut(&mut self, p: P) -> Option<&mut D> {
    self.root.as_mut()?.retrieve_mut(p)?.data.as_mut()
  }

  // ===========================================================================
  // Maintenance
  // ===========================================================================

  /// Collapse agreeing siblings bottom-up. True if anything changed.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "tree::simplify"))]
  pub fn simplify(&mut self) -> bool {
    let collapsed = self.root.as_mut().map_or(0, Node::simplify_recur);
    #[cfg(feature = "tracing")]
    tracing::debug!(collapsed, "simplified tree");
    collapsed > 0
  }

  /// Remove leaf data rejected by `keep` and prune emptied branches.
  ///
  /// Returns the number of payloads removed. The root itself is kept, even
  /// when nothing survives.
  pub fn filter<F: FnMut(&D) -> bool>(&mut self, mut keep: F) -> usize {
    self.root.as_mut().map_or(0, |root| root.filter(&mut keep))
  }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
