//! Binary tree files.
//!
//! ```text
//! header:  magic [u8; 8] | max_depth i32 | node_count u32
//! node:    center f64 x DIM | halfwidth f64
//!          | has_data u8 [payload]
//!          | (child_exists u8 [node]) x CHILDREN
//! ```
//!
//! All numbers are little-endian; nodes are written depth-first in
//! pre-order with children in index order.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::codec::{read_f64, read_flag, read_i32, read_u32, write_f64, write_flag, write_i32, write_u32};
use crate::constants::{GEOMETRY_TOLERANCE, MAGIC_LEN, MAX_TREE_DEPTH};
use crate::data::LeafData;
use crate::error::TreeError;
use crate::node::Node;
use crate::space::Space;
use crate::tree::Tree;

impl<P: Space, D: LeafData> Node<P, D> {
  /// Write this subtree as a pre-order node record.
  pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
    self.center.write_le(writer)?;
    write_f64(writer, self.halfwidth)?;

    write_flag(writer, self.data.is_some())?;
    if let Some(data) = &self.data {
      data.write_to(writer)?;
    }

    for slot in &self.children {
      write_flag(writer, slot.is_some())?;
      if let Some(child) = slot {
        child.write_to(writer)?;
      }
    }
    Ok(())
  }

  /// Read a node record nested at most `depth` levels deep, counting the
  /// nodes read into `count`.
  ///
  /// A child must be exactly half its parent (`parent_halfwidth`), checked
  /// before its own children are read.
  pub(crate) fn read_from<R: Read>(
    reader: &mut R,
    depth: i32,
    parent_halfwidth: Option<f64>,
    count: &mut usize,
  ) -> Result<Self, TreeError> {
    let center = P::read_le(reader).map_err(TreeError::from_read)?;
    let halfwidth = read_f64(reader).map_err(TreeError::from_read)?;
    if !(halfwidth.is_finite() && halfwidth > 0.0) {
      return Err(TreeError::Corrupt(format!("invalid halfwidth {halfwidth}")));
    }
    if let Some(parent) = parent_halfwidth {
      if (halfwidth - parent * 0.5).abs() > GEOMETRY_TOLERANCE * parent {
        return Err(TreeError::Corrupt(format!(
          "child halfwidth {halfwidth} is not half of {parent}"
        )));
      }
    }
    let mut node = Node::new(center, halfwidth);
    *count += 1;

    if read_flag(reader)? {
      node.data = Some(D::read_from(reader).map_err(TreeError::from_read)?);
    }

    for index in 0..P::CHILDREN {
      if !read_flag(reader)? {
        continue;
      }
      if depth <= 0 {
        return Err(TreeError::Corrupt("node nesting exceeds max depth".to_string()));
      }
      let child = Node::read_from(reader, depth - 1, Some(halfwidth), count)?;
      node.children[index] = Some(Box::new(child));
    }
    Ok(node)
  }
}

impl<P: Space, D: LeafData> Tree<P, D> {
  /// Write the header and all nodes. An uninitialized tree has nothing to
  /// write and is an error.
  pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), TreeError> {
    let root = self.root().ok_or(TreeError::Uninitialized)?;
    let node_count = u32::try_from(root.num_nodes())
      .map_err(|_| TreeError::Corrupt("node count exceeds header range".to_string()))?;

    writer.write_all(&P::MAGIC)?;
    write_i32(writer, self.max_depth())?;
    write_u32(writer, node_count)?;
    root.write_to(writer)?;
    Ok(())
  }

  /// Read a complete tree. Nothing is returned unless the whole stream
  /// parsed and the node count matched the header.
  pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, TreeError> {
    let mut magic = [0u8; MAGIC_LEN];
    reader.read_exact(&mut magic).map_err(TreeError::from_read)?;
    if magic != P::MAGIC {
      return Err(TreeError::BadMagic);
    }

    let max_depth = read_i32(reader).map_err(TreeError::from_read)?;
    if !(0..=MAX_TREE_DEPTH).contains(&max_depth) {
      return Err(TreeError::Corrupt(format!("max depth {max_depth} out of range")));
    }
    let expected = read_u32(reader).map_err(TreeError::from_read)?;

    let mut found = 0;
    let root = Node::read_from(reader, max_depth, None, &mut found)?;
    if found != expected as usize {
      return Err(TreeError::NodeCountMismatch { expected, found });
    }

    let mut tree = Tree::new();
    tree.install(root, max_depth);
    Ok(tree)
  }

  /// Write the tree to a file.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "tree::serialize"))]
  pub fn serialize(&self, path: &Path) -> Result<(), TreeError> {
    let mut writer = BufWriter::new(File::create(path)?);
    self.write_to(&mut writer)?;
    writer.flush()?;
    Ok(())
  }

  /// Replace this tree with the one stored in a file.
  ///
  /// On failure the tree is left exactly as it was.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "tree::parse"))]
  pub fn parse(&mut self, path: &Path) -> Result<(), TreeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let parsed = match Self::read_from(&mut reader) {
      Ok(parsed) => parsed,
      Err(err) => {
        #[cfg(feature = "tracing")]
        tracing::warn!(path = %path.display(), error = %err, "failed to parse tree file");
        return Err(err);
      }
    };
    let simplify_on_insert = self.simplify_on_insert();
    *self = parsed;
    self.set_simplify_on_insert(simplify_on_insert);
    Ok(())
  }
}

#[cfg(test)]
#[path = "serialize_test.rs"]
mod serialize_test;
