//! Leaf payloads stored at the populated leaves of a tree.
//!
//! The tree never interprets a payload beyond the [`LeafData`] contract:
//! merge two samples, compare classifications for simplification, and
//! encode/decode a fixed-width record.

use std::fmt::Debug;
use std::io::{self, Read, Write};

use crate::constants::NO_ROOM;

pub mod carve;

pub use carve::CarveData;

/// Contract every leaf payload must satisfy.
pub trait LeafData: Clone + Debug {
  /// Fold `other` into `self`.
  ///
  /// Must be commutative and associative, so that simplification can merge
  /// sibling leaves in any order.
  fn merge(&mut self, other: &Self);

  /// True once at least one sample has landed in this cell.
  fn has_samples(&self) -> bool;

  /// Interior/exterior classification of the cell.
  fn is_interior(&self) -> bool;

  /// Floorplan room this cell belongs to, or `NO_ROOM`.
  fn room_label(&self) -> i32 {
    NO_ROOM
  }

  /// Whether two sibling leaves may collapse into one.
  fn agrees_with(&self, other: &Self) -> bool {
    self.has_samples() == other.has_samples()
      && self.is_interior() == other.is_interior()
      && self.room_label() == other.room_label()
  }

  /// Encode as a fixed-width little-endian record.
  fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;

  /// Decode a record written by `write_to`.
  fn read_from<R: Read>(reader: &mut R) -> io::Result<Self>
  where
    Self: Sized;

  /// Range checks used by `verify`.
  fn validate(&self) -> Result<(), String> {
    Ok(())
  }
}
