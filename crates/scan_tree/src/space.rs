//! Space - the dimension-specific half of the tree.
//!
//! One `Node`/`Tree` implementation serves both the planar quadtree and the
//! volumetric octree. Everything that depends on the number of axes lives
//! behind the [`Space`] trait, implemented for `DVec2` and `DVec3`.
//!
//! # Child Numbering
//!
//! Child indices are fixed and derived only from the sign of the offset
//! from the parent's center (zero counts as positive):
//!
//! ```text
//!         y                           y
//!         ^                           ^
//!    1    |    0                 5    |    4
//!  -------+------> x  (z >= 0)  -------+------> x  (z < 0)
//!    2    |    3                 6    |    7
//! ```
//!
//! The quadtree uses the top four.

use std::fmt::Debug;
use std::io::{self, Read, Write};
use std::ops::{Add, Mul, Sub};

use glam::{DVec2, DVec3};
use smallvec::SmallVec;

use crate::codec::{read_f64, write_f64};
use crate::constants::{OCTFILE_MAGIC, OCT_CHILDREN, QUADFILE_MAGIC, QUAD_CHILDREN, MAGIC_LEN};

/// Unit offsets of each child from its parent's center, in index order.
const OCTANT_OFFSETS: [[f64; 3]; OCT_CHILDREN] = [
  [1.0, 1.0, 1.0],
  [-1.0, 1.0, 1.0],
  [-1.0, -1.0, 1.0],
  [1.0, -1.0, 1.0],
  [1.0, 1.0, -1.0],
  [-1.0, 1.0, -1.0],
  [-1.0, -1.0, -1.0],
  [1.0, -1.0, -1.0],
];

/// A point type the tree can index.
pub trait Space:
  Copy
  + Debug
  + PartialEq
  + Add<Output = Self>
  + Sub<Output = Self>
  + Mul<f64, Output = Self>
  + Mul<Self, Output = Self>
{
  /// Number of axes.
  const DIM: usize;
  /// Children per node, `2^DIM`.
  const CHILDREN: usize;
  /// File tag written ahead of a serialized tree.
  const MAGIC: [u8; MAGIC_LEN];
  /// The origin.
  const ZERO: Self;

  /// Child index selected by the signs of `offset` (offset = p - center).
  fn octant(offset: Self) -> usize;

  /// Unit offset direction of child `index`; zero for an invalid index.
  fn relative_child_pos(index: usize) -> Self;

  /// Coordinate along `axis`.
  fn component(self, axis: usize) -> f64;

  /// Build a point from exactly `DIM` coordinates.
  fn from_components(components: &[f64]) -> Option<Self>;

  /// Largest absolute coordinate (the L-infinity norm).
  fn max_abs(self) -> f64;

  /// True when no coordinate is NaN or infinite.
  fn is_finite(self) -> bool;

  /// Unit vector along `axis`.
  fn axis_unit(axis: usize) -> Self;

  /// Component-wise reciprocal, following IEEE rules for zeros.
  fn recip(self) -> Self;

  /// A point with every coordinate set to `value`.
  fn splat(value: f64) -> Self;

  /// Squared Euclidean length.
  fn length_squared(self) -> f64;

  /// Centers of the `2 * DIM` faces of the cube at `center`.
  fn face_centers(center: Self, halfwidth: f64) -> SmallVec<[Self; 6]> {
    (0..Self::DIM)
      .flat_map(|axis| {
        let step = Self::axis_unit(axis) * halfwidth;
        [center + step, center - step]
      })
      .collect()
  }

  /// The `2^DIM` corners of the cube at `center`, in child index order.
  fn corners(center: Self, halfwidth: f64) -> SmallVec<[Self; 8]> {
    (0..Self::CHILDREN)
      .map(|index| center + Self::relative_child_pos(index) * halfwidth)
      .collect()
  }

  /// Write the coordinates as little-endian doubles.
  fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()> {
    for axis in 0..Self::DIM {
      write_f64(writer, self.component(axis))?;
    }
    Ok(())
  }

  /// Read `DIM` little-endian doubles.
  fn read_le<R: Read>(reader: &mut R) -> io::Result<Self> {
    let mut components = [0.0; 3];
    for value in components.iter_mut().take(Self::DIM) {
      *value = read_f64(reader)?;
    }
    Self::from_components(&components[..Self::DIM])
      .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "wrong coordinate count"))
  }
}

impl Space for DVec2 {
  const DIM: usize = 2;
  const CHILDREN: usize = QUAD_CHILDREN;
  const MAGIC: [u8; MAGIC_LEN] = QUADFILE_MAGIC;
  const ZERO: Self = DVec2::ZERO;

  #[inline]
  fn octant(offset: Self) -> usize {
    match (offset.x >= 0.0, offset.y >= 0.0) {
      (true, true) => 0,
      (false, true) => 1,
      (false, false) => 2,
      (true, false) => 3,
    }
  }

  #[inline]
  fn relative_child_pos(index: usize) -> Self {
    if index >= QUAD_CHILDREN {
      return DVec2::ZERO;
    }
    let [x, y, _] = OCTANT_OFFSETS[index];
    DVec2::new(x, y)
  }

  #[inline]
  fn component(self, axis: usize) -> f64 {
    self[axis]
  }

  fn from_components(components: &[f64]) -> Option<Self> {
    match components {
      [x, y] => Some(DVec2::new(*x, *y)),
      _ => None,
    }
  }

  #[inline]
  fn max_abs(self) -> f64 {
    self.abs().max_element()
  }

  #[inline]
  fn is_finite(self) -> bool {
    DVec2::is_finite(self)
  }

  #[inline]
  fn axis_unit(axis: usize) -> Self {
    match axis {
      0 => DVec2::X,
      1 => DVec2::Y,
      _ => DVec2::ZERO,
    }
  }

  #[inline]
  fn recip(self) -> Self {
    DVec2::recip(self)
  }

  #[inline]
  fn splat(value: f64) -> Self {
    DVec2::splat(value)
  }

  #[inline]
  fn length_squared(self) -> f64 {
    DVec2::length_squared(self)
  }
}

impl Space for DVec3 {
  const DIM: usize = 3;
  const CHILDREN: usize = OCT_CHILDREN;
  const MAGIC: [u8; MAGIC_LEN] = OCTFILE_MAGIC;
  const ZERO: Self = DVec3::ZERO;

  #[inline]
  fn octant(offset: Self) -> usize {
    let quadrant = DVec2::octant(offset.truncate());
    if offset.z >= 0.0 {
      quadrant
    } else {
      quadrant + QUAD_CHILDREN
    }
  }

  #[inline]
  fn relative_child_pos(index: usize) -> Self {
    OCTANT_OFFSETS
      .get(index)
      .map_or(DVec3::ZERO, |offset| DVec3::from_array(*offset))
  }

  #[inline]
  fn component(self, axis: usize) -> f64 {
    self[axis]
  }

  fn from_components(components: &[f64]) -> Option<Self> {
    match components {
      [x, y, z] => Some(DVec3::new(*x, *y, *z)),
      _ => None,
    }
  }

  #[inline]
  fn max_abs(self) -> f64 {
    self.abs().max_element()
  }

  #[inline]
  fn is_finite(self) -> bool {
    DVec3::is_finite(self)
  }

  #[inline]
  fn axis_unit(axis: usize) -> Self {
    match axis {
      0 => DVec3::X,
      1 => DVec3::Y,
      2 => DVec3::Z,
      _ => DVec3::ZERO,
    }
  }

  #[inline]
  fn recip(self) -> Self {
    DVec3::recip(self)
  }

  #[inline]
  fn splat(value: f64) -> Self {
    DVec3::splat(value)
  }

  #[inline]
  fn length_squared(self) -> f64 {
    DVec3::length_squared(self)
  }
}

#[cfg(test)]
#[path = "space_test.rs"]
mod space_test;
