//! CarveData - probabilistic carving statistics for one cell.
//!
//! Each scan ray that passes through (or ends in) a cell contributes a
//! sample: the probability that the cell is interior (free space), plus
//! corner and planarity estimates. Running sums let the cell report a mean
//! and a variance without storing individual samples.

use std::io::{self, Read, Write};

use crate::codec::{read_f64, read_i32, read_u32, read_u8, write_f64, write_i32, write_u32, write_u8};
use crate::constants::NO_ROOM;

use super::LeafData;

/// Carving statistics stored at an octree leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct CarveData {
  /// Number of observed samples.
  count: u32,
  /// Sum of interior-probability samples.
  prob_sum: f64,
  /// Sum of squared probability samples.
  prob_sum_sq: f64,
  /// Sum of corner estimates.
  corner_sum: f64,
  /// Sum of planarity estimates.
  planar_sum: f64,
  /// Floorplan room index, `NO_ROOM` if none.
  fp_room: i32,
  /// Set when a deterministic carve touched this cell.
  is_carved: bool,
}

impl CarveData {
  /// Empty data with no samples and no room.
  pub fn new() -> Self {
    Self {
      count: 0,
      prob_sum: 0.0,
      prob_sum_sq: 0.0,
      corner_sum: 0.0,
      planar_sum: 0.0,
      fp_room: NO_ROOM,
      is_carved: false,
    }
  }

  /// Data holding a single sample.
  pub fn from_sample(prob: f64, corner: f64, planar: f64) -> Self {
    let mut data = Self::new();
    data.add_sample(prob, corner, planar);
    data
  }

  /// Record one observation.
  pub fn add_sample(&mut self, prob: f64, corner: f64, planar: f64) {
    self.count = self.count.saturating_add(1);
    self.prob_sum += prob;
    self.prob_sum_sq += prob * prob;
    self.corner_sum += corner;
    self.planar_sum += planar;
  }

  #[inline]
  pub fn count(&self) -> u32 {
    self.count
  }

  /// Mean interior probability; 0.5 (undecided) without samples.
  pub fn probability(&self) -> f64 {
    if self.count == 0 {
      return 0.5;
    }
    self.prob_sum / self.count as f64
  }

  /// Variance of the mean probability estimate.
  pub fn uncertainty(&self) -> f64 {
    if self.count == 0 {
      return 0.0;
    }
    let n = self.count as f64;
    let mean = self.prob_sum / n;
    let variance = (self.prob_sum_sq / n - mean * mean).max(0.0);
    variance / n
  }

  /// Mean corner estimate.
  pub fn corner_coefficient(&self) -> f64 {
    if self.count == 0 {
      return 0.0;
    }
    self.corner_sum / self.count as f64
  }

  /// Mean planarity estimate.
  pub fn planarity(&self) -> f64 {
    if self.count == 0 {
      return 0.0;
    }
    self.planar_sum / self.count as f64
  }

  #[inline]
  pub fn room(&self) -> i32 {
    self.fp_room
  }

  #[inline]
  pub fn set_room(&mut self, room: i32) {
    self.fp_room = room;
  }

  #[inline]
  pub fn is_carved(&self) -> bool {
    self.is_carved
  }

  #[inline]
  pub fn mark_carved(&mut self) {
    self.is_carved = true;
  }

  /// Force the opposite classification, keeping a single unit sample.
  ///
  /// Corner and planarity means survive the flip.
  pub fn flip(&mut self) {
    let prob = if self.is_interior() { 0.0 } else { 1.0 };
    let corner = self.corner_coefficient();
    let planar = self.planarity();
    self.count = 1;
    self.prob_sum = prob;
    self.prob_sum_sq = prob * prob;
    self.corner_sum = corner;
    self.planar_sum = planar;
  }
}

impl Default for CarveData {
  fn default() -> Self {
    Self::new()
  }
}

impl LeafData for CarveData {
  fn merge(&mut self, other: &Self) {
    self.count = self.count.saturating_add(other.count);
    self.prob_sum += other.prob_sum;
    self.prob_sum_sq += other.prob_sum_sq;
    self.corner_sum += other.corner_sum;
    self.planar_sum += other.planar_sum;
    // valid labels win over NO_ROOM
    self.fp_room = self.fp_room.max(other.fp_room);
    self.is_carved |= other.is_carved;
  }

  #[inline]
  fn has_samples(&self) -> bool {
    self.count > 0
  }

  #[inline]
  fn is_interior(&self) -> bool {
    self.probability() > 0.5
  }

  #[inline]
  fn room_label(&self) -> i32 {
    self.fp_room
  }

  fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
    write_u32(writer, self.count)?;
    write_f64(writer, self.prob_sum)?;
    write_f64(writer, self.prob_sum_sq)?;
    write_f64(writer, self.corner_sum)?;
    write_f64(writer, self.planar_sum)?;
    write_i32(writer, self.fp_room)?;
    write_u8(writer, u8::from(self.is_carved))
  }

  fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
    let count = read_u32(reader)?;
    let prob_sum = read_f64(reader)?;
    let prob_sum_sq = read_f64(reader)?;
    let corner_sum = read_f64(reader)?;
    let planar_sum = read_f64(reader)?;
    let fp_room = read_i32(reader)?;
    let is_carved = match read_u8(reader)? {
      0 => false,
      1 => true,
      other => {
        return Err(io::Error::new(
          io::ErrorKind::InvalidData,
          format!("invalid carved flag {other}"),
        ))
      }
    };
    Ok(Self {
      count,
      prob_sum,
      prob_sum_sq,
      corner_sum,
      planar_sum,
      fp_room,
      is_carved,
    })
  }

  fn validate(&self) -> Result<(), String> {
    let sums = [self.prob_sum, self.prob_sum_sq, self.corner_sum, self.planar_sum];
    if sums.iter().any(|s| !s.is_finite()) {
      return Err("non-finite running sum".to_string());
    }
    if self.prob_sum_sq < 0.0 {
      return Err(format!("negative squared sum {}", self.prob_sum_sq));
    }
    if self.count > 0 {
      let prob = self.probability();
      if !(0.0..=1.0).contains(&prob) {
        return Err(format!("mean probability {prob} outside [0, 1]"));
      }
    } else if self.prob_sum != 0.0 {
      return Err("probability mass without samples".to_string());
    }
    if self.fp_room < NO_ROOM {
      return Err(format!("room label {} below {}", self.fp_room, NO_ROOM));
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "carve_test.rs"]
mod carve_test;
