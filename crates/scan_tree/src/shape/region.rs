use smallvec::SmallVec;

use crate::data::CarveData;
use crate::space::Space;

use super::{box_overlaps_cube, Shape};

/// Axis-aligned box that tags overlapped leaves with a floorplan room.
///
/// Meant for `Tree::find`, which labels existing leaves without growing the
/// tree. Inserting it labels (and creates) every cell in the box.
#[derive(Clone, Debug)]
pub struct RoomRegion<P> {
  min: P,
  max: P,
  room: i32,
  labelled: usize,
}

impl<P: Space> RoomRegion<P> {
  pub fn new(min: P, max: P, room: i32) -> Self {
    Self {
      min,
      max,
      room,
      labelled: 0,
    }
  }

  #[inline]
  pub fn room(&self) -> i32 {
    self.room
  }

  /// Leaves labelled so far.
  #[inline]
  pub fn labelled(&self) -> usize {
    self.labelled
  }

  fn corners(&self) -> SmallVec<[P; 8]> {
    let center = (self.min + self.max) * 0.5;
    let extent = (self.max - self.min) * 0.5;
    (0..P::CHILDREN)
      .map(|index| center + P::relative_child_pos(index) * extent)
      .collect()
  }
}

impl<P: Space> Shape<P, CarveData> for RoomRegion<P> {
  fn num_vertices(&self) -> usize {
    P::CHILDREN
  }

  fn vertex(&self, index: usize) -> P {
    self.corners().get(index).copied().unwrap_or(self.min)
  }

  fn intersects(&self, center: P, halfwidth: f64) -> bool {
    box_overlaps_cube(self.min, self.max, center, halfwidth)
  }

  fn apply_to_leaf(&mut self, _center: P, _halfwidth: f64, existing: Option<CarveData>) -> CarveData {
    let mut data = existing.unwrap_or_default();
    data.set_room(self.room);
    self.labelled += 1;
    data
  }
}
