use crate::data::CarveData;
use crate::space::Space;

use super::Shape;

/// One scan sample at a point.
///
/// A sample lands in exactly one leaf. On a face shared by two cells the
/// octant rule picks the cell on the positive side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSample<P> {
  pub point: P,
  pub prob: f64,
  pub corner: f64,
  pub planar: f64,
}

impl<P: Space> PointSample<P> {
  pub fn new(point: P, prob: f64, corner: f64, planar: f64) -> Self {
    Self {
      point,
      prob,
      corner,
      planar,
    }
  }
}

impl<P: Space> Shape<P, CarveData> for PointSample<P> {
  fn num_vertices(&self) -> usize {
    1
  }

  fn vertex(&self, _index: usize) -> P {
    self.point
  }

  fn intersects(&self, center: P, halfwidth: f64) -> bool {
    (self.point - center).max_abs() <= halfwidth
  }

  fn point(&self) -> Option<P> {
    Some(self.point)
  }

  fn apply_to_leaf(&mut self, _center: P, _halfwidth: f64, existing: Option<CarveData>) -> CarveData {
    let mut data = existing.unwrap_or_default();
    data.add_sample(self.prob, self.corner, self.planar);
    data
  }
}
