//! Line segments: the slab test and the segment carving shapes.

use crate::data::{CarveData, LeafData};
use crate::space::Space;

use super::Shape;

/// A bounded segment from `orig` to `end`.
///
/// The reciprocal direction is computed once so that repeated box tests
/// during traversal only multiply. Axis-parallel segments produce infinite
/// reciprocals, which the slab test handles explicitly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment<P> {
  orig: P,
  end: P,
  invdir: P,
}

impl<P: Space> LineSegment<P> {
  pub fn new(orig: P, end: P) -> Self {
    Self {
      orig,
      end,
      invdir: (end - orig).recip(),
    }
  }

  #[inline]
  pub fn orig(&self) -> P {
    self.orig
  }

  #[inline]
  pub fn end(&self) -> P {
    self.end
  }

  /// Point at parameter `t` (0 at `orig`, 1 at `end`).
  #[inline]
  pub fn point_at(&self, t: f64) -> P {
    self.orig + (self.end - self.orig) * t
  }

  /// Parametric interval of the segment inside the closed box `[min, max]`.
  ///
  /// Returns `(tmin, tmax)` clamped to `[0, 1]`, or `None` when the segment
  /// misses the box.
  pub fn clip(&self, min: P, max: P) -> Option<(f64, f64)> {
    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;

    for axis in 0..P::DIM {
      let o = self.orig.component(axis);
      let lo = min.component(axis);
      let hi = max.component(axis);
      let inv = self.invdir.component(axis);

      if inv.is_infinite() {
        // parallel to this slab
        if o < lo || o > hi {
          return None;
        }
        continue;
      }

      let (near, far) = if inv >= 0.0 { (lo, hi) } else { (hi, lo) };
      let t_near = (near - o) * inv;
      let t_far = (far - o) * inv;
      tmin = tmin.max(t_near);
      tmax = tmax.min(t_far);
    }

    if tmin > tmax || tmin > 1.0 || tmax < 0.0 {
      return None;
    }
    Some((tmin.max(0.0), tmax.min(1.0)))
  }

  #[inline]
  pub fn intersects_box(&self, min: P, max: P) -> bool {
    self.clip(min, max).is_some()
  }

  /// Clip against the cube at `center` with the given halfwidth.
  #[inline]
  pub fn clip_cube(&self, center: P, halfwidth: f64) -> Option<(f64, f64)> {
    let extent = P::splat(halfwidth);
    self.clip(center - extent, center + extent)
  }
}

impl<P: Space, D: LeafData + Default> Shape<P, D> for LineSegment<P> {
  fn num_vertices(&self) -> usize {
    2
  }

  fn vertex(&self, index: usize) -> P {
    if index == 0 {
      self.orig
    } else {
      self.end
    }
  }

  fn intersects(&self, center: P, halfwidth: f64) -> bool {
    self.clip_cube(center, halfwidth).is_some()
  }

  fn apply_to_leaf(&mut self, _center: P, _halfwidth: f64, existing: Option<D>) -> D {
    existing.unwrap_or_default()
  }
}

/// Free-space carving along a scan ray.
///
/// Every leaf the ray from the sensor to the scan point passes through
/// receives a sample with probability `prob` and is marked carved.
#[derive(Clone, Debug)]
pub struct CarveSegment<P> {
  segment: LineSegment<P>,
  prob: f64,
  touched: usize,
}

impl<P: Space> CarveSegment<P> {
  pub fn new(sensor: P, point: P, prob: f64) -> Self {
    Self {
      segment: LineSegment::new(sensor, point),
      prob,
      touched: 0,
    }
  }

  #[inline]
  pub fn segment(&self) -> &LineSegment<P> {
    &self.segment
  }

  /// Leaves updated so far.
  #[inline]
  pub fn leaves_touched(&self) -> usize {
    self.touched
  }
}

impl<P: Space> Shape<P, CarveData> for CarveSegment<P> {
  fn num_vertices(&self) -> usize {
    2
  }

  fn vertex(&self, index: usize) -> P {
    if index == 0 {
      self.segment.orig()
    } else {
      self.segment.end()
    }
  }

  fn intersects(&self, center: P, halfwidth: f64) -> bool {
    self.segment.clip_cube(center, halfwidth).is_some()
  }

  fn apply_to_leaf(&mut self, _center: P, _halfwidth: f64, existing: Option<CarveData>) -> CarveData {
    let mut data = existing.unwrap_or_default();
    data.add_sample(self.prob, 0.0, 0.0);
    data.mark_carved();
    self.touched += 1;
    data
  }
}

#[cfg(test)]
#[path = "segment_test.rs"]
mod segment_test;
