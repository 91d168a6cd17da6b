//! Geometry primitives shared by the welding, normal and validation passes.
//!
//! Points and vectors are `nalgebra::Point3<f64>` / `Vector3<f64>`; this module
//! adds the running bounding box and a few guarded operations on top of them.

use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box accumulated by including points.
///
/// A freshly created box is empty (`min = +inf`, `max = -inf`). Once at least one
/// point has been included, `min <= max` holds component-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl BoundBox {
    /// Create an empty box.
    pub fn new() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Build a box enclosing all `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bbox = Self::new();
        for p in points {
            bbox.include(p);
        }
        bbox
    }

    /// Grow the box so that it encloses `p`.
    #[inline]
    pub fn include(&mut self, p: &Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// True until a point has been included.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Vector from the minimum to the maximum corner (zero for an empty box).
    pub fn diagonal(&self) -> Vector3<f64> {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.max - self.min
        }
    }

    /// Length of the diagonal (zero for an empty box).
    #[inline]
    pub fn diagonal_length(&self) -> f64 {
        self.diagonal().norm()
    }

    /// Center of the box, or `None` if empty.
    pub fn center(&self) -> Option<Point3<f64>> {
        if self.is_empty() {
            None
        } else {
            Some(nalgebra::center(&self.min, &self.max))
        }
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }
}

impl Default for BoundBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize `v`, returning the zero vector when it has no usable length.
#[inline]
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_empty_box() {
        let bbox = BoundBox::new();
        assert!(bbox.is_empty());
        assert_eq!(bbox.diagonal(), Vector3::zeros());
        assert!(approx_eq(bbox.diagonal_length(), 0.0));
        assert!(bbox.center().is_none());
        assert!(!bbox.contains(&Point3::origin()));
    }

    #[test]
    fn test_include_and_diagonal() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, -1.0, 2.0),
            Point3::new(1.0, 3.0, -2.0),
        ];
        let bbox = BoundBox::from_points(&points);

        assert!(!bbox.is_empty());
        assert_eq!(bbox.min, Point3::new(0.0, -1.0, -2.0));
        assert_eq!(bbox.max, Point3::new(3.0, 3.0, 2.0));
        assert_eq!(bbox.diagonal(), Vector3::new(3.0, 4.0, 4.0));
        assert!(approx_eq(bbox.diagonal_length(), 41.0_f64.sqrt()));
        assert_eq!(bbox.center(), Some(Point3::new(1.5, 1.0, 0.0)));
    }

    #[test]
    fn test_single_point_box_is_degenerate() {
        let bbox = BoundBox::from_points(&[Point3::new(1.0, 2.0, 3.0)]);
        assert!(!bbox.is_empty());
        assert!(approx_eq(bbox.diagonal_length(), 0.0));
        assert!(bbox.contains(&Point3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bbox = BoundBox::from_points(&[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)]);
        assert!(bbox.contains(&Point3::new(1.0, 1.0, 1.0)));
        assert!(bbox.contains(&Point3::new(0.0, 0.5, 1.0)));
        assert!(!bbox.contains(&Point3::new(1.0 + 1e-9, 0.5, 0.5)));
        assert!(!bbox.contains(&Point3::new(0.5, -20.0, 0.5)));
    }

    #[test]
    fn test_normalize_or_zero() {
        let n = normalize_or_zero(&Vector3::new(0.0, 3.0, 4.0));
        assert!(approx_eq(n.norm(), 1.0));
        assert!(approx_eq(n.y, 0.6));

        assert_eq!(normalize_or_zero(&Vector3::zeros()), Vector3::zeros());
    }
}
