//! Axis-aligned bounding boxes for BVH construction.
//!
//! Boxes start from an infinite empty sentinel so that merging geometry into
//! an untouched box is the identity operation.

use glam::Vec3A;

use crate::triangle::TriangleBounds;

/// Outward padding applied to finalized node bounds.
///
/// Guards against zero-thickness boxes on perfectly planar triangle sets,
/// which would otherwise cause missed intersections at axis-aligned geometry.
pub const EXPAND_EPSILON: f32 = 1e-4;

/// Axis-aligned bounding box defined by componentwise min/max corners.
///
/// Once any geometry has been merged in, `min <= max` holds componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the box.
    pub min: Vec3A,
    /// Maximum corner of the box.
    pub max: Vec3A,
}

impl Aabb {
    /// Empty box sentinel (`min = +inf`, `max = -inf`).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3A::INFINITY,
        max: Vec3A::NEG_INFINITY,
    };

    /// Create a box from explicit corners.
    pub fn new(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    /// Enlarge the box to contain a single point.
    pub fn grow_to_include_point(&mut self, point: Vec3A) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Enlarge the box to contain a triangle's bounds.
    pub fn grow_to_include(&mut self, tri: &TriangleBounds) {
        self.min = self.min.min(tri.min);
        self.max = self.max.max(tri.max);
    }

    /// Pad both corners outward by [`EXPAND_EPSILON`].
    ///
    /// Called once a node's bounds are finalized, before the node is stored.
    pub fn expand(&mut self) {
        self.min -= Vec3A::splat(EXPAND_EPSILON);
        self.max += Vec3A::splat(EXPAND_EPSILON);
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Vec3A {
        (self.min + self.max) / 2.0
    }

    /// Per-axis extents (`max - min` componentwise).
    pub fn size(&self) -> Vec3A {
        self.max - self.min
    }

    /// Extent along a single axis (0 = x, 1 = y, 2 = z).
    pub fn extent(&self, axis: usize) -> f32 {
        self.max[axis] - self.min[axis]
    }

    /// True if the point lies inside the box (inclusive bounds).
    pub fn contains_point(&self, point: Vec3A) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_merge_is_identity() {
        let mut a = Aabb::EMPTY;
        a.grow_to_include_point(Vec3A::new(1.0, 2.0, 3.0));
        assert_eq!(a.min, Vec3A::new(1.0, 2.0, 3.0));
        assert_eq!(a.max, Vec3A::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn grows_to_include_points_and_triangles() {
        let mut a = Aabb::EMPTY;
        a.grow_to_include_point(Vec3A::new(-1.0, 0.0, 2.0));
        a.grow_to_include_point(Vec3A::new(3.0, -2.0, 1.0));
        assert_eq!(a.min, Vec3A::new(-1.0, -2.0, 1.0));
        assert_eq!(a.max, Vec3A::new(3.0, 0.0, 2.0));

        let tri = TriangleBounds::new(
            Vec3A::new(5.0, 0.0, 0.0),
            Vec3A::new(6.0, 1.0, 0.0),
            Vec3A::new(5.5, 0.0, -4.0),
            0,
        );
        a.grow_to_include(&tri);
        assert_eq!(a.max.x, 6.0);
        assert_eq!(a.min.z, -4.0);
    }

    #[test]
    fn size_uses_per_axis_extents() {
        let a = Aabb::new(Vec3A::new(0.0, 1.0, 2.0), Vec3A::new(4.0, 3.0, 9.0));
        assert_eq!(a.size(), Vec3A::new(4.0, 2.0, 7.0));
        assert_eq!(a.extent(0), 4.0);
        assert_eq!(a.extent(1), 2.0);
        assert_eq!(a.extent(2), 7.0);
        assert_eq!(a.center(), Vec3A::new(2.0, 2.0, 5.5));
    }

    #[test]
    fn expand_pads_both_corners() {
        let mut a = Aabb::new(Vec3A::ZERO, Vec3A::ONE);
        a.expand();
        assert_eq!(a.min, Vec3A::splat(-EXPAND_EPSILON));
        assert_eq!(a.max, Vec3A::ONE + Vec3A::splat(EXPAND_EPSILON));
    }
}
