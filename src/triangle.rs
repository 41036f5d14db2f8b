//! Triangle primitives for scene assembly and BVH construction.
//!
//! Two representations exist side by side: the full-precision render
//! triangle uploaded to the GPU, and a lightweight geometric summary the
//! builder partitions on. The two arrays are permuted in lockstep.

use glam::{Vec2, Vec3A};

/// Full-precision render triangle.
///
/// Pure payload from the builder's point of view: it is never inspected
/// during partitioning, only swapped alongside its summary.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex position.
    pub a: Vec3A,
    /// Second vertex position.
    pub b: Vec3A,
    /// Third vertex position.
    pub c: Vec3A,
    /// Texture coordinate at vertex `a`.
    pub a_uv: Vec2,
    /// Texture coordinate at vertex `b`.
    pub b_uv: Vec2,
    /// Texture coordinate at vertex `c`.
    pub c_uv: Vec2,
    /// Index into the scene's material table.
    pub material_index: u32,
}

impl Triangle {
    /// Create a triangle without texture coordinates.
    pub fn new(a: Vec3A, b: Vec3A, c: Vec3A, material_index: u32) -> Self {
        Self {
            a,
            b,
            c,
            a_uv: Vec2::ZERO,
            b_uv: Vec2::ZERO,
            c_uv: Vec2::ZERO,
            material_index,
        }
    }
}

/// Geometric digest of a triangle used for partitioning decisions.
///
/// Computed once from the three vertices and immutable afterwards, except
/// for its position within the shared array.
#[derive(Debug, Clone, Copy)]
pub struct TriangleBounds {
    /// Componentwise minimum of the three vertices.
    pub min: Vec3A,
    /// Componentwise maximum of the three vertices.
    pub max: Vec3A,
    /// Arithmetic mean of the three vertices.
    pub center: Vec3A,
    /// Position of the triangle in the original input order.
    pub index: u32,
}

impl TriangleBounds {
    /// Summarize a triangle given by its three vertices.
    pub fn new(a: Vec3A, b: Vec3A, c: Vec3A, index: u32) -> Self {
        Self {
            min: a.min(b).min(c),
            max: a.max(b).max(c),
            center: (a + b + c) / 3.0,
            index,
        }
    }

    /// Summarize an existing render triangle.
    pub fn of(tri: &Triangle, index: u32) -> Self {
        Self::new(tri.a, tri.b, tri.c, index)
    }

    /// True if every stored coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.center.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_takes_vertex_extrema_and_mean() {
        let s = TriangleBounds::new(
            Vec3A::new(0.0, 0.0, 0.0),
            Vec3A::new(3.0, 0.0, -1.0),
            Vec3A::new(0.0, 3.0, 2.0),
            7,
        );
        assert_eq!(s.min, Vec3A::new(0.0, 0.0, -1.0));
        assert_eq!(s.max, Vec3A::new(3.0, 3.0, 2.0));
        assert_eq!(s.center, Vec3A::new(1.0, 1.0, 1.0 / 3.0));
        assert_eq!(s.index, 7);
    }

    #[test]
    fn non_finite_vertices_are_detected() {
        let s = TriangleBounds::new(
            Vec3A::new(f32::NAN, 0.0, 0.0),
            Vec3A::ZERO,
            Vec3A::ONE,
            0,
        );
        assert!(!s.is_finite());
    }
}
