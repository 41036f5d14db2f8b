//! GPU storage-buffer layouts for the built scene.
//!
//! Mirrors of the node, triangle, and material types with the explicit
//! padding the compute shader's std430 layout expects. Every struct is a
//! multiple of 16 bytes and `Pod`, so the packed vectors can be uploaded
//! verbatim with a byte cast.

use bytemuck::{Pod, Zeroable};

use crate::bvh::{Bvh, Node};
use crate::material::Material;
use crate::triangle::Triangle;

/// GPU-compatible BVH node (48 bytes).
///
/// Field order matches the shader struct: bounds corners as vec3 + padding,
/// then the triangle range and child link. `child_index == -1` marks a leaf,
/// exactly as on the CPU side.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuBvhNode {
    /// Minimum corner of the node bounds.
    pub bounds_min: [f32; 3],
    /// Padding after the vec3 minimum.
    pub padding1: f32,
    /// Maximum corner of the node bounds.
    pub bounds_max: [f32; 3],
    /// Padding after the vec3 maximum.
    pub padding2: f32,
    /// Start of the node's triangle range.
    pub first_triangle: i32,
    /// Number of triangles in the range (stale on internal nodes).
    pub triangle_count: i32,
    /// First child index, or -1 for a leaf.
    pub child_index: i32,
    /// Padding keeping the struct a multiple of 16 bytes.
    pub padding3: i32,
}

impl From<&Node> for GpuBvhNode {
    fn from(node: &Node) -> Self {
        Self {
            bounds_min: node.bounds.min.to_array(),
            padding1: 0.0,
            bounds_max: node.bounds.max.to_array(),
            padding2: 0.0,
            first_triangle: node.first_triangle as i32,
            triangle_count: node.triangle_count as i32,
            child_index: node.child_index,
            padding3: 0,
        }
    }
}

/// GPU-compatible render triangle (80 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuTriangle {
    /// First vertex (xyz, w unused).
    pub a: [f32; 4],
    /// Second vertex (xyz, w unused).
    pub b: [f32; 4],
    /// Third vertex (xyz, w unused).
    pub c: [f32; 4],
    /// Texture coordinate at vertex `a`.
    pub a_uv: [f32; 2],
    /// Texture coordinate at vertex `b`.
    pub b_uv: [f32; 2],
    /// Texture coordinate at vertex `c`.
    pub c_uv: [f32; 2],
    /// Index into the material buffer.
    pub material_index: i32,
    /// Padding keeping the struct a multiple of 16 bytes.
    pub padding1: f32,
}

impl From<&Triangle> for GpuTriangle {
    fn from(tri: &Triangle) -> Self {
        Self {
            a: tri.a.extend(0.0).to_array(),
            b: tri.b.extend(0.0).to_array(),
            c: tri.c.extend(0.0).to_array(),
            a_uv: tri.a_uv.to_array(),
            b_uv: tri.b_uv.to_array(),
            c_uv: tri.c_uv.to_array(),
            material_index: tri.material_index as i32,
            padding1: 0.0,
        }
    }
}

/// GPU-compatible material record (80 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuMaterial {
    /// Base color (rgb, w unused).
    pub color: [f32; 4],
    /// Specular tint (rgb, w unused).
    pub specular_color: [f32; 4],
    /// Emission color (rgb, w unused).
    pub emission_color: [f32; 4],
    /// Texture table index, or -1 when untextured.
    pub texture_index: i32,
    /// Emission strength multiplier.
    pub emission_strength: f32,
    /// Surface smoothness.
    pub smoothness: f32,
    /// Probability a bounce is specular.
    pub specular_probability: f32,
    /// Checker cell size.
    pub checker_scale: f32,
    /// Index of refraction.
    pub refractive_index: f32,
    /// Material type code (see the `material` module constants).
    pub material_type: i32,
    /// Padding keeping the struct a multiple of 16 bytes.
    pub padding1: i32,
}

impl From<&Material> for GpuMaterial {
    fn from(material: &Material) -> Self {
        let mut gpu = GpuMaterial {
            color: [1.0, 1.0, 1.0, 0.0],
            specular_color: [0.0; 4],
            emission_color: [0.0; 4],
            texture_index: -1,
            emission_strength: 0.0,
            smoothness: 0.0,
            specular_probability: 0.0,
            checker_scale: 0.0,
            refractive_index: 1.0,
            material_type: material.type_code(),
            padding1: 0,
        };

        match *material {
            Material::Diffuse { color } => {
                gpu.color = color.extend(0.0).to_array();
            }
            Material::Specular {
                color,
                specular_color,
                smoothness,
                specular_probability,
            } => {
                gpu.color = color.extend(0.0).to_array();
                gpu.specular_color = specular_color.extend(0.0).to_array();
                gpu.smoothness = smoothness;
                gpu.specular_probability = specular_probability;
            }
            Material::Light { emission, strength } => {
                gpu.emission_color = emission.extend(0.0).to_array();
                gpu.emission_strength = strength;
            }
            Material::Checker { scale } => {
                gpu.checker_scale = scale;
            }
            Material::Glass {
                color,
                refractive_index,
            } => {
                gpu.color = color.extend(0.0).to_array();
                gpu.refractive_index = refractive_index;
            }
            Material::Textured {
                texture_index,
                color,
            } => {
                gpu.texture_index = texture_index;
                gpu.color = color.extend(0.0).to_array();
            }
        }

        gpu
    }
}

/// Pack the node array for upload, root first.
pub fn pack_nodes(bvh: &Bvh) -> Vec<GpuBvhNode> {
    bvh.nodes.iter().map(GpuBvhNode::from).collect()
}

/// Pack the (already permuted) render triangles for upload.
pub fn pack_triangles(triangles: &[Triangle]) -> Vec<GpuTriangle> {
    triangles.iter().map(GpuTriangle::from).collect()
}

/// Pack the material table for upload.
pub fn pack_materials(materials: &[Material]) -> Vec<GpuMaterial> {
    materials.iter().map(GpuMaterial::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MATERIAL_LIGHT;
    use glam::Vec3A;

    #[test]
    fn struct_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<GpuBvhNode>(), 48);
        assert_eq!(std::mem::size_of::<GpuTriangle>(), 80);
        assert_eq!(std::mem::size_of::<GpuMaterial>(), 80);
    }

    #[test]
    fn packed_nodes_preserve_ranges_and_leaf_sentinel() {
        let mut triangles = vec![
            Triangle::new(
                Vec3A::ZERO,
                Vec3A::new(1.0, 0.0, 0.0),
                Vec3A::new(0.0, 1.0, 0.0),
                0,
            ),
            Triangle::new(
                Vec3A::new(50.0, 0.0, 0.0),
                Vec3A::new(51.0, 0.0, 0.0),
                Vec3A::new(50.0, 1.0, 0.0),
                1,
            ),
        ];
        let mut summaries: Vec<crate::triangle::TriangleBounds> = triangles
            .iter()
            .enumerate()
            .map(|(i, t)| crate::triangle::TriangleBounds::of(t, i as u32))
            .collect();

        let bvh = Bvh::build(&mut summaries, &mut triangles).unwrap();
        let packed = pack_nodes(&bvh);
        assert_eq!(packed.len(), bvh.nodes.len());

        for (gpu, node) in packed.iter().zip(&bvh.nodes) {
            assert_eq!(gpu.child_index, node.child_index);
            assert_eq!(gpu.first_triangle, node.first_triangle as i32);
            assert_eq!(gpu.bounds_min, node.bounds.min.to_array());
        }
        // The root split, so its children are leaves with the sentinel.
        assert_eq!(packed[1].child_index, -1);
        assert_eq!(packed[2].child_index, -1);
    }

    #[test]
    fn material_fields_land_in_their_slots() {
        let light = Material::Light {
            emission: Vec3A::new(1.0, 0.9, 0.8),
            strength: 12.0,
        };
        let gpu = GpuMaterial::from(&light);
        assert_eq!(gpu.material_type, MATERIAL_LIGHT);
        assert_eq!(gpu.emission_color[..3], [1.0, 0.9, 0.8]);
        assert_eq!(gpu.emission_strength, 12.0);
        assert_eq!(gpu.texture_index, -1);
    }
}
