//! Scene assembly for the path tracer.
//!
//! Loads OBJ/MTL model data, optionally synthesizes bounding geometry (an
//! enclosure box with an emissive ceiling panel, or a sky light plane), and
//! hands the assembled triangle arrays to the BVH builder.
//!
//! The render triangles and their geometric summaries are parallel arrays
//! owned together by [`Scene`]; every mutation goes through one entry point
//! so the two can never drift out of sync.

use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3A};
use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::aabb::Aabb;
use crate::bvh::{Bvh, BvhError};
use crate::material::{Color, Material};
use crate::triangle::{Triangle, TriangleBounds};

/// Corner indices of the twelve wall triangles of an axis-aligned box.
const WALL_TRIANGLES: [[usize; 3]; 12] = [
    [0, 3, 1],
    [0, 2, 3],
    [0, 5, 4],
    [0, 1, 5],
    [0, 6, 2],
    [0, 4, 6],
    [7, 1, 3],
    [7, 5, 1],
    [7, 2, 6],
    [7, 3, 2],
    [7, 4, 5],
    [7, 6, 4],
];

/// Corner indices of a double-sided quad (both windings, so the panel emits
/// regardless of which side a ray approaches from).
const PANEL_TRIANGLES: [[usize; 3]; 4] = [[0, 3, 1], [0, 2, 3], [0, 1, 3], [0, 3, 2]];

/// Errors produced while assembling a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The OBJ model (or its material library) could not be loaded.
    #[error("failed to load OBJ model: {0}")]
    Load(#[from] tobj::LoadError),

    /// The model parsed but contained no triangles.
    #[error("model contains no triangles")]
    NoGeometry,
}

/// Assembled scene: triangle arrays, materials, and texture references.
///
/// `triangles` and `triangle_bounds` always have the same length and the
/// entry at each position describes the same physical triangle. The BVH
/// builder permutes both in lockstep.
#[derive(Debug)]
pub struct Scene {
    /// Full-precision render triangles, uploaded to the GPU after build.
    pub triangles: Vec<Triangle>,
    /// Per-triangle geometric summaries consumed by the BVH builder.
    pub triangle_bounds: Vec<TriangleBounds>,
    /// Material table; slot 0 is the default white diffuse.
    pub materials: Vec<Material>,
    /// Texture files referenced by `map_Kd` entries, in index order.
    pub texture_paths: Vec<PathBuf>,
}

impl Scene {
    /// Empty scene with the reserved default material.
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
            triangle_bounds: Vec::new(),
            materials: vec![Material::default()],
            texture_paths: Vec::new(),
        }
    }

    /// Load a triangulated OBJ model and its material library.
    ///
    /// Faces without a material reference use the default material at
    /// slot 0; MTL entries are appended after it in file order. `map_Kd`
    /// references become [`Material::Textured`] entries pointing into
    /// [`Scene::texture_paths`].
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let (models, material_result) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;

        let obj_materials = match material_result {
            Ok(materials) => materials,
            Err(e) => {
                warn!("Failed to load material library for {}: {}", path.display(), e);
                Vec::new()
            }
        };

        let mut scene = Scene::new();
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for mtl in &obj_materials {
            let material = scene.convert_material(mtl, base_dir);
            scene.materials.push(material);
        }

        let mut triangles = Vec::new();
        for model in &models {
            let mesh = &model.mesh;
            // Slot 0 is reserved for the default, so MTL ids shift by one.
            let material_index = mesh.material_id.map(|id| id as u32 + 1).unwrap_or(0);

            let position = |v: usize| {
                Vec3A::new(
                    mesh.positions[v * 3],
                    mesh.positions[v * 3 + 1],
                    mesh.positions[v * 3 + 2],
                )
            };
            let texcoord = |v: usize| {
                if mesh.texcoords.is_empty() {
                    Vec2::ZERO
                } else {
                    Vec2::new(mesh.texcoords[v * 2], mesh.texcoords[v * 2 + 1])
                }
            };

            for face in mesh.indices.chunks_exact(3) {
                let (a, b, c) = (face[0] as usize, face[1] as usize, face[2] as usize);
                triangles.push(Triangle {
                    a: position(a),
                    b: position(b),
                    c: position(c),
                    a_uv: texcoord(a),
                    b_uv: texcoord(b),
                    c_uv: texcoord(c),
                    material_index,
                });
            }
        }

        if triangles.is_empty() {
            return Err(SceneError::NoGeometry);
        }

        scene.extend_triangles(triangles);
        info!(
            "Loaded {}: {} triangles, {} materials, {} textures",
            path.display(),
            scene.triangles.len(),
            scene.materials.len(),
            scene.texture_paths.len()
        );
        Ok(scene)
    }

    fn convert_material(&mut self, mtl: &tobj::Material, base_dir: &Path) -> Material {
        let color = Vec3A::from_array(mtl.diffuse.unwrap_or([1.0, 1.0, 1.0]));
        match &mtl.diffuse_texture {
            Some(texture) => {
                let path = base_dir.join("textures").join(texture);
                let texture_index = self.intern_texture(path);
                Material::Textured {
                    texture_index,
                    color,
                }
            }
            None => Material::Diffuse { color },
        }
    }

    fn intern_texture(&mut self, path: PathBuf) -> i32 {
        if let Some(index) = self.texture_paths.iter().position(|p| *p == path) {
            return index as i32;
        }
        self.texture_paths.push(path);
        (self.texture_paths.len() - 1) as i32
    }

    /// Append one triangle, keeping the summary array in lockstep.
    pub fn push_triangle(&mut self, tri: Triangle) {
        let index = self.triangles.len() as u32;
        self.triangle_bounds.push(TriangleBounds::of(&tri, index));
        self.triangles.push(tri);
    }

    /// Append a batch of triangles, computing summaries in parallel.
    pub fn extend_triangles(&mut self, new: Vec<Triangle>) {
        let base = self.triangles.len() as u32;
        let bounds: Vec<TriangleBounds> = new
            .par_iter()
            .enumerate()
            .map(|(i, tri)| TriangleBounds::of(tri, base + i as u32))
            .collect();
        self.triangle_bounds.extend(bounds);
        self.triangles.extend(new);
    }

    /// Register a material and return its table index.
    pub fn add_material(&mut self, material: Material) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    /// Register an emissive material and return its table index.
    pub fn add_light_material(&mut self, emission: Color, strength: f32) -> u32 {
        self.add_material(Material::Light { emission, strength })
    }

    /// Bounding volume of every triangle currently in the scene.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for tri in &self.triangle_bounds {
            bounds.grow_to_include(tri);
        }
        bounds
    }

    /// Enclose the current geometry in a box with an emissive ceiling panel.
    ///
    /// The box is the padded scene bounding volume: each side is pushed out
    /// by `pad_fraction` of the scene extent, except the floor which uses a
    /// tenth of that so grounded models stay near the floor plane. The panel
    /// covers `light_size` of the ceiling's footprint, sits just below it,
    /// and is double-sided.
    pub fn add_enclosure_box(&mut self, light_size: f32, pad_fraction: f32, light_material: u32) {
        let bounds = self.bounds();
        let size = bounds.size();

        // Planar scenes have zero extent on some axis; pad against the
        // largest extent so no wall ends up coplanar with the geometry.
        let margin = size.max_element() * pad_fraction;
        let min_x = bounds.min.x - margin;
        let max_x = bounds.max.x + margin;
        let min_y = bounds.min.y - margin * 0.1;
        let max_y = bounds.max.y + margin;
        let min_z = bounds.min.z - margin;
        let max_z = bounds.max.z + margin;

        let corners = [
            Vec3A::new(min_x, min_y, max_z),
            Vec3A::new(max_x, min_y, max_z),
            Vec3A::new(min_x, max_y, max_z),
            Vec3A::new(max_x, max_y, max_z),
            Vec3A::new(min_x, min_y, min_z),
            Vec3A::new(max_x, min_y, min_z),
            Vec3A::new(min_x, max_y, min_z),
            Vec3A::new(max_x, max_y, min_z),
        ];
        for [i, j, k] in WALL_TRIANGLES {
            self.push_triangle(Triangle::new(corners[i], corners[j], corners[k], 0));
        }

        let center_x = (max_x + min_x) / 2.0;
        let center_z = (max_z + min_z) / 2.0;
        let half_x = light_size * (max_x - min_x) / 2.0;
        let half_z = light_size * (max_z - min_z) / 2.0;
        // Just below the ceiling so the panel is not coplanar with it.
        let light_y = max_y - 1e-3;

        let panel = [
            Vec3A::new(center_x - half_x, light_y, center_z + half_z),
            Vec3A::new(center_x + half_x, light_y, center_z + half_z),
            Vec3A::new(center_x - half_x, light_y, center_z - half_z),
            Vec3A::new(center_x + half_x, light_y, center_z - half_z),
        ];
        for [i, j, k] in PANEL_TRIANGLES {
            self.push_triangle(Triangle::new(panel[i], panel[j], panel[k], light_material));
        }

        info!(
            "Added enclosure box with {}x{} light panel",
            half_x * 2.0,
            half_z * 2.0
        );
    }

    /// Add an emissive plane hovering a tenth of the scene extent above it.
    ///
    /// The plane is double-sided on purpose, like the enclosure's ceiling
    /// panel: a single-winding quad would be invisible to rays arriving
    /// from above after a bounce.
    pub fn add_sky_light_plane(&mut self, light_material: u32) {
        let bounds = self.bounds();
        let size = bounds.size();
        // Same flat-scene guard as the enclosure: a ground plane has zero
        // y extent, so hover relative to the largest extent instead.
        let plane_y = bounds.max.y + size.max_element() * 0.1;

        let corners = [
            Vec3A::new(bounds.min.x, plane_y, bounds.max.z),
            Vec3A::new(bounds.max.x, plane_y, bounds.max.z),
            Vec3A::new(bounds.min.x, plane_y, bounds.min.z),
            Vec3A::new(bounds.max.x, plane_y, bounds.min.z),
        ];
        for [i, j, k] in PANEL_TRIANGLES {
            self.push_triangle(Triangle::new(corners[i], corners[j], corners[k], light_material));
        }

        info!("Added sky light plane at y = {}", plane_y);
    }

    /// Build the BVH over the scene's triangles.
    ///
    /// Permutes `triangles` and `triangle_bounds` in lockstep; afterwards the
    /// returned node ranges index directly into both arrays.
    pub fn build_bvh(&mut self) -> Result<Bvh, BvhError> {
        Bvh::build(&mut self.triangle_bounds, &mut self.triangles)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_triangle(offset: Vec3A) -> Triangle {
        Triangle::new(
            offset,
            offset + Vec3A::new(1.0, 0.0, 0.0),
            offset + Vec3A::new(0.0, 1.0, 0.0),
            0,
        )
    }

    #[test]
    fn arrays_stay_in_lockstep_through_pushes() {
        let mut scene = Scene::new();
        scene.push_triangle(sample_triangle(Vec3A::ZERO));
        scene.extend_triangles(vec![
            sample_triangle(Vec3A::new(2.0, 0.0, 0.0)),
            sample_triangle(Vec3A::new(4.0, 0.0, 0.0)),
        ]);

        assert_eq!(scene.triangles.len(), scene.triangle_bounds.len());
        for (i, (tri, bounds)) in scene
            .triangles
            .iter()
            .zip(&scene.triangle_bounds)
            .enumerate()
        {
            assert_eq!(bounds.index, i as u32);
            assert_eq!(bounds.min, TriangleBounds::of(tri, 0).min);
        }
    }

    #[test]
    fn enclosure_box_surrounds_existing_geometry() {
        let mut scene = Scene::new();
        scene.push_triangle(sample_triangle(Vec3A::ZERO));
        let before = scene.bounds();

        let light = scene.add_light_material(Vec3A::ONE, 10.0);
        scene.add_enclosure_box(0.3, 0.1, light);

        // 1 original + 12 walls + 4 light panel triangles.
        assert_eq!(scene.triangles.len(), 17);
        assert_eq!(scene.triangle_bounds.len(), 17);

        let after = scene.bounds();
        assert!(after.min.x < before.min.x && after.max.x > before.max.x);
        assert!(after.min.z < before.min.z && after.max.z > before.max.z);
        assert!(after.max.y > before.max.y);

        // The panel carries the light material and sits below the ceiling.
        let panel: Vec<&Triangle> = scene
            .triangles
            .iter()
            .filter(|t| t.material_index == light)
            .collect();
        assert_eq!(panel.len(), 4);
        for tri in panel {
            assert!(tri.a.y < after.max.y);
        }
    }

    #[test]
    fn flat_scene_still_gets_padded_enclosure() {
        // A ground plane has zero y extent; the walls must still clear it.
        let mut scene = Scene::new();
        scene.push_triangle(Triangle::new(
            Vec3A::new(-5.0, 0.0, -5.0),
            Vec3A::new(5.0, 0.0, -5.0),
            Vec3A::new(5.0, 0.0, 5.0),
            0,
        ));
        let before = scene.bounds();

        let light = scene.add_light_material(Vec3A::ONE, 10.0);
        scene.add_enclosure_box(0.3, 0.1, light);

        let after = scene.bounds();
        assert!(after.max.y > before.max.y);
        assert!(after.min.y < before.min.y);
        assert!(after.min.x < before.min.x && after.max.x > before.max.x);
        assert!(after.min.z < before.min.z && after.max.z > before.max.z);

        // The panel must hang strictly above the original geometry.
        for tri in scene.triangles.iter().filter(|t| t.material_index == light) {
            assert!(tri.a.y > before.max.y);
        }
    }

    #[test]
    fn sky_plane_clears_a_flat_ground_plane() {
        let mut scene = Scene::new();
        scene.push_triangle(Triangle::new(
            Vec3A::new(-5.0, 0.0, -5.0),
            Vec3A::new(5.0, 0.0, -5.0),
            Vec3A::new(5.0, 0.0, 5.0),
            0,
        ));

        let light = scene.add_light_material(Vec3A::ONE, 4.0);
        scene.add_sky_light_plane(light);

        for tri in scene.triangles.iter().filter(|t| t.material_index == light) {
            assert!(tri.a.y > 0.0 && tri.b.y > 0.0 && tri.c.y > 0.0);
        }
    }

    #[test]
    fn sky_plane_sits_above_the_scene() {
        let mut scene = Scene::new();
        scene.push_triangle(sample_triangle(Vec3A::ZERO));
        let before = scene.bounds();

        let light = scene.add_light_material(Vec3A::ONE, 4.0);
        scene.add_sky_light_plane(light);

        assert_eq!(scene.triangles.len(), 5);
        for tri in scene.triangles.iter().filter(|t| t.material_index == light) {
            assert!(tri.a.y > before.max.y);
            assert!(tri.b.y > before.max.y);
            assert!(tri.c.y > before.max.y);
        }
    }

    #[test]
    fn builds_bvh_over_assembled_scene() {
        let mut scene = Scene::new();
        for i in 0..16 {
            scene.push_triangle(sample_triangle(Vec3A::new(i as f32 * 3.0, 0.0, 0.0)));
        }
        let bvh = scene.build_bvh().unwrap();
        assert!(!bvh.root().is_leaf());
        assert_eq!(scene.triangles.len(), scene.triangle_bounds.len());
    }

    #[test]
    fn loads_obj_with_materials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("quad.mtl"),
            "newmtl red\nKd 1.0 0.0 0.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("quad.obj"),
            concat!(
                "mtllib quad.mtl\n",
                "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n",
                "usemtl red\n",
                "f 1 2 3\nf 1 3 4\n",
            ),
        )
        .unwrap();

        let scene = Scene::load_obj(dir.path().join("quad.obj")).unwrap();
        assert_eq!(scene.triangles.len(), 2);
        // Default material plus the MTL entry.
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(
            scene.materials[1],
            Material::Diffuse {
                color: Vec3A::new(1.0, 0.0, 0.0)
            }
        );
        for tri in &scene.triangles {
            assert_eq!(tri.material_index, 1);
        }
    }

    #[test]
    fn obj_without_faces_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\n").unwrap();

        let err = Scene::load_obj(dir.path().join("empty.obj")).unwrap_err();
        assert!(matches!(err, SceneError::NoGeometry));
    }
}
