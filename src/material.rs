//! Material model for scene ingestion.
//!
//! Covers the surface types the renderer's compute kernel understands:
//! diffuse, specular, emissive, checker, glass, and textured. The scene
//! assembler populates these from MTL data; the GPU layer flattens them to
//! the shader's storage-buffer layout.

use glam::Vec3A;

/// RGB color type shared with the rest of the crate.
pub type Color = Vec3A;

/// GPU type code for diffuse materials.
pub const MATERIAL_DIFFUSE: i32 = 0;
/// GPU type code for specular materials.
pub const MATERIAL_SPECULAR: i32 = 1;
/// GPU type code for emissive materials.
pub const MATERIAL_LIGHT: i32 = 2;
/// GPU type code for checker materials.
pub const MATERIAL_CHECKER: i32 = 3;
/// GPU type code for glass materials.
pub const MATERIAL_GLASS: i32 = 4;
/// GPU type code for textured materials.
pub const MATERIAL_TEXTURE: i32 = 5;

/// Surface material attached to a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Matte surface with a flat color.
    Diffuse {
        /// Surface color.
        color: Color,
    },

    /// Partially mirror-like surface.
    Specular {
        /// Base diffuse color.
        color: Color,
        /// Tint applied to specular bounces.
        specular_color: Color,
        /// Surface smoothness (0.0 = rough, 1.0 = mirror).
        smoothness: f32,
        /// Probability a bounce is specular rather than diffuse.
        specular_probability: f32,
    },

    /// Emissive surface.
    Light {
        /// Emitted color.
        emission: Color,
        /// Emission strength multiplier.
        strength: f32,
    },

    /// Procedural checkerboard.
    Checker {
        /// Size of one checker cell.
        scale: f32,
    },

    /// Transparent refractive surface.
    Glass {
        /// Transmission tint.
        color: Color,
        /// Index of refraction (1.0 = air, 1.5 = glass).
        refractive_index: f32,
    },

    /// Surface sampling a loaded texture.
    Textured {
        /// Index into the scene's texture table.
        texture_index: i32,
        /// Multiplier applied to the sampled color.
        color: Color,
    },
}

impl Material {
    /// GPU type code for this material.
    pub fn type_code(&self) -> i32 {
        match self {
            Material::Diffuse { .. } => MATERIAL_DIFFUSE,
            Material::Specular { .. } => MATERIAL_SPECULAR,
            Material::Light { .. } => MATERIAL_LIGHT,
            Material::Checker { .. } => MATERIAL_CHECKER,
            Material::Glass { .. } => MATERIAL_GLASS,
            Material::Textured { .. } => MATERIAL_TEXTURE,
        }
    }
}

impl Default for Material {
    /// White diffuse, the fallback for faces without an MTL entry.
    fn default() -> Self {
        Material::Diffuse { color: Vec3A::ONE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_match_shader_constants() {
        assert_eq!(Material::default().type_code(), MATERIAL_DIFFUSE);
        assert_eq!(
            Material::Light {
                emission: Vec3A::ONE,
                strength: 10.0
            }
            .type_code(),
            MATERIAL_LIGHT
        );
        assert_eq!(
            Material::Textured {
                texture_index: 2,
                color: Vec3A::ONE
            }
            .type_code(),
            MATERIAL_TEXTURE
        );
    }
}
