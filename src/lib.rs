//! LumenPath scene preparation
//!
//! Loads triangle meshes with materials, builds a bounding volume hierarchy
//! over their geometry, and packs the result into GPU-uploadable buffers for
//! a real-time path tracer's compute kernel.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod aabb;
pub mod triangle;
pub mod material;
pub mod bvh;
pub mod scene;
pub mod gpu;
