use clap::Parser;
use glam::Vec3A;
use log::{error, info};

mod aabb;
mod bvh;
mod cli;
mod gpu;
mod logger;
mod material;
mod scene;
mod triangle;

use bvh::Bvh;
use cli::Args;
use logger::init_logger;
use material::Material;
use scene::Scene;
use triangle::Triangle;

/// Create a small procedural demo scene: a unit cube on a checkered floor
fn create_demo_scene() -> Scene {
    let mut scene = Scene::new();

    // Checkered ground plane
    let checker = scene.add_material(Material::Checker { scale: 1.0 });
    let extent = 10.0;
    let floor = [
        Vec3A::new(-extent, 0.0, -extent),
        Vec3A::new(extent, 0.0, -extent),
        Vec3A::new(extent, 0.0, extent),
        Vec3A::new(-extent, 0.0, extent),
    ];
    scene.push_triangle(Triangle::new(floor[0], floor[1], floor[2], checker));
    scene.push_triangle(Triangle::new(floor[0], floor[2], floor[3], checker));

    // Unit cube resting on the floor
    let red = scene.add_material(Material::Diffuse {
        color: Vec3A::new(0.8, 0.2, 0.2),
    });
    let corners = [
        Vec3A::new(-0.5, 0.0, 0.5),
        Vec3A::new(0.5, 0.0, 0.5),
        Vec3A::new(-0.5, 1.0, 0.5),
        Vec3A::new(0.5, 1.0, 0.5),
        Vec3A::new(-0.5, 0.0, -0.5),
        Vec3A::new(0.5, 0.0, -0.5),
        Vec3A::new(-0.5, 1.0, -0.5),
        Vec3A::new(0.5, 1.0, -0.5),
    ];
    let faces: [[usize; 3]; 12] = [
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
    for [i, j, k] in faces {
        scene.push_triangle(Triangle::new(corners[i], corners[j], corners[k], red));
    }

    scene
}

/// Re-walk the built hierarchy and verify its structural invariants:
/// leaf ranges partition the input and every node contains its triangles
fn verify_hierarchy(bvh: &Bvh, scene: &Scene) -> Result<(), String> {
    let mut ranges: Vec<(u32, u32)> = bvh
        .nodes
        .iter()
        .filter(|n| n.is_leaf())
        .map(|n| (n.first_triangle, n.triangle_count))
        .collect();
    ranges.sort_unstable();

    let mut next = 0u32;
    for (start, count) in ranges {
        if start != next {
            return Err(format!(
                "leaf ranges leave a gap or overlap at triangle {}",
                next
            ));
        }
        next = start + count;
    }
    if next != scene.triangles.len() as u32 {
        return Err(format!(
            "leaves cover {} of {} triangles",
            next,
            scene.triangles.len()
        ));
    }

    for (index, node) in bvh.nodes.iter().enumerate() {
        let start = node.first_triangle as usize;
        let end = start + node.triangle_count as usize;
        for tri in &scene.triangle_bounds[start..end] {
            if !(tri.min.cmpge(node.bounds.min).all() && tri.max.cmple(node.bounds.max).all()) {
                return Err(format!(
                    "node {} does not contain triangle {}",
                    index, tri.index
                ));
            }
        }
    }

    Ok(())
}

/// Write the packed GPU buffers next to each other under a common stem
fn dump_buffers(
    stem: &str,
    nodes: &[gpu::GpuBvhNode],
    triangles: &[gpu::GpuTriangle],
    materials: &[gpu::GpuMaterial],
) -> std::io::Result<()> {
    std::fs::write(format!("{}.nodes", stem), bytemuck::cast_slice(nodes))?;
    std::fs::write(format!("{}.triangles", stem), bytemuck::cast_slice(triangles))?;
    std::fs::write(format!("{}.materials", stem), bytemuck::cast_slice(materials))?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    init_logger(args.debug_level.into());

    // Log application startup with version information
    info!(
        "LumenPath - Git Version {} ({})",
        env!("GIT_HASH"),
        env!("GIT_DATE")
    );

    let mut scene = match &args.model {
        Some(path) => match Scene::load_obj(path) {
            Ok(scene) => scene,
            Err(e) => {
                error!("Failed to load scene: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            info!("No model given, assembling procedural demo scene");
            create_demo_scene()
        }
    };

    // Synthesized bounding geometry goes in before the hierarchy is built
    if args.enclosure {
        let light = scene.add_light_material(Vec3A::ONE, args.light_strength);
        scene.add_enclosure_box(args.light_size, args.padding, light);
    }
    if args.sky_light {
        let light = scene.add_light_material(Vec3A::ONE, args.light_strength);
        scene.add_sky_light_plane(light);
    }

    let bvh = match scene.build_bvh() {
        Ok(bvh) => bvh,
        Err(e) => {
            error!("BVH construction failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.check {
        match verify_hierarchy(&bvh, &scene) {
            Ok(()) => info!("Hierarchy verification passed"),
            Err(msg) => {
                error!("Hierarchy verification failed: {}", msg);
                std::process::exit(1);
            }
        }
    }

    // Pack everything the renderer uploads to its storage buffers
    let nodes = gpu::pack_nodes(&bvh);
    let triangles = gpu::pack_triangles(&scene.triangles);
    let materials = gpu::pack_materials(&scene.materials);
    info!(
        "GPU buffers ready: {} nodes ({} bytes), {} triangles ({} bytes), {} materials ({} bytes)",
        nodes.len(),
        std::mem::size_of_val(nodes.as_slice()),
        triangles.len(),
        std::mem::size_of_val(triangles.as_slice()),
        materials.len(),
        std::mem::size_of_val(materials.as_slice())
    );

    if let Some(stem) = &args.dump {
        if let Err(e) = dump_buffers(stem, &nodes, &triangles, &materials) {
            error!("Failed to write buffer dump: {}", e);
            std::process::exit(1);
        }
        info!("Wrote {}.nodes / .triangles / .materials", stem);
    }
}
