//! Neighbouring chunks must agree on their shared plane without any stitching.

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use voxel_terrain::{
    config::TerrainConfig,
    density::DensitySource,
    voxels::{volume::EdgeBehavior, world::World},
};

const SIZE: u32 = 8;

/// A rolling height field whose lattice densities never sit on the threshold.
fn rolling_hills() -> Arc<dyn DensitySource> {
    Arc::new(|p: Point3<f32>| -> f32 {
        let height = 2.5 + 0.3 * (p.x * 0.7).sin() + 0.2 * (p.z * 0.9).cos();
        p.y - height
    })
}

/// World-space vertices of one chunk lying on a plane, as sorted, unique bit patterns.
fn plane_vertices(
    world: &World,
    position: Point3<i32>,
    on_plane: impl Fn(Point3<f32>) -> bool,
) -> Vec<[u32; 3]> {
    let volume = world.get_volume_at(position).unwrap();
    let mut vertices: Vec<[u32; 3]> = volume
        .mesh()
        .world_vertices(volume.world_offset())
        .into_iter()
        .filter(|&v| on_plane(v))
        .map(|v| [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()])
        .collect();
    vertices.sort_unstable();
    vertices.dedup();
    vertices
}

fn marched_pair(edge_behavior: EdgeBehavior, second: Point3<i32>) -> World {
    let mut world = World::new(SIZE, 0.0, edge_behavior, rolling_hills()).unwrap();
    world.add_chunk_at(Point3::new(0, 0, 0));
    world.add_chunk_at(second);
    world.march_all();
    world
}

#[test]
fn x_seam_vertices_coincide() {
    for edge_behavior in [
        EdgeBehavior::TrueDensity,
        EdgeBehavior::SuppressedEdges { sharpness: 1.0 },
    ] {
        let world = marched_pair(edge_behavior, Point3::new(1, 0, 0));
        let seam = SIZE as f32;

        let left = plane_vertices(&world, Point3::new(0, 0, 0), |v| v.x == seam);
        let right = plane_vertices(&world, Point3::new(1, 0, 0), |v| v.x == seam);
        assert!(!left.is_empty());
        assert_eq!(left, right, "{edge_behavior:?}");
    }
}

#[test]
fn z_seam_vertices_coincide() {
    for edge_behavior in [
        EdgeBehavior::TrueDensity,
        EdgeBehavior::SuppressedEdges { sharpness: 1.0 },
    ] {
        let world = marched_pair(edge_behavior, Point3::new(0, 0, 1));
        let seam = SIZE as f32;

        let near = plane_vertices(&world, Point3::new(0, 0, 0), |v| v.z == seam);
        let far = plane_vertices(&world, Point3::new(0, 0, 1), |v| v.z == seam);
        assert!(!near.is_empty());
        assert_eq!(near, far, "{edge_behavior:?}");
    }
}

#[test]
fn lone_chunk_leaves_the_gap_open() {
    let mut world = World::new(SIZE, 0.0, EdgeBehavior::TrueDensity, rolling_hills()).unwrap();
    world.add_chunk_at(Point3::new(0, 0, 0));
    world.march_all();

    let seam = SIZE as f32;
    assert!(plane_vertices(&world, Point3::new(0, 0, 0), |v| v.x >= seam - 0.5).is_empty());
}

#[test]
fn noise_chunks_share_their_seam_densities() {
    let config = TerrainConfig {
        size: SIZE,
        seed: Some(2024),
        show_edges: false,
        grid_radius: 1,
        ..TerrainConfig::default()
    };
    let mut world = World::from_config(&config).unwrap();
    world.march_all();

    let last = SIZE as usize;
    let near = world.get_volume_at(Point3::new(0, 0, 0)).unwrap().lattice();
    let far = world.get_volume_at(Point3::new(1, 0, 0)).unwrap().lattice();
    for z in 0..SIZE as usize {
        for y in 0..SIZE as usize {
            let shared = near.density_at(last, y, z).unwrap();
            assert_eq!(shared.to_bits(), far.density_at(0, y, z).unwrap().to_bits());
        }
    }
}

/// Every pair of face-sharing chunks in `layout` must emit the same vertices on
/// their shared plane.
fn assert_layout_seams(layout: &[Point3<i32>], edge_behavior: EdgeBehavior) {
    let mut world = World::new(SIZE, 0.0, edge_behavior, rolling_hills()).unwrap();
    for &position in layout {
        world.add_chunk_at(position);
    }
    world.march_all();

    let size = SIZE as f32;
    for &near in layout {
        let behind = near + Vector3::new(1, 0, 0);
        if world.has_chunk_at(behind) {
            let seam = (near.x + 1) as f32 * size;
            let near_vertices = plane_vertices(&world, near, |v| v.x == seam);
            assert!(!near_vertices.is_empty());
            assert_eq!(
                near_vertices,
                plane_vertices(&world, behind, |v| v.x == seam),
                "{near:?} / {behind:?} under {edge_behavior:?}"
            );
        }

        let right = near + Vector3::new(0, 0, 1);
        if world.has_chunk_at(right) {
            let seam = (near.z + 1) as f32 * size;
            let near_vertices = plane_vertices(&world, near, |v| v.z == seam);
            assert!(!near_vertices.is_empty());
            assert_eq!(
                near_vertices,
                plane_vertices(&world, right, |v| v.z == seam),
                "{near:?} / {right:?} under {edge_behavior:?}"
            );
        }
    }
}

#[test]
fn l_shaped_layouts_share_their_seams() {
    let layouts = [
        [Point3::new(0, 0, 0), Point3::new(1, 0, 0), Point3::new(1, 0, 1)],
        [Point3::new(0, 0, 0), Point3::new(1, 0, 0), Point3::new(0, 0, 1)],
        [Point3::new(0, 0, 0), Point3::new(0, 0, 1), Point3::new(1, 0, 1)],
    ];
    for layout in &layouts {
        assert_layout_seams(layout, EdgeBehavior::SuppressedEdges { sharpness: 1.0 });
    }
}

#[test]
fn filled_grid_shares_every_seam() {
    let grid: Vec<Point3<i32>> = (0..3)
        .flat_map(|z| (0..3).map(move |x| Point3::new(x, 0, z)))
        .collect();
    assert_layout_seams(&grid, EdgeBehavior::SuppressedEdges { sharpness: 1.0 });
}
