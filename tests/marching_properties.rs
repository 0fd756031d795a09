//! Property-based tests for cell triangulation and edge interpolation.

use cgmath::{Point3, Vector3};
use proptest::prelude::*;
use voxel_terrain::{
    density::{DensitySource, NoiseAlgorithm, NoiseConfig, NoiseContext, NoiseDensityField},
    voxels::marching::{case_table, interpolate_edge, Cell, CornerSample},
};

fn arb_origin() -> impl Strategy<Value = Point3<f32>> {
    prop::array::uniform3(-50i32..50)
        .prop_map(|[x, y, z]| Point3::new(x as f32, y as f32, z as f32))
}

fn arb_axis_step() -> impl Strategy<Value = Vector3<f32>> {
    (0usize..3).prop_map(|axis| {
        let mut step = Vector3::new(0.0, 0.0, 0.0);
        step[axis] = 1.0;
        step
    })
}

proptest! {
    #[test]
    fn interpolation_ignores_argument_order(
        origin in arb_origin(),
        step in arb_axis_step(),
        da in -10.0f32..10.0,
        db in -10.0f32..10.0,
        threshold in -10.0f32..10.0,
    ) {
        let a = CornerSample::new(origin, da);
        let b = CornerSample::new(origin + step, db);

        let forward = interpolate_edge(threshold, a, b);
        let backward = interpolate_edge(threshold, b, a);
        prop_assert_eq!(forward.x.to_bits(), backward.x.to_bits());
        prop_assert_eq!(forward.y.to_bits(), backward.y.to_bits());
        prop_assert_eq!(forward.z.to_bits(), backward.z.to_bits());
    }

    #[test]
    fn crossings_lie_on_the_edge(
        origin in arb_origin(),
        step in arb_axis_step(),
        da in -10.0f32..10.0,
        db in -10.0f32..10.0,
        threshold in -10.0f32..10.0,
    ) {
        prop_assume!((da <= threshold) != (db <= threshold));
        let end = origin + step;
        let p = interpolate_edge(
            threshold,
            CornerSample::new(origin, da),
            CornerSample::new(end, db),
        );

        for axis in 0..3 {
            prop_assert!(p[axis] >= origin[axis] && p[axis] <= end[axis]);
        }
    }

    #[test]
    fn cell_triangles_stay_inside_the_cell(
        origin in arb_origin(),
        densities in prop::array::uniform8(-1.0f32..1.0),
        threshold in -1.0f32..1.0,
    ) {
        let cell = Cell::unit(origin, densities);
        let case = cell.case_index(threshold);
        let triangles = cell.triangulate(threshold);

        prop_assert_eq!(triangles.len(), case_table::triangle_count(case));
        prop_assert!(triangles.len() <= 5);
        prop_assert_eq!(triangles.is_empty(), case_table::edge_mask(case) == 0);
        for triangle in &triangles {
            for vertex in triangle {
                for axis in 0..3 {
                    prop_assert!(
                        vertex[axis] >= origin[axis] && vertex[axis] <= origin[axis] + 1.0
                    );
                }
            }
        }
    }

    #[test]
    fn density_field_is_deterministic_per_seed(
        seed in any::<u32>(),
        position in prop::array::uniform3(-500.0f32..500.0),
    ) {
        let build = || NoiseDensityField::new(
            NoiseContext::new(seed, NoiseAlgorithm::Simplex),
            vec![NoiseConfig::new(0.05, 4, 0.5, 2.0)],
            16.0,
            8.0,
        );
        let p = Point3::from(position);
        prop_assert_eq!(build().density(p).to_bits(), build().density(p).to_bits());
    }
}
