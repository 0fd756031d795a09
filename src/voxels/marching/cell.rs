//! # Cell Module
//!
//! One marching cube: eight density samples in, a handful of triangles out.
//!
//! Output is a triangle soup. Shared edge vertices are emitted once per triangle
//! that uses them and nothing is welded or indexed here.

use cgmath::{Point3, Vector3};

use super::case_table::{
    edge_mask, CORNER_COUNT, CORNER_OFFSETS, EDGE_CORNERS, EDGE_COUNT, TRIANGULATIONS,
    TRIANGULATION_END,
};

/// Density differences below this are treated as equal during interpolation.
pub const INTERPOLATION_EPSILON: f32 = 1e-5;

/// Three vertex positions in winding order.
pub type Triangle = [Point3<f32>; 3];

/// A lattice corner and the density sampled there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSample {
    /// Position of the corner.
    pub position: Point3<f32>,
    /// Density of the field at `position`.
    pub density: f32,
}

impl CornerSample {
    /// Creates a corner sample.
    pub fn new(position: Point3<f32>, density: f32) -> Self {
        CornerSample { position, density }
    }
}

/// Finds where the surface crosses the edge between two corners.
///
/// The corners are put in lexicographic position order first, so swapping the
/// arguments always returns the same bits. After that:
/// * a corner sitting on the threshold is returned as is
/// * corners with near-equal densities return the first corner instead of dividing
///   by almost zero
/// * otherwise the crossing is linearly interpolated
pub fn interpolate_edge(threshold: f32, first: CornerSample, second: CornerSample) -> Point3<f32> {
    let (a, b) = if precedes(second.position, first.position) {
        (second, first)
    } else {
        (first, second)
    };

    if (threshold - a.density).abs() < INTERPOLATION_EPSILON {
        return a.position;
    }
    if (threshold - b.density).abs() < INTERPOLATION_EPSILON {
        return b.position;
    }
    if (a.density - b.density).abs() < INTERPOLATION_EPSILON {
        return a.position;
    }

    let t = (threshold - a.density) / (b.density - a.density);
    a.position + (b.position - a.position) * t
}

fn precedes(p: Point3<f32>, q: Point3<f32>) -> bool {
    (p.x, p.y, p.z) < (q.x, q.y, q.z)
}

/// The eight samples of one marching cube, in case table corner order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Corner samples, ordered as [`CORNER_OFFSETS`].
    pub corners: [CornerSample; CORNER_COUNT],
}

impl Cell {
    /// Creates a cell from already ordered corner samples.
    pub fn new(corners: [CornerSample; CORNER_COUNT]) -> Self {
        Cell { corners }
    }

    /// Creates a unit cell at `origin` with the given corner densities.
    pub fn unit(origin: Point3<f32>, densities: [f32; CORNER_COUNT]) -> Self {
        let corners = std::array::from_fn(|corner| {
            let [x, y, z] = CORNER_OFFSETS[corner];
            CornerSample::new(
                origin + Vector3::new(x as f32, y as f32, z as f32),
                densities[corner],
            )
        });
        Cell { corners }
    }

    /// Builds the case index: bit `i` is set when corner `i` is at or below `threshold`.
    pub fn case_index(&self, threshold: f32) -> u8 {
        self.corners
            .iter()
            .enumerate()
            .filter(|(_, corner)| corner.density <= threshold)
            .fold(0u8, |case, (corner, _)| case | (1 << corner))
    }

    /// Triangulates the cell.
    ///
    /// # Returns
    /// The triangles in case table order. Empty when the cell is fully inside or
    /// fully outside.
    pub fn triangulate(&self, threshold: f32) -> Vec<Triangle> {
        let mut triangles = Vec::new();
        self.triangulate_into(threshold, &mut triangles);
        triangles
    }

    /// Appends the cell's triangles to `triangles`.
    ///
    /// # Returns
    /// The number of triangles appended.
    pub fn triangulate_into(&self, threshold: f32, triangles: &mut Vec<Triangle>) -> usize {
        let case_index = self.case_index(threshold);
        let mask = edge_mask(case_index);
        if mask == 0 {
            return 0;
        }

        let mut edge_vertices = [Point3::new(0.0, 0.0, 0.0); EDGE_COUNT];
        for (edge, &(a, b)) in EDGE_CORNERS.iter().enumerate() {
            if mask & (1 << edge) != 0 {
                edge_vertices[edge] =
                    interpolate_edge(threshold, self.corners[a], self.corners[b]);
            }
        }

        let before = triangles.len();
        for triple in TRIANGULATIONS[case_index as usize].chunks_exact(3) {
            if triple[0] == TRIANGULATION_END {
                break;
            }
            triangles.push([
                edge_vertices[triple[0] as usize],
                edge_vertices[triple[1] as usize],
                edge_vertices[triple[2] as usize],
            ]);
        }
        triangles.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn origin() -> Point3<f32> {
        Point3::new(0.0, 0.0, 0.0)
    }

    #[test]
    fn uniform_cells_are_empty() {
        let above = Cell::unit(origin(), [1.0; 8]);
        let below = Cell::unit(origin(), [-1.0; 8]);
        assert!(above.triangulate(0.5).is_empty());
        assert!(below.triangulate(0.5).is_empty());
        assert_eq!(above.case_index(0.5), 0);
        assert_eq!(below.case_index(0.5), 255);
    }

    #[test]
    fn density_on_threshold_counts_as_inside() {
        let mut densities = [1.0; 8];
        densities[5] = 0.5;
        let cell = Cell::unit(origin(), densities);
        assert_eq!(cell.case_index(0.5), 1 << 5);
    }

    #[test]
    fn corner_zero_cuts_its_three_edges_at_midpoints() {
        let mut densities = [1.0; 8];
        densities[0] = 0.0;
        let triangles = Cell::unit(origin(), densities).triangulate(0.5);

        assert_eq!(triangles.len(), 1);
        assert_eq!(
            triangles[0],
            [
                Point3::new(0.5, 0.0, 0.0),
                Point3::new(0.0, 0.5, 0.0),
                Point3::new(0.0, 0.0, 0.5),
            ]
        );
    }

    #[test]
    fn crossing_follows_the_threshold() {
        let mut densities = [1.0; 8];
        densities[0] = 0.0;
        let triangles = Cell::unit(Point3::new(2.0, 3.0, 4.0), densities).triangulate(0.25);

        assert_eq!(triangles.len(), 1);
        assert_relative_eq!(triangles[0][0].x, 2.25);
        assert_relative_eq!(triangles[0][1].y, 3.25);
        assert_relative_eq!(triangles[0][2].z, 4.25);
    }

    #[test]
    fn interpolation_hits_vertex_on_threshold() {
        let a = CornerSample::new(Point3::new(1.0, 0.0, 0.0), 0.5);
        let b = CornerSample::new(Point3::new(0.0, 0.0, 0.0), 2.0);
        assert_eq!(interpolate_edge(0.5, a, b), a.position);
        assert_eq!(interpolate_edge(0.5, b, a), a.position);
    }

    #[test]
    fn interpolation_of_equal_densities_is_finite() {
        let a = CornerSample::new(Point3::new(0.0, 0.0, 0.0), 0.3);
        let b = CornerSample::new(Point3::new(0.0, 1.0, 0.0), 0.3 + 1e-7);
        let p = interpolate_edge(0.9, a, b);
        assert_eq!(p, a.position);
        assert_eq!(interpolate_edge(0.9, b, a), a.position);
    }

    #[test]
    fn interpolation_is_symmetric() {
        let a = CornerSample::new(Point3::new(4.0, 1.0, 7.0), -0.37);
        let b = CornerSample::new(Point3::new(4.0, 1.0, 8.0), 0.81);
        let forward = interpolate_edge(0.1, a, b);
        let backward = interpolate_edge(0.1, b, a);
        assert_eq!(forward.x.to_bits(), backward.x.to_bits());
        assert_eq!(forward.y.to_bits(), backward.y.to_bits());
        assert_eq!(forward.z.to_bits(), backward.z.to_bits());
    }

    #[test]
    fn every_case_yields_vertices_on_cell_edges() {
        for case in 0..=255u8 {
            let densities = std::array::from_fn(|corner| {
                if case & (1 << corner) != 0 { -1.0 } else { 1.0 }
            });
            let cell = Cell::unit(origin(), densities);
            assert_eq!(cell.case_index(0.0), case);

            for triangle in cell.triangulate(0.0) {
                for vertex in triangle {
                    let halves = [vertex.x, vertex.y, vertex.z]
                        .iter()
                        .filter(|&&c| c == 0.5)
                        .count();
                    assert_eq!(halves, 1, "case {case} vertex {vertex:?}");
                }
            }
        }
    }

    #[test]
    fn triangulate_into_appends() {
        let mut densities = [1.0; 8];
        densities[6] = 0.0;
        let cell = Cell::unit(origin(), densities);

        let mut triangles = cell.triangulate(0.5);
        let appended = cell.triangulate_into(0.5, &mut triangles);
        assert_eq!(appended, 1);
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0], triangles[1]);
    }
}
