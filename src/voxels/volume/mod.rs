//! # Volume Module
//!
//! A volume is one chunk of terrain: a cubic lattice of marching cells that turns a
//! density field into a triangle soup.
//!
//! ## Extents
//!
//! A volume of size `n` has `n` lattice points per axis and, standing alone,
//! `n - 1` cells per axis. When a neighbour exists on the positive X or positive Z
//! side, the volume marches one extra cell along that axis so the gap between its
//! last lattice plane and the neighbour's first one is closed. Both chunks sample
//! the shared plane from the same world positions, so no stitching pass is needed.
//!
//! ## Ownership
//!
//! A volume owns its corner lattice and its mesh buffers. It never owns its
//! neighbours; callers pass a [`Neighbours`] snapshot to [`Volume::march`].

use std::{fmt, sync::Arc};

use cgmath::{Point3, Vector3};
use log::debug;
use web_time::Instant;

use crate::{
    density::DensitySource,
    error::{TerrainError, TerrainResult},
    meshing::MeshBuffers,
    voxels::{
        marching::{case_table::CORNER_OFFSETS, Cell, CornerSample},
        neighbours::{NeighbourDirection, Neighbours},
    },
};

pub mod density_lattice;

pub use density_lattice::DensityLattice;
use density_lattice::local_position;

/// Smallest valid volume size. Two lattice points per axis make one cell.
pub const MIN_VOLUME_SIZE: u32 = 2;

/// What happens to corner densities on the open faces of a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeBehavior {
    /// Sample the field everywhere. Terrain cut by a volume face is left open.
    TrueDensity,
    /// Force open faces, plus the top and bottom, to `sharpness`. With a sharpness
    /// above the threshold the terrain is capped with walls.
    SuppressedEdges {
        /// Density written to open corners
        sharpness: f32,
    },
}

impl EdgeBehavior {
    /// Maps the `show_edges` / `edge_sharpness` config pair to a behaviour.
    pub fn from_flags(show_edges: bool, sharpness: f32) -> Self {
        if show_edges {
            EdgeBehavior::SuppressedEdges { sharpness }
        } else {
            EdgeBehavior::TrueDensity
        }
    }
}

/// Everything needed to march a volume.
///
/// Cloning is cheap: the density source is shared. Chunk march tasks carry a clone
/// to the worker thread.
#[derive(Clone)]
pub struct VolumeParams {
    /// Lattice points per axis, also the spacing between chunks
    pub size: u32,
    /// Grid coordinate of the chunk
    pub position: Point3<i32>,
    /// Densities at or below this are inside the surface
    pub density_threshold: f32,
    /// How open faces are treated
    pub edge_behavior: EdgeBehavior,
    /// The field sampled at every lattice corner
    pub density_source: Arc<dyn DensitySource>,
}

impl fmt::Debug for VolumeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeParams")
            .field("size", &self.size)
            .field("position", &self.position)
            .field("density_threshold", &self.density_threshold)
            .field("edge_behavior", &self.edge_behavior)
            .finish_non_exhaustive()
    }
}

impl VolumeParams {
    /// World translation of the chunk, `position * size`.
    pub fn world_offset(&self) -> Vector3<f32> {
        let size = self.size as f32;
        Vector3::new(
            self.position.x as f32 * size,
            self.position.y as f32 * size,
            self.position.z as f32 * size,
        )
    }

    /// Number of cells marched along each axis for the given neighbours.
    pub fn cell_extents(&self, neighbours: &Neighbours) -> Vector3<usize> {
        let base = self.size.saturating_sub(1) as usize;
        let bridge = |direction| usize::from(neighbours.has(direction));
        Vector3::new(
            base + bridge(NeighbourDirection::Back),
            base,
            base + bridge(NeighbourDirection::Right),
        )
    }

    /// Runs a full march, filling `lattice` and returning fresh mesh buffers.
    ///
    /// This does not touch any volume, so it can run on a worker thread.
    pub fn march_into(&self, neighbours: &Neighbours, lattice: &mut DensityLattice) -> MeshBuffers {
        let extents = self.cell_extents(neighbours);
        lattice.resample(self.density_source.as_ref(), extents, self.world_offset());
        if let EdgeBehavior::SuppressedEdges { sharpness } = self.edge_behavior {
            lattice.suppress_open_faces(neighbours, self.size as usize, sharpness);
        }

        let mut triangles = Vec::new();
        for z in 0..extents.z {
            for y in 0..extents.y {
                for x in 0..extents.x {
                    let cell = Cell::new(std::array::from_fn(|corner| {
                        let [ox, oy, oz] = CORNER_OFFSETS[corner];
                        let (cx, cy, cz) = (x + ox as usize, y + oy as usize, z + oz as usize);
                        CornerSample::new(local_position(cx, cy, cz), lattice.corner(cx, cy, cz))
                    }));
                    cell.triangulate_into(self.density_threshold, &mut triangles);
                }
            }
        }

        MeshBuffers::from_triangles(&triangles, self.size as f32)
    }
}

/// One chunk of marched terrain.
pub struct Volume {
    params: VolumeParams,
    lattice: DensityLattice,
    mesh: MeshBuffers,
}

impl Volume {
    /// Creates an unmarched volume.
    ///
    /// # Arguments
    /// * `size` - Lattice points per axis, at least [`MIN_VOLUME_SIZE`]
    /// * `position` - Grid coordinate of the chunk
    /// * `density_threshold` - Iso level of the surface
    /// * `edge_behavior` - How open faces are treated
    /// * `density_source` - The field to sample, shared between chunks
    ///
    /// # Returns
    /// `TerrainError::InvalidVolumeSize` when `size` is too small to hold a cell.
    pub fn new(
        size: u32,
        position: Point3<i32>,
        density_threshold: f32,
        edge_behavior: EdgeBehavior,
        density_source: Arc<dyn DensitySource>,
    ) -> TerrainResult<Self> {
        Volume::from_params(VolumeParams {
            size,
            position,
            density_threshold,
            edge_behavior,
            density_source,
        })
    }

    /// Creates an unmarched volume from prepared parameters.
    ///
    /// # Returns
    /// `TerrainError::InvalidVolumeSize` when `params.size` is too small.
    pub fn from_params(params: VolumeParams) -> TerrainResult<Self> {
        if params.size < MIN_VOLUME_SIZE {
            return Err(TerrainError::InvalidVolumeSize(params.size));
        }
        Ok(Volume {
            params,
            lattice: DensityLattice::default(),
            mesh: MeshBuffers::new(),
        })
    }

    /// Regenerates the mesh against the given neighbours.
    ///
    /// The previous buffers are dropped only after the new ones are complete.
    pub fn march(&mut self, neighbours: &Neighbours) -> &MeshBuffers {
        let started = Instant::now();
        let mesh = self.params.march_into(neighbours, &mut self.lattice);
        debug!(
            "Marched chunk {:?}: {} triangles in {:?}",
            self.params.position,
            mesh.triangle_count(),
            started.elapsed()
        );
        self.mesh = mesh;
        &self.mesh
    }

    /// Installs the output of a march that ran elsewhere.
    pub(crate) fn install(&mut self, lattice: DensityLattice, mesh: MeshBuffers) {
        self.lattice = lattice;
        self.mesh = mesh;
    }

    /// The inputs of the next march.
    pub fn params(&self) -> &VolumeParams {
        &self.params
    }

    /// Lattice points per axis.
    pub fn size(&self) -> u32 {
        self.params.size
    }

    /// Grid coordinate of the chunk.
    pub fn position(&self) -> Point3<i32> {
        self.params.position
    }

    /// Iso level of the surface.
    pub fn density_threshold(&self) -> f32 {
        self.params.density_threshold
    }

    /// Changes the iso level. Takes effect on the next march.
    pub fn set_density_threshold(&mut self, density_threshold: f32) {
        self.params.density_threshold = density_threshold;
    }

    /// How open faces are treated.
    pub fn edge_behavior(&self) -> EdgeBehavior {
        self.params.edge_behavior
    }

    /// Changes the edge behaviour. Takes effect on the next march.
    pub fn set_edge_behavior(&mut self, edge_behavior: EdgeBehavior) {
        self.params.edge_behavior = edge_behavior;
    }

    /// The buffers from the last march, empty before the first one.
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    /// The corner lattice from the last march.
    pub fn lattice(&self) -> &DensityLattice {
        &self.lattice
    }

    /// World translation of the chunk.
    pub fn world_offset(&self) -> Vector3<f32> {
        self.params.world_offset()
    }
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume")
            .field("params", &self.params)
            .field("triangles", &self.mesh.triangle_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constant(value: f32) -> Arc<dyn DensitySource> {
        Arc::new(move |_: Point3<f32>| value)
    }

    #[test]
    fn undersized_volumes_are_rejected() {
        for size in [0, 1] {
            let result = Volume::new(
                size,
                Point3::new(0, 0, 0),
                0.5,
                EdgeBehavior::TrueDensity,
                constant(1.0),
            );
            assert!(matches!(result, Err(TerrainError::InvalidVolumeSize(s)) if s == size));
        }
    }

    #[test]
    fn constant_field_has_no_surface() {
        let mut volume = Volume::new(
            2,
            Point3::new(0, 0, 0),
            0.5,
            EdgeBehavior::TrueDensity,
            constant(1.0),
        )
        .unwrap();
        assert!(volume.march(&Neighbours::none()).is_empty());
    }

    #[test]
    fn single_inside_corner_yields_one_triangle() {
        let source: Arc<dyn DensitySource> = Arc::new(|p: Point3<f32>| -> f32 {
            if p == Point3::new(0.0, 0.0, 0.0) {
                0.0
            } else {
                1.0
            }
        });
        let mut volume =
            Volume::new(2, Point3::new(0, 0, 0), 0.5, EdgeBehavior::TrueDensity, source).unwrap();
        let mesh = volume.march(&Neighbours::none());

        assert_eq!(mesh.vertex_count(), 3);
        for vertex in mesh.vertices() {
            let distance = vertex.x + vertex.y + vertex.z;
            assert_relative_eq!(distance, 0.5);
        }
    }

    #[test]
    fn extents_grow_towards_positive_neighbours() {
        let volume = Volume::new(
            4,
            Point3::new(0, 0, 0),
            0.0,
            EdgeBehavior::TrueDensity,
            constant(1.0),
        )
        .unwrap();
        let params = volume.params();

        assert_eq!(params.cell_extents(&Neighbours::none()), Vector3::new(3, 3, 3));
        let behind = Neighbours::none().with(NeighbourDirection::Back);
        assert_eq!(params.cell_extents(&behind), Vector3::new(4, 3, 3));
        let right = Neighbours::none().with(NeighbourDirection::Right);
        assert_eq!(params.cell_extents(&right), Vector3::new(3, 3, 4));
        let front_left = Neighbours::none()
            .with(NeighbourDirection::Front)
            .with(NeighbourDirection::Left)
            .with(NeighbourDirection::BackRight);
        assert_eq!(params.cell_extents(&front_left), Vector3::new(3, 3, 3));
    }

    #[test]
    fn world_offset_scales_the_grid_position() {
        let volume = Volume::new(
            8,
            Point3::new(2, -1, 3),
            0.0,
            EdgeBehavior::TrueDensity,
            constant(1.0),
        )
        .unwrap();
        assert_eq!(volume.world_offset(), Vector3::new(16.0, -8.0, 24.0));
    }

    #[test]
    fn lattice_is_sampled_in_world_space() {
        let source: Arc<dyn DensitySource> = Arc::new(|p: Point3<f32>| p.x);
        let mut volume =
            Volume::new(3, Point3::new(1, 0, 0), 0.0, EdgeBehavior::TrueDensity, source).unwrap();
        volume.march(&Neighbours::none());
        assert_eq!(volume.lattice().density_at(0, 0, 0), Some(3.0));
        assert_eq!(volume.lattice().density_at(2, 1, 1), Some(5.0));
    }

    #[test]
    fn suppressed_edges_wall_in_solid_ground() {
        let mut open = Volume::new(
            4,
            Point3::new(0, 0, 0),
            0.0,
            EdgeBehavior::TrueDensity,
            constant(-1.0),
        )
        .unwrap();
        assert!(open.march(&Neighbours::none()).is_empty());

        open.set_edge_behavior(EdgeBehavior::from_flags(true, 1.0));
        let walled = open.march(&Neighbours::none());
        assert!(!walled.is_empty());
        for vertex in walled.vertices() {
            for coordinate in [vertex.x, vertex.y, vertex.z] {
                assert!((0.0..=3.0).contains(&coordinate));
            }
        }
    }

    #[test]
    fn remarching_replaces_the_buffers() {
        let source: Arc<dyn DensitySource> = Arc::new(|p: Point3<f32>| p.y - 1.5);
        let mut volume =
            Volume::new(4, Point3::new(0, 0, 0), 0.0, EdgeBehavior::TrueDensity, source).unwrap();

        let first = volume.march(&Neighbours::none()).clone();
        let second = volume.march(&Neighbours::none()).clone();
        assert!(!first.is_empty());
        assert_eq!(first, second);

        volume.set_density_threshold(10.0);
        assert!(volume.march(&Neighbours::none()).is_empty());
    }

    #[test]
    fn uvs_are_normalized_by_size() {
        let source: Arc<dyn DensitySource> = Arc::new(|p: Point3<f32>| p.y - 1.5);
        let mut volume =
            Volume::new(4, Point3::new(0, 0, 0), 0.0, EdgeBehavior::TrueDensity, source).unwrap();
        let mesh = volume.march(&Neighbours::none());
        assert_eq!(mesh.uvs().len(), mesh.vertices().len());
        for (vertex, uv) in mesh.vertices().iter().zip(mesh.uvs()) {
            assert_relative_eq!(uv.x, vertex.x / 4.0);
            assert_relative_eq!(uv.y, vertex.z / 4.0);
        }
    }
}
