//! # Density Lattice
//!
//! The corner grid of a volume, sampled once per march.
//!
//! Each corner belongs to up to eight cells, so the field is evaluated once per
//! corner and the cells read from this cache. The lattice also owns the edge
//! suppression rule, because suppression rewrites corner densities before any cell
//! sees them.

use cgmath::{Point3, Vector3};

use crate::{
    density::DensitySource,
    voxels::neighbours::{NeighbourDirection, Neighbours},
};

/// Cached corner densities for one march.
///
/// Corners are stored in row-major order, x fastest, then y, then z. A lattice
/// with cell extents `(ex, ey, ez)` holds `(ex + 1) * (ey + 1) * (ez + 1)` corners.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityLattice {
    /// Corner count per axis
    dimensions: Vector3<usize>,
    densities: Vec<f32>,
}

impl Default for DensityLattice {
    fn default() -> Self {
        DensityLattice {
            dimensions: Vector3::new(0, 0, 0),
            densities: Vec::new(),
        }
    }
}

impl DensityLattice {
    /// Samples `source` at every corner covering `cell_extents`, reusing this
    /// lattice's allocation.
    ///
    /// # Arguments
    /// * `source` - The density field
    /// * `cell_extents` - Number of cells per axis
    /// * `world_offset` - Added to each local corner position before sampling
    pub fn resample(
        &mut self,
        source: &dyn DensitySource,
        cell_extents: Vector3<usize>,
        world_offset: Vector3<f32>,
    ) {
        self.dimensions = cell_extents + Vector3::new(1, 1, 1);
        self.densities.clear();
        self.densities
            .reserve(self.dimensions.x * self.dimensions.y * self.dimensions.z);

        for z in 0..self.dimensions.z {
            for y in 0..self.dimensions.y {
                for x in 0..self.dimensions.x {
                    let world_position = local_position(x, y, z) + world_offset;
                    self.densities.push(source.density(world_position));
                }
            }
        }
    }

    /// Replaces the densities on every open face of the lattice with `sharpness`.
    ///
    /// A corner column is open when any of the four cell columns around it is not
    /// marched by some chunk. That only depends on which chunks exist, so every
    /// chunk sampling the same world corner makes the same call, including the
    /// bridged columns of L-shaped layouts. The top and bottom faces are always
    /// open.
    ///
    /// # Arguments
    /// * `neighbours` - Occupied slots around the chunk
    /// * `chunk_size` - Lattice points per axis, also the chunk spacing
    /// * `sharpness` - The density written to open corners
    pub fn suppress_open_faces(
        &mut self,
        neighbours: &Neighbours,
        chunk_size: usize,
        sharpness: f32,
    ) {
        if self.densities.is_empty() || chunk_size == 0 {
            return;
        }
        let last_y = self.dimensions.y - 1;

        for z in 0..self.dimensions.z {
            for x in 0..self.dimensions.x {
                let (cx, cz) = (x as isize, z as isize);
                let column_open = [(cx - 1, cz - 1), (cx, cz - 1), (cx - 1, cz), (cx, cz)]
                    .into_iter()
                    .any(|(i, j)| !is_column_marched(neighbours, chunk_size as isize, i, j));

                for y in 0..self.dimensions.y {
                    if column_open || y == 0 || y == last_y {
                        let index = self.index(x, y, z);
                        self.densities[index] = sharpness;
                    }
                }
            }
        }
    }

    /// Corner count per axis.
    pub fn dimensions(&self) -> Vector3<usize> {
        self.dimensions
    }

    /// Cell count per axis.
    pub fn cell_extents(&self) -> Vector3<usize> {
        if self.densities.is_empty() {
            return Vector3::new(0, 0, 0);
        }
        self.dimensions - Vector3::new(1, 1, 1)
    }

    /// Whether nothing has been sampled yet.
    pub fn is_empty(&self) -> bool {
        self.densities.is_empty()
    }

    /// The density at a corner, or `None` outside the lattice.
    pub fn density_at(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        if x >= self.dimensions.x || y >= self.dimensions.y || z >= self.dimensions.z {
            return None;
        }
        self.densities.get(self.index(x, y, z)).copied()
    }

    /// The density at a corner known to be inside the lattice.
    pub(crate) fn corner(&self, x: usize, y: usize, z: usize) -> f32 {
        self.densities[self.index(x, y, z)]
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dimensions.x * (y + self.dimensions.y * z)
    }
}

/// Whether the cell column at `(i, j)`, in cells relative to this chunk's origin,
/// is marched by any chunk.
///
/// The column belongs to the chunk it falls in. The last column of a chunk along
/// an axis is the bridge to the next chunk and is only marched when that chunk
/// exists. Everything asked about here lies within one chunk of the origin.
fn is_column_marched(neighbours: &Neighbours, chunk_size: isize, i: isize, j: isize) -> bool {
    let exists = |dx: isize, dz: isize| {
        match NeighbourDirection::from_offset(dx as i32, dz as i32) {
            Some(direction) => neighbours.has(direction),
            None => dx == 0 && dz == 0,
        }
    };
    let (owner_x, owner_z) = (i.div_euclid(chunk_size), j.div_euclid(chunk_size));
    let bridges_x = i.rem_euclid(chunk_size) == chunk_size - 1;
    let bridges_z = j.rem_euclid(chunk_size) == chunk_size - 1;

    exists(owner_x, owner_z)
        && (!bridges_x || exists(owner_x + 1, owner_z))
        && (!bridges_z || exists(owner_x, owner_z + 1))
}

/// Chunk-local position of a lattice corner.
pub fn local_position(x: usize, y: usize, z: usize) -> Point3<f32> {
    Point3::new(x as f32, y as f32, z as f32)
}
