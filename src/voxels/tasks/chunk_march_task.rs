//! # Chunk March Task
//!
//! Marches one chunk on a worker thread. The task carries a clone of the chunk's
//! [`VolumeParams`] and a frozen neighbour snapshot, so the world stays untouched
//! until the result is applied.

use cgmath::Point3;
use log::warn;

use crate::{
    meshing::MeshBuffers,
    task_management::task::{Task, TaskResult},
    voxels::{
        neighbours::Neighbours,
        volume::{DensityLattice, VolumeParams},
        world::World,
    },
};

/// A task that marches one chunk.
pub struct ChunkMarchTask {
    params: VolumeParams,
    neighbours: Neighbours,
}

impl ChunkMarchTask {
    /// Creates a march task.
    ///
    /// # Arguments
    /// * `params` - The chunk's march inputs
    /// * `neighbours` - Which neighbour slots were occupied when the task was created
    pub fn new(params: VolumeParams, neighbours: Neighbours) -> Self {
        ChunkMarchTask { params, neighbours }
    }
}

impl Task for ChunkMarchTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let mut lattice = DensityLattice::default();
        let mesh = self.params.march_into(&self.neighbours, &mut lattice);

        Box::new(ChunkMarchTaskResult {
            position: self.params.position,
            lattice,
            mesh,
        })
    }
}

/// The marched lattice and buffers of one chunk.
pub struct ChunkMarchTaskResult {
    position: Point3<i32>,
    lattice: DensityLattice,
    mesh: MeshBuffers,
}

impl TaskResult for ChunkMarchTaskResult {
    /// Installs the new buffers into the chunk, replacing the old ones.
    ///
    /// A chunk removed while its march was running is skipped.
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>> {
        match world.get_volume_at_mut(self.position) {
            Some(volume) => volume.install(self.lattice, self.mesh),
            None => warn!(
                "Chunk {:?} was removed before its march finished",
                self.position
            ),
        }
        Vec::new()
    }
}
